//! Timestamp conversion and register utilities for the MCP7940 RTC.
//!
//! This module provides the [`Timestamp`] value type and the internal
//! representation of the seven timekeeping registers, with validated
//! conversion between the two.
//!
//! # Register Model
//!
//! The MCP7940 stores date and time in 7 consecutive registers:
//! - Seconds, Minutes, Hours, Weekday, Date, Month, Year
//!
//! Control and status bits share bytes with the time fields. They are
//! stripped before decoding and re-emitted from driver settings when
//! encoding.
//!
//! # Error Handling
//!
//! Validation failures are reported via [`ValidationError`].

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::bcd::{bcd_to_int, make_bcd};
use crate::calendar::days_in_month;
use crate::{Date, Hours, Minutes, Month, Seconds, TimeRepresentation, Weekday, Year};

/// Errors raised when a value cannot be represented by the chip.
///
/// Values are never clamped; setters return one of these before any bus
/// traffic takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationError {
    /// The value does not fit two BCD digits (0-99)
    NotBcd(u8),
    /// Year outside 2000-2099
    YearOutOfRange(i32),
    /// Month outside 1-12
    InvalidMonth(u8),
    /// Day is zero or past the end of the month
    InvalidDay(u8),
    /// Hour outside 0-23
    InvalidHour(u8),
    /// Minute outside 0-59
    InvalidMinute(u8),
    /// Second outside 0-59
    InvalidSecond(u8),
    /// Weekday outside 1-7
    InvalidWeekday(u8),
    /// Alarm mask encoding the chip reserves
    ReservedAlarmMask(u8),
}

/// A calendar date and time of day as kept by the clock.
///
/// `yearday` is accepted for convenience but the chip has no register for it:
/// it is ignored by [`Mcp7940::set_time`](crate::Mcp7940::set_time) and always
/// reads back as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp {
    /// Year (2000-2099)
    pub year: u16,
    /// Month (1-12)
    pub month: u8,
    /// Day of month (1-31)
    pub day: u8,
    /// Hour (0-23)
    pub hour: u8,
    /// Minute (0-59)
    pub minute: u8,
    /// Second (0-59)
    pub second: u8,
    /// Day of week (1-7), numbering is up to the application
    pub weekday: u8,
    /// Day of year, never stored by the chip
    pub yearday: u16,
}

impl Timestamp {
    /// Creates a timestamp with `yearday` set to 0.
    pub const fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        weekday: u8,
    ) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            weekday,
            yearday: 0,
        }
    }

    /// Checks every field against the range the chip can store, including
    /// the length of the month for the given year.
    ///
    /// # Errors
    /// Returns the first field found out of range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(2000..=2099).contains(&self.year) {
            return Err(ValidationError::YearOutOfRange(i32::from(self.year)));
        }
        let last_day =
            days_in_month(self.year, self.month).ok_or(ValidationError::InvalidMonth(self.month))?;
        if self.day == 0 || self.day > last_day {
            return Err(ValidationError::InvalidDay(self.day));
        }
        validate_time_of_day(self.hour, self.minute, self.second)?;
        validate_weekday(self.weekday)
    }

    /// Converts to a chrono `NaiveDateTime`, dropping weekday and yearday.
    ///
    /// Returns `None` if the fields do not form a valid date and time.
    pub fn to_naive_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?
        .and_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )
    }
}

impl TryFrom<&NaiveDateTime> for Timestamp {
    type Error = ValidationError;

    /// Builds a timestamp numbering weekdays 1 (Sunday) to 7 (Saturday) and
    /// filling `yearday` from the ordinal day.
    fn try_from(datetime: &NaiveDateTime) -> Result<Self, Self::Error> {
        let year = u16::try_from(datetime.year())
            .ok()
            .filter(|year| (2000..=2099).contains(year))
            .ok_or(ValidationError::YearOutOfRange(datetime.year()))?;
        // chrono guarantees the remaining fields fit in a u8
        let narrow = |v: u32| u8::try_from(v).unwrap_or(u8::MAX);
        Ok(Timestamp {
            year,
            month: narrow(datetime.month()),
            day: narrow(datetime.day()),
            hour: narrow(datetime.hour()),
            minute: narrow(datetime.minute()),
            second: narrow(datetime.second()),
            weekday: narrow(datetime.weekday().number_from_sunday()),
            yearday: u16::try_from(datetime.ordinal()).unwrap_or(0),
        })
    }
}

pub(crate) fn validate_time_of_day(
    hour: u8,
    minute: u8,
    second: u8,
) -> Result<(), ValidationError> {
    if hour > 23 {
        return Err(ValidationError::InvalidHour(hour));
    }
    if minute > 59 {
        return Err(ValidationError::InvalidMinute(minute));
    }
    if second > 59 {
        return Err(ValidationError::InvalidSecond(second));
    }
    Ok(())
}

pub(crate) fn validate_weekday(weekday: u8) -> Result<(), ValidationError> {
    if !(1..=7).contains(&weekday) {
        return Err(ValidationError::InvalidWeekday(weekday));
    }
    Ok(())
}

pub(crate) fn convert_seconds(second: u8) -> Result<Seconds, ValidationError> {
    let (ones, tens) = make_bcd(second, 59, ValidationError::InvalidSecond(second))?;
    let mut value = Seconds::default();
    value.set_seconds(ones);
    value.set_ten_seconds(tens);
    Ok(value)
}

pub(crate) fn convert_minutes(minute: u8) -> Result<Minutes, ValidationError> {
    let (ones, tens) = make_bcd(minute, 59, ValidationError::InvalidMinute(minute))?;
    let mut value = Minutes::default();
    value.set_minutes(ones);
    value.set_ten_minutes(tens);
    Ok(value)
}

pub(crate) fn convert_hours(
    hour: u8,
    time_representation: TimeRepresentation,
) -> Result<Hours, ValidationError> {
    if hour > 23 {
        return Err(ValidationError::InvalidHour(hour));
    }
    let mut value = Hours::default();
    value.set_time_representation(time_representation);

    match time_representation {
        TimeRepresentation::TwentyFourHour => {
            let (ones, tens) = make_bcd(hour, 23, ValidationError::InvalidHour(hour))?;
            value.set_hours(ones);
            value.set_ten_hours(tens);
        }
        TimeRepresentation::TwelveHour => {
            let (hour12, is_pm) = match hour {
                0 => (12, false),
                1..=11 => (hour, false),
                12 => (12, true),
                _ => (hour - 12, true),
            };
            let (ones, tens) = make_bcd(hour12, 12, ValidationError::InvalidHour(hour))?;
            value.set_hours(ones);
            value.set_ten_hours_12h(tens);
            value.set_pm(is_pm);
        }
    }
    Ok(value)
}

pub(crate) fn convert_date(day: u8) -> Result<Date, ValidationError> {
    let (ones, tens) = make_bcd(day, 31, ValidationError::InvalidDay(day))?;
    let mut value = Date::default();
    value.set_date(ones);
    value.set_ten_date(tens);
    Ok(value)
}

pub(crate) fn convert_month(month: u8) -> Result<Month, ValidationError> {
    let (ones, tens) = make_bcd(month, 12, ValidationError::InvalidMonth(month))?;
    let mut value = Month::default();
    value.set_month(ones);
    value.set_ten_month(tens);
    Ok(value)
}

fn convert_year(year: u16) -> Result<Year, ValidationError> {
    let offset = year
        .checked_sub(2000)
        .and_then(|offset| u8::try_from(offset).ok())
        .filter(|offset| *offset <= 99)
        .ok_or(ValidationError::YearOutOfRange(i32::from(year)))?;
    let (ones, tens) = make_bcd(offset, 99, ValidationError::YearOutOfRange(i32::from(year)))?;
    let mut value = Year::default();
    value.set_year(ones);
    value.set_ten_year(tens);
    Ok(value)
}

/// Decodes an hours register of either format into 0-23.
pub(crate) fn decode_hours(hours: Hours) -> u8 {
    match hours.time_representation() {
        TimeRepresentation::TwentyFourHour => bcd_to_int(u8::from(hours) & 0x3F),
        TimeRepresentation::TwelveHour => {
            let hour12 = bcd_to_int(u8::from(hours) & 0x1F);
            match (hour12, hours.pm()) {
                (12, false) => 0,
                (12, true) => 12,
                (h, false) => h,
                (h, true) => h + 12,
            }
        }
    }
}

/// Re-encodes an hours register in another format, keeping the hour.
pub(crate) fn reencode_hours(
    hours: Hours,
    time_representation: TimeRepresentation,
) -> Result<Hours, ValidationError> {
    convert_hours(decode_hours(hours), time_representation)
}

pub(crate) fn decode_seconds(seconds: Seconds) -> u8 {
    bcd_to_int(u8::from(seconds) & 0x7F)
}

pub(crate) fn decode_minutes(minutes: Minutes) -> u8 {
    bcd_to_int(u8::from(minutes) & 0x7F)
}

pub(crate) fn decode_date(date: Date) -> u8 {
    bcd_to_int(u8::from(date) & 0x3F)
}

pub(crate) fn decode_month(month: Month) -> u8 {
    bcd_to_int(u8::from(month) & 0x1F)
}

/// Internal representation of the MCP7940 timekeeping registers.
///
/// This struct models the 7 date/time registers using strongly-typed bitfield
/// wrappers for each field. It is used for register-level I/O and conversion
/// to/from [`Timestamp`].
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct Mcp7940DateTime {
    seconds: Seconds,
    minutes: Minutes,
    hours: Hours,
    weekday: Weekday,
    date: Date,
    month: Month,
    year: Year,
}

impl Mcp7940DateTime {
    /// Encodes a validated timestamp.
    ///
    /// The oscillator start bit is always set so the clock keeps running after
    /// the write, and the battery backup bit is emitted as configured.
    pub(crate) fn from_timestamp(
        timestamp: &Timestamp,
        time_representation: TimeRepresentation,
        battery_backup: bool,
    ) -> Result<Self, ValidationError> {
        timestamp.validate()?;

        let mut seconds = convert_seconds(timestamp.second)?;
        seconds.set_start_oscillator(true);
        let minutes = convert_minutes(timestamp.minute)?;
        let hours = convert_hours(timestamp.hour, time_representation)?;
        let mut weekday = Weekday::default();
        weekday.set_weekday(timestamp.weekday);
        weekday.set_battery_backup(battery_backup);
        let date = convert_date(timestamp.day)?;
        let month = convert_month(timestamp.month)?;
        let year = convert_year(timestamp.year)?;

        let raw = Mcp7940DateTime {
            seconds,
            minutes,
            hours,
            weekday,
            date,
            month,
            year,
        };

        debug!("raw={:?}", raw);

        Ok(raw)
    }

    /// Decodes the registers, stripping control and status bits.
    ///
    /// No calendar validation is applied: the registers are reported as they
    /// are. `yearday` is always 0.
    pub(crate) fn into_timestamp(self) -> Timestamp {
        let hour = decode_hours(self.hours);
        debug!("raw_hour={:?} h={}", self.hours, hour);

        Timestamp {
            year: 2000 + u16::from(bcd_to_int(self.year.into())),
            month: decode_month(self.month),
            day: decode_date(self.date),
            hour,
            minute: decode_minutes(self.minutes),
            second: decode_seconds(self.seconds),
            weekday: self.weekday.weekday(),
            yearday: 0,
        }
    }
}

impl From<[u8; 7]> for Mcp7940DateTime {
    fn from(data: [u8; 7]) -> Self {
        Mcp7940DateTime {
            seconds: Seconds(data[0]),
            minutes: Minutes(data[1]),
            hours: Hours(data[2]),
            weekday: Weekday(data[3]),
            date: Date(data[4]),
            month: Month(data[5]),
            year: Year(data[6]),
        }
    }
}

impl From<&Mcp7940DateTime> for [u8; 7] {
    fn from(dt: &Mcp7940DateTime) -> [u8; 7] {
        [
            dt.seconds.0,
            dt.minutes.0,
            dt.hours.0,
            dt.weekday.0,
            dt.date.0,
            dt.month.0,
            dt.year.0,
        ]
    }
}
