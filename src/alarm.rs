//! Alarm value types and register utilities for the MCP7940 RTC.
//!
//! The MCP7940 has two identical alarm comparators, each backed by a block
//! of six registers (seconds, minutes, hours, weekday, date, month). There is
//! no year register, so an [`AlarmTimestamp`] has no year or day-of-year field.
//!
//! The weekday register of each block also carries the match mask, the
//! interrupt flag and, for Alarm 1, the output polarity. Those bits are
//! described by [`AlarmConfig`] and written together with the time fields.

use crate::calendar::max_days_in_month;
use crate::datetime::{
    convert_date, convert_hours, convert_minutes, convert_month, convert_seconds, decode_date,
    decode_hours, decode_minutes, decode_month, decode_seconds, validate_time_of_day,
    validate_weekday, Timestamp, ValidationError,
};
use crate::{
    AlarmMask, AlarmPolarity, AlarmWeekday, Date, Hours, Minutes, Month, RegAddr, Seconds,
    TimeRepresentation,
};

/// One of the two independent alarm comparators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmSlot {
    /// First alarm (ALM0 on the datasheet), registers 0x0A-0x0F
    Alarm1,
    /// Second alarm (ALM1 on the datasheet), registers 0x11-0x16
    Alarm2,
}

impl AlarmSlot {
    /// First register of this slot's block.
    pub const fn base(self) -> RegAddr {
        match self {
            AlarmSlot::Alarm1 => RegAddr::Alarm1Seconds,
            AlarmSlot::Alarm2 => RegAddr::Alarm2Seconds,
        }
    }

    /// Hours register of this slot.
    pub const fn hours_register(self) -> RegAddr {
        match self {
            AlarmSlot::Alarm1 => RegAddr::Alarm1Hours,
            AlarmSlot::Alarm2 => RegAddr::Alarm2Hours,
        }
    }

    /// Weekday/mask register of this slot.
    pub const fn weekday_register(self) -> RegAddr {
        match self {
            AlarmSlot::Alarm1 => RegAddr::Alarm1Weekday,
            AlarmSlot::Alarm2 => RegAddr::Alarm2Weekday,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            AlarmSlot::Alarm1 => 0,
            AlarmSlot::Alarm2 => 1,
        }
    }
}

/// Match configuration stored alongside an alarm's weekday field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmConfig {
    /// Fields compared against the clock
    pub mask: AlarmMask,
    /// MFP level on a match. Only the Alarm 1 register holds this bit; it is
    /// ignored for Alarm 2.
    pub polarity: AlarmPolarity,
}

impl AlarmConfig {
    /// Rejects the two mask encodings the chip reserves.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.mask {
            AlarmMask::Reserved101 | AlarmMask::Reserved110 => {
                Err(ValidationError::ReservedAlarmMask(self.mask.into()))
            }
            _ => Ok(()),
        }
    }
}

/// Time fields of an alarm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmTimestamp {
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
    /// Day of week (1-7)
    pub weekday: u8,
}

impl AlarmTimestamp {
    /// Creates an alarm timestamp.
    pub const fn new(month: u8, day: u8, hour: u8, minute: u8, second: u8, weekday: u8) -> Self {
        Self {
            month,
            day,
            hour,
            minute,
            second,
            weekday,
        }
    }

    /// Checks every field against the range the alarm registers can store.
    ///
    /// Without a year, February accepts the 29th.
    ///
    /// # Errors
    /// Returns the first field found out of range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let last_day =
            max_days_in_month(self.month).ok_or(ValidationError::InvalidMonth(self.month))?;
        if self.day == 0 || self.day > last_day {
            return Err(ValidationError::InvalidDay(self.day));
        }
        validate_time_of_day(self.hour, self.minute, self.second)?;
        validate_weekday(self.weekday)
    }
}

impl From<&Timestamp> for AlarmTimestamp {
    /// Drops the year and day-of-year.
    fn from(ts: &Timestamp) -> Self {
        AlarmTimestamp {
            month: ts.month,
            day: ts.day,
            hour: ts.hour,
            minute: ts.minute,
            second: ts.second,
            weekday: ts.weekday,
        }
    }
}

impl From<Timestamp> for AlarmTimestamp {
    fn from(ts: Timestamp) -> Self {
        AlarmTimestamp::from(&ts)
    }
}

/// Internal representation of one MCP7940 alarm register block.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct Mcp7940Alarm {
    seconds: Seconds,
    minutes: Minutes,
    hours: Hours,
    weekday: AlarmWeekday,
    date: Date,
    month: Month,
}

impl Mcp7940Alarm {
    /// Encodes a validated alarm for `slot`.
    ///
    /// The mask and polarity come from `config`; the interrupt flag is written
    /// as 0, which clears a pending match.
    pub(crate) fn from_alarm(
        alarm: &AlarmTimestamp,
        slot: AlarmSlot,
        config: AlarmConfig,
        time_representation: TimeRepresentation,
    ) -> Result<Self, ValidationError> {
        alarm.validate()?;

        let mut weekday = AlarmWeekday::default();
        weekday.set_weekday(alarm.weekday);
        apply_config(&mut weekday, slot, config);

        let raw = Mcp7940Alarm {
            seconds: convert_seconds(alarm.second)?,
            minutes: convert_minutes(alarm.minute)?,
            hours: convert_hours(alarm.hour, time_representation)?,
            weekday,
            date: convert_date(alarm.day)?,
            month: convert_month(alarm.month)?,
        };

        debug!("alarm raw={:?}", raw);

        Ok(raw)
    }

    /// Decodes the time fields, ignoring mask, polarity and flag bits.
    pub(crate) fn into_alarm(self) -> AlarmTimestamp {
        AlarmTimestamp {
            month: decode_month(self.month),
            day: decode_date(self.date),
            hour: decode_hours(self.hours),
            minute: decode_minutes(self.minutes),
            second: decode_seconds(self.seconds),
            weekday: self.weekday.weekday(),
        }
    }
}

impl From<AlarmWeekday> for AlarmConfig {
    fn from(weekday: AlarmWeekday) -> Self {
        AlarmConfig {
            mask: weekday.mask(),
            polarity: weekday.polarity(),
        }
    }
}

/// Writes the mask and, for Alarm 1, the polarity into a weekday register.
pub(crate) fn apply_config(weekday: &mut AlarmWeekday, slot: AlarmSlot, config: AlarmConfig) {
    weekday.set_mask(config.mask);
    match slot {
        AlarmSlot::Alarm1 => weekday.set_polarity(config.polarity),
        AlarmSlot::Alarm2 => weekday.set_polarity(AlarmPolarity::ActiveLow),
    }
}

impl From<[u8; 6]> for Mcp7940Alarm {
    fn from(data: [u8; 6]) -> Self {
        Mcp7940Alarm {
            seconds: Seconds(data[0]),
            minutes: Minutes(data[1]),
            hours: Hours(data[2]),
            weekday: AlarmWeekday(data[3]),
            date: Date(data[4]),
            month: Month(data[5]),
        }
    }
}

impl From<&Mcp7940Alarm> for [u8; 6] {
    fn from(alarm: &Mcp7940Alarm) -> [u8; 6] {
        [
            alarm.seconds.0,
            alarm.minutes.0,
            alarm.hours.0,
            alarm.weekday.0,
            alarm.date.0,
            alarm.month.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AlarmTimestamp {
        AlarmTimestamp::new(7, 16, 15, 29, 14, 6)
    }

    #[test]
    fn test_slot_register_blocks() {
        assert_eq!(AlarmSlot::Alarm1.base() as u8, 0x0A);
        assert_eq!(AlarmSlot::Alarm2.base() as u8, 0x11);
        assert_eq!(AlarmSlot::Alarm1.weekday_register() as u8, 0x0D);
        assert_eq!(AlarmSlot::Alarm2.weekday_register() as u8, 0x14);
        assert_eq!(AlarmSlot::Alarm1.hours_register() as u8, 0x0C);
        assert_eq!(AlarmSlot::Alarm2.hours_register() as u8, 0x13);
    }

    #[test]
    fn test_config_rejects_reserved_masks() {
        assert_eq!(AlarmConfig::default().validate(), Ok(()));
        for mask in [AlarmMask::Reserved101, AlarmMask::Reserved110] {
            let config = AlarmConfig {
                mask,
                polarity: AlarmPolarity::ActiveLow,
            };
            assert_eq!(
                config.validate(),
                Err(ValidationError::ReservedAlarmMask(mask.into()))
            );
        }
    }

    #[test]
    fn test_from_timestamp_drops_year_and_yearday() {
        let ts = Timestamp {
            yearday: 167,
            ..Timestamp::new(2019, 7, 16, 15, 29, 14, 6)
        };
        assert_eq!(AlarmTimestamp::from(&ts), sample());
        assert_eq!(AlarmTimestamp::from(ts), sample());
    }

    #[test]
    fn test_encode_default_config() {
        let raw = Mcp7940Alarm::from_alarm(
            &sample(),
            AlarmSlot::Alarm1,
            AlarmConfig::default(),
            TimeRepresentation::TwentyFourHour,
        )
        .unwrap();
        let arr: [u8; 6] = (&raw).into();
        assert_eq!(arr, [0x14, 0x29, 0x15, 0x76, 0x16, 0x07]);
        assert_eq!(raw.into_alarm(), sample());
    }

    #[test]
    fn test_encode_polarity_only_on_alarm1() {
        let config = AlarmConfig {
            mask: AlarmMask::Minutes,
            polarity: AlarmPolarity::ActiveHigh,
        };
        let raw = Mcp7940Alarm::from_alarm(
            &sample(),
            AlarmSlot::Alarm1,
            config,
            TimeRepresentation::TwentyFourHour,
        )
        .unwrap();
        let arr: [u8; 6] = (&raw).into();
        assert_eq!(arr[3], 0x96);
        assert_eq!(AlarmConfig::from(raw.weekday), config);

        let raw = Mcp7940Alarm::from_alarm(
            &sample(),
            AlarmSlot::Alarm2,
            config,
            TimeRepresentation::TwentyFourHour,
        )
        .unwrap();
        let arr: [u8; 6] = (&raw).into();
        assert_eq!(arr[3], 0x16);
    }

    #[test]
    fn test_decode_ignores_control_bits() {
        // polarity, all-match mask and interrupt flag set around Friday
        let raw = Mcp7940Alarm::from([0x14, 0x29, 0x15, 0xFE, 0x16, 0x07]);
        assert_eq!(raw.into_alarm(), sample());
        assert_eq!(
            AlarmConfig::from(raw.weekday),
            AlarmConfig {
                mask: AlarmMask::All,
                polarity: AlarmPolarity::ActiveHigh,
            }
        );
    }

    #[test]
    fn test_twelve_hour_alarm() {
        let alarm = AlarmTimestamp::new(1, 1, 18, 30, 0, 1);
        let raw = Mcp7940Alarm::from_alarm(
            &alarm,
            AlarmSlot::Alarm2,
            AlarmConfig::default(),
            TimeRepresentation::TwelveHour,
        )
        .unwrap();
        let arr: [u8; 6] = (&raw).into();
        // 12h flag, PM, 6
        assert_eq!(arr[2], 0x66);
        assert_eq!(raw.into_alarm(), alarm);
    }

    #[test]
    fn test_validation() {
        assert_eq!(sample().validate(), Ok(()));
        // no year, so February 29th is always accepted
        assert_eq!(AlarmTimestamp::new(2, 29, 0, 0, 0, 1).validate(), Ok(()));

        let cases = [
            (
                AlarmTimestamp::new(2, 30, 0, 0, 0, 1),
                ValidationError::InvalidDay(30),
            ),
            (
                AlarmTimestamp::new(6, 31, 0, 0, 0, 1),
                ValidationError::InvalidDay(31),
            ),
            (
                AlarmTimestamp::new(13, 1, 0, 0, 0, 1),
                ValidationError::InvalidMonth(13),
            ),
            (
                AlarmTimestamp::new(1, 1, 24, 0, 0, 1),
                ValidationError::InvalidHour(24),
            ),
            (
                AlarmTimestamp::new(1, 1, 0, 60, 0, 1),
                ValidationError::InvalidMinute(60),
            ),
            (
                AlarmTimestamp::new(1, 1, 0, 0, 60, 1),
                ValidationError::InvalidSecond(60),
            ),
            (
                AlarmTimestamp::new(1, 1, 0, 0, 0, 0),
                ValidationError::InvalidWeekday(0),
            ),
        ];
        for (alarm, expected) in cases {
            assert_eq!(alarm.validate(), Err(expected));
            assert_eq!(
                Mcp7940Alarm::from_alarm(
                    &alarm,
                    AlarmSlot::Alarm1,
                    AlarmConfig::default(),
                    TimeRepresentation::TwentyFourHour
                ),
                Err(expected)
            );
        }
    }
}
