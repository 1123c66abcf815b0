//! Register definitions and bitfield structures for the MCP7940 RTC.
//!
//! This module contains the register map, block sizes and bitfield
//! definitions for the timekeeping, control and alarm registers. Every time
//! register packs its value as BCD in the low bits and shares the byte with
//! control or status bits, which the bitfields name explicitly.

use bitfield::bitfield;

/// Fixed I2C address of the MCP7940 (0b110_1111).
pub const DEFAULT_ADDRESS: u8 = 0x6F;

/// Number of registers in the clock block (seconds through year).
pub const CLOCK_REGISTERS: usize = 7;

/// Number of registers in each alarm block (seconds through month).
pub const ALARM_REGISTERS: usize = 6;

/// Size of the battery-backed general purpose SRAM.
pub const SRAM_SIZE: usize = 64;

/// Register addresses for the MCP7940 RTC.
#[allow(unused)]
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Seconds register with oscillator start bit
    Seconds = 0x00,
    /// Minutes register (0-59)
    Minutes = 0x01,
    /// Hours register (1-12 + AM/PM or 0-23)
    Hours = 0x02,
    /// Weekday register with oscillator/power/battery status bits
    Weekday = 0x03,
    /// Date register (1-31)
    Date = 0x04,
    /// Month register with leap year flag
    Month = 0x05,
    /// Year register (0-99)
    Year = 0x06,
    /// Control register
    Control = 0x07,
    /// Digital oscillator trim register
    OscTrim = 0x08,
    /// Alarm 1 seconds register (ALM0 on the datasheet)
    Alarm1Seconds = 0x0A,
    /// Alarm 1 minutes register
    Alarm1Minutes = 0x0B,
    /// Alarm 1 hours register
    Alarm1Hours = 0x0C,
    /// Alarm 1 weekday, mask and polarity register
    Alarm1Weekday = 0x0D,
    /// Alarm 1 date register
    Alarm1Date = 0x0E,
    /// Alarm 1 month register
    Alarm1Month = 0x0F,
    /// Alarm 2 seconds register (ALM1 on the datasheet)
    Alarm2Seconds = 0x11,
    /// Alarm 2 minutes register
    Alarm2Minutes = 0x12,
    /// Alarm 2 hours register
    Alarm2Hours = 0x13,
    /// Alarm 2 weekday and mask register
    Alarm2Weekday = 0x14,
    /// Alarm 2 date register
    Alarm2Date = 0x15,
    /// Alarm 2 month register
    Alarm2Month = 0x16,
    /// First byte of the general purpose SRAM
    Sram = 0x20,
}

/// Time representation format for the hours registers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeRepresentation {
    /// 24-hour format (0-23)
    #[default]
    TwentyFourHour = 0,
    /// 12-hour format (1-12 + AM/PM)
    TwelveHour = 1,
}
impl From<u8> for TimeRepresentation {
    /// Creates a `TimeRepresentation` from the 12/24 bit.
    fn from(v: u8) -> Self {
        if v & 0x01 == 0 {
            TimeRepresentation::TwentyFourHour
        } else {
            TimeRepresentation::TwelveHour
        }
    }
}
impl From<TimeRepresentation> for u8 {
    /// Converts a `TimeRepresentation` to its raw register value.
    fn from(v: TimeRepresentation) -> Self {
        v as u8
    }
}

/// Square wave output frequency options (SQWFS bits).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SquareWaveFrequency {
    /// 1 Hz square wave output
    Hz1 = 0b00,
    /// 4.096 kHz square wave output
    Hz4096 = 0b01,
    /// 8.192 kHz square wave output
    Hz8192 = 0b10,
    /// 32.768 kHz square wave output
    Hz32768 = 0b11,
}
impl From<u8> for SquareWaveFrequency {
    fn from(v: u8) -> Self {
        match v & 0b11 {
            0b00 => SquareWaveFrequency::Hz1,
            0b01 => SquareWaveFrequency::Hz4096,
            0b10 => SquareWaveFrequency::Hz8192,
            _ => SquareWaveFrequency::Hz32768,
        }
    }
}
impl From<SquareWaveFrequency> for u8 {
    fn from(v: SquareWaveFrequency) -> Self {
        v as u8
    }
}

/// Which fields an alarm compares against the running clock (ALMxMSK bits).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmMask {
    /// Seconds match
    Seconds = 0b000,
    /// Minutes match
    Minutes = 0b001,
    /// Hours match (respecting the 12/24-hour setting)
    Hours = 0b010,
    /// Day of week match
    Weekday = 0b011,
    /// Date match
    Date = 0b100,
    /// Reserved encoding, rejected by `set_alarm_config` and `configure`
    Reserved101 = 0b101,
    /// Reserved encoding, rejected by `set_alarm_config` and `configure`
    Reserved110 = 0b110,
    /// Seconds, minutes, hour, day of week, date and month all match
    #[default]
    All = 0b111,
}
impl From<u8> for AlarmMask {
    fn from(v: u8) -> Self {
        match v & 0b111 {
            0b000 => AlarmMask::Seconds,
            0b001 => AlarmMask::Minutes,
            0b010 => AlarmMask::Hours,
            0b011 => AlarmMask::Weekday,
            0b100 => AlarmMask::Date,
            0b101 => AlarmMask::Reserved101,
            0b110 => AlarmMask::Reserved110,
            _ => AlarmMask::All,
        }
    }
}
impl From<AlarmMask> for u8 {
    fn from(v: AlarmMask) -> Self {
        v as u8
    }
}

/// Logic level the MFP pin drives when an alarm matches (ALMPOL bit).
///
/// Only Alarm 1 has a polarity bit; Alarm 2 shares it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmPolarity {
    /// MFP is driven low on a match
    #[default]
    ActiveLow = 0,
    /// MFP is driven high on a match
    ActiveHigh = 1,
}
impl From<u8> for AlarmPolarity {
    fn from(v: u8) -> Self {
        if v & 0x01 == 0 {
            AlarmPolarity::ActiveLow
        } else {
            AlarmPolarity::ActiveHigh
        }
    }
}
impl From<AlarmPolarity> for u8 {
    fn from(v: AlarmPolarity) -> Self {
        v as u8
    }
}

// This macro generates the From<u8> and Into<u8> implementations for the
// register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Seconds register (0-59) with the oscillator start bit.
    ///
    /// The alarm seconds registers share this layout with bit 7 unimplemented.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Seconds(u8);
    impl Debug;
    /// Start oscillator (ST)
    pub start_oscillator, set_start_oscillator: 7;
    /// Tens place of seconds (0-5)
    pub ten_seconds, set_ten_seconds: 6, 4;
    /// Ones place of seconds (0-9)
    pub seconds, set_seconds: 3, 0;
}
from_register_u8!(Seconds);

bitfield! {
    /// Minutes register (0-59) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Minutes(u8);
    impl Debug;
    /// Tens place of minutes (0-5)
    pub ten_minutes, set_ten_minutes: 6, 4;
    /// Ones place of minutes (0-9)
    pub minutes, set_minutes: 3, 0;
}
from_register_u8!(Minutes);

bitfield! {
    /// Hours register with format selection and BCD encoding.
    ///
    /// In 24-hour mode bits 5..4 hold the tens digit. In 12-hour mode bit 5
    /// is the PM flag and only bit 4 holds the tens digit. The alarm hours
    /// registers share this layout.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Hours(u8);
    impl Debug;
    /// Time representation format (12/24 hour)
    pub from into TimeRepresentation, time_representation, set_time_representation: 6, 6;
    /// PM flag (12-hour mode only)
    pub pm, set_pm: 5;
    /// Tens place of hours in 24-hour mode (0-2)
    pub ten_hours, set_ten_hours: 5, 4;
    /// Tens place of hours in 12-hour mode (0-1)
    pub ten_hours_12h, set_ten_hours_12h: 4, 4;
    /// Ones place of hours
    pub hours, set_hours: 3, 0;
}
from_register_u8!(Hours);

#[cfg(feature = "defmt")]
impl defmt::Format for Hours {
    fn format(&self, f: defmt::Formatter) {
        match self.time_representation() {
            TimeRepresentation::TwentyFourHour => {
                let hours = 10 * self.ten_hours() + self.hours();
                defmt::write!(f, "Hours({}h 24h)", hours);
            }
            TimeRepresentation::TwelveHour => {
                let hours = 10 * self.ten_hours_12h() + self.hours();
                defmt::write!(f, "Hours({}h {})", hours, if self.pm() { "PM" } else { "AM" });
            }
        }
    }
}

bitfield! {
    /// Weekday register (1-7) sharing its byte with power and oscillator status.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Weekday(u8);
    impl Debug;
    /// Oscillator is running (OSCRUN, read only)
    pub oscillator_running, _: 5;
    /// Primary power was lost (PWRFAIL, write 0 to clear)
    pub power_fail, set_power_fail: 4;
    /// Battery backup supply enabled (VBATEN)
    pub battery_backup, set_battery_backup: 3;
    /// Day of week (1-7)
    pub weekday, set_weekday: 2, 0;
}
from_register_u8!(Weekday);

bitfield! {
    /// Date register (1-31) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Date(u8);
    impl Debug;
    /// Tens place of date (0-3)
    pub ten_date, set_ten_date: 5, 4;
    /// Ones place of date (0-9)
    pub date, set_date: 3, 0;
}
from_register_u8!(Date);

bitfield! {
    /// Month register (1-12) with the leap year flag.
    ///
    /// The alarm month registers share this layout with bit 5 unimplemented.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Month(u8);
    impl Debug;
    /// Current year is a leap year (LPYR, read only)
    pub leap_year, _: 5;
    /// Tens place of month (0-1)
    pub ten_month, set_ten_month: 4, 4;
    /// Ones place of month (0-9)
    pub month, set_month: 3, 0;
}
from_register_u8!(Month);

bitfield! {
    /// Year register (0-99) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Year(u8);
    impl Debug;
    /// Tens place of year (0-9)
    pub ten_year, set_ten_year: 7, 4;
    /// Ones place of year (0-9)
    pub year, set_year: 3, 0;
}
from_register_u8!(Year);

bitfield! {
    /// Control register for device configuration.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Control(u8);
    impl Debug;
    /// MFP output level when square wave and alarms are disabled
    pub output, set_output: 7;
    /// Square wave output enable
    pub square_wave_enable, set_square_wave_enable: 6;
    /// Alarm 2 enable (ALM1EN)
    pub alarm2_enable, set_alarm2_enable: 5;
    /// Alarm 1 enable (ALM0EN)
    pub alarm1_enable, set_alarm1_enable: 4;
    /// External 32.768 kHz clock input instead of a crystal
    pub external_oscillator, set_external_oscillator: 3;
    /// Coarse trim mode
    pub coarse_trim, set_coarse_trim: 2;
    /// Square wave output frequency selection
    pub from into SquareWaveFrequency, square_wave_frequency, set_square_wave_frequency: 1, 0;
}
from_register_u8!(Control);

bitfield! {
    /// Digital trim register in sign/magnitude form.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct OscTrim(u8);
    impl Debug;
    /// 1 adds clocks (clock runs slow), 0 subtracts clocks
    pub sign, set_sign: 7;
    /// Trim magnitude (0-127)
    pub trim, set_trim: 6, 0;
}
from_register_u8!(OscTrim);

impl OscTrim {
    /// Builds a trim value from a signed number of clock cycles.
    ///
    /// Positive values add clocks. Returns `None` for -128, which the
    /// sign/magnitude encoding cannot represent.
    pub fn new(value: i8) -> Option<Self> {
        if value == i8::MIN {
            return None;
        }
        let mut trim = OscTrim::default();
        trim.set_sign(value > 0);
        trim.set_trim(value.unsigned_abs());
        Some(trim)
    }

    /// Signed trim value, positive when clocks are added.
    pub fn value(&self) -> i8 {
        // magnitude is 7 bits, always fits
        let magnitude = i8::try_from(self.trim()).unwrap_or(i8::MAX);
        if self.sign() {
            magnitude
        } else {
            -magnitude
        }
    }
}

bitfield! {
    /// Alarm weekday register with match mask, polarity and interrupt flag.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmWeekday(u8);
    impl Debug;
    /// MFP polarity on match (Alarm 1 register only)
    pub from into AlarmPolarity, polarity, set_polarity: 7, 7;
    /// Alarm match mask
    pub from into AlarmMask, mask, set_mask: 6, 4;
    /// Alarm interrupt flag (write 0 to clear)
    pub interrupt_flag, set_interrupt_flag: 3;
    /// Day of week (1-7)
    pub weekday, set_weekday: 2, 0;
}
from_register_u8!(AlarmWeekday);

#[cfg(feature = "defmt")]
impl defmt::Format for AlarmWeekday {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "AlarmWeekday(day {}, mask {}, {}",
            self.weekday(),
            self.mask(),
            self.polarity()
        );
        if self.interrupt_flag() {
            defmt::write!(f, ", triggered");
        }
        defmt::write!(f, ")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_representation_conversions() {
        assert_eq!(
            TimeRepresentation::from(0),
            TimeRepresentation::TwentyFourHour
        );
        assert_eq!(TimeRepresentation::from(1), TimeRepresentation::TwelveHour);
        assert_eq!(u8::from(TimeRepresentation::TwentyFourHour), 0);
        assert_eq!(u8::from(TimeRepresentation::TwelveHour), 1);
    }

    #[test]
    fn test_alarm_mask_conversions() {
        for raw in 0..=7u8 {
            assert_eq!(u8::from(AlarmMask::from(raw)), raw);
        }
        assert_eq!(AlarmMask::from(0b111), AlarmMask::All);
        assert_eq!(AlarmMask::from(0b011), AlarmMask::Weekday);
        assert_eq!(AlarmMask::default(), AlarmMask::All);
    }

    #[test]
    fn test_seconds_register_conversions() {
        let seconds = Seconds::from(0xD9); // ST set, 59 seconds
        assert!(seconds.start_oscillator());
        assert_eq!(seconds.ten_seconds(), 5);
        assert_eq!(seconds.seconds(), 9);
        assert_eq!(u8::from(seconds), 0xD9);

        let seconds = Seconds::from(0x30);
        assert!(!seconds.start_oscillator());
        assert_eq!(seconds.ten_seconds(), 3);
        assert_eq!(seconds.seconds(), 0);
    }

    #[test]
    fn test_hours_register_conversions() {
        // 24-hour mode, 23 hours
        let hours = Hours::from(0x23);
        assert_eq!(
            hours.time_representation(),
            TimeRepresentation::TwentyFourHour
        );
        assert_eq!(hours.ten_hours(), 2);
        assert_eq!(hours.hours(), 3);

        // 12-hour mode, 12 PM
        let hours = Hours::from(0x72);
        assert_eq!(hours.time_representation(), TimeRepresentation::TwelveHour);
        assert!(hours.pm());
        assert_eq!(hours.ten_hours_12h(), 1);
        assert_eq!(hours.hours(), 2);

        // 12-hour mode, 8 AM
        let hours = Hours::from(0x48);
        assert_eq!(hours.time_representation(), TimeRepresentation::TwelveHour);
        assert!(!hours.pm());
        assert_eq!(hours.ten_hours_12h(), 0);
        assert_eq!(hours.hours(), 8);
    }

    #[test]
    fn test_weekday_register_conversions() {
        // OSCRUN, VBATEN, Saturday
        let weekday = Weekday::from(0x2F);
        assert!(weekday.oscillator_running());
        assert!(!weekday.power_fail());
        assert!(weekday.battery_backup());
        assert_eq!(weekday.weekday(), 7);

        let mut weekday = Weekday::default();
        weekday.set_weekday(3);
        weekday.set_battery_backup(true);
        assert_eq!(u8::from(weekday), 0x0B);
    }

    #[test]
    fn test_month_register_conversions() {
        // LPYR set, February
        let month = Month::from(0x22);
        assert!(month.leap_year());
        assert_eq!(month.ten_month(), 0);
        assert_eq!(month.month(), 2);

        let month = Month::from(0x12);
        assert!(!month.leap_year());
        assert_eq!(month.ten_month(), 1);
        assert_eq!(month.month(), 2);
    }

    #[test]
    fn test_date_and_year_register_conversions() {
        let date = Date::from(0x31);
        assert_eq!(date.ten_date(), 3);
        assert_eq!(date.date(), 1);

        let year = Year::from(0x99);
        assert_eq!(year.ten_year(), 9);
        assert_eq!(year.year(), 9);
    }

    #[test]
    fn test_control_register_conversions() {
        let mut control = Control::default();
        control.set_square_wave_enable(true);
        control.set_square_wave_frequency(SquareWaveFrequency::Hz32768);
        control.set_alarm1_enable(true);
        assert_eq!(u8::from(control), 0b0101_0011);

        let control = Control::from(0b1010_1001);
        assert!(control.output());
        assert!(!control.square_wave_enable());
        assert!(control.alarm2_enable());
        assert!(!control.alarm1_enable());
        assert!(control.external_oscillator());
        assert!(!control.coarse_trim());
        assert_eq!(
            control.square_wave_frequency(),
            SquareWaveFrequency::Hz4096
        );
    }

    #[test]
    fn test_osc_trim() {
        let trim = OscTrim::new(42).unwrap();
        assert!(trim.sign());
        assert_eq!(trim.trim(), 42);
        assert_eq!(trim.value(), 42);
        assert_eq!(u8::from(trim), 0x80 | 42);

        let trim = OscTrim::new(-127).unwrap();
        assert!(!trim.sign());
        assert_eq!(trim.value(), -127);
        assert_eq!(u8::from(trim), 0x7F);

        assert_eq!(OscTrim::new(0).unwrap().value(), 0);
        assert!(OscTrim::new(i8::MIN).is_none());
    }

    #[test]
    fn test_alarm_weekday_register_conversions() {
        // ALMPOL, all-match mask, flag set, Friday
        let weekday = AlarmWeekday::from(0xFE);
        assert_eq!(weekday.polarity(), AlarmPolarity::ActiveHigh);
        assert_eq!(weekday.mask(), AlarmMask::All);
        assert!(weekday.interrupt_flag());
        assert_eq!(weekday.weekday(), 6);

        let mut weekday = AlarmWeekday::default();
        weekday.set_mask(AlarmMask::Minutes);
        weekday.set_weekday(2);
        assert_eq!(u8::from(weekday), 0x12);
    }

    #[test]
    fn test_register_roundtrip_conversions() {
        for raw in [0x00u8, 0x5A, 0xA5, 0xFF] {
            assert_eq!(u8::from(Seconds::from(raw)), raw);
            assert_eq!(u8::from(Hours::from(raw)), raw);
            assert_eq!(u8::from(Weekday::from(raw)), raw);
            assert_eq!(u8::from(Control::from(raw)), raw);
            assert_eq!(u8::from(AlarmWeekday::from(raw)), raw);
        }
    }
}
