//! A platform-agnostic driver for the MCP7940 real-time clock.
//!
//! The MCP7940N/M keeps time in seven BCD registers and offers two alarm
//! comparators with their own six-register blocks, 64 bytes of battery-backed
//! SRAM and a digital trim register. This crate talks to it through the
//! [`embedded_hal::i2c::I2c`] trait, or [`embedded_hal_async`] with the
//! `async` feature.
//!
//! # Features
//!
//! - Read and set the clock as a [`Timestamp`], validated against the calendar
//! - Read and set both alarms as [`AlarmTimestamp`]s, independently
//! - 12-hour or 24-hour register format
//! - Oscillator start/stop, battery backup and power-fail status
//! - Alarm enable, mask, polarity and interrupt flag handling
//! - SRAM access and digital trim
//! - Optional `log` or `defmt` logging
//!
//! # Bus Transactions
//!
//! Every time or alarm accessor is exactly one I2C transaction: a single
//! block read or a single block write. Nothing is cached between calls, and
//! bus errors are returned unchanged inside [`Mcp7940Error::I2c`].
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp7940::{AlarmSlot, Mcp7940, Timestamp, DEFAULT_ADDRESS};
//!
//! let mut rtc = Mcp7940::new(i2c, DEFAULT_ADDRESS);
//! rtc.set_time(&Timestamp::new(2019, 7, 16, 15, 29, 14, 6))?;
//! let now = rtc.get_time()?;
//!
//! rtc.set_alarm(AlarmSlot::Alarm1, now)?;
//! rtc.set_alarm_enabled(AlarmSlot::Alarm1, true)?;
//! ```

#![no_std]

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        macro_rules! debug {
            ($($arg:tt)*) => { defmt::debug!($($arg)*) };
        }
        macro_rules! error {
            ($($arg:tt)*) => { defmt::error!($($arg)*) };
        }
    } else if #[cfg(feature = "log")] {
        macro_rules! debug {
            ($($arg:tt)*) => { log::debug!($($arg)*) };
        }
        macro_rules! error {
            ($($arg:tt)*) => { log::error!($($arg)*) };
        }
    } else {
        macro_rules! debug {
            ($($arg:tt)*) => {};
        }
        macro_rules! error {
            ($($arg:tt)*) => {};
        }
    }
}

mod alarm;
#[cfg(feature = "async")]
pub mod asynch;
mod bcd;
mod calendar;
mod datetime;
mod registers;

pub use alarm::{AlarmConfig, AlarmSlot, AlarmTimestamp};
pub use bcd::{bcd_to_int, int_to_bcd};
pub use calendar::{days_in_month, is_leap_year};
pub use datetime::{Timestamp, ValidationError};
pub use registers::*;

use alarm::{apply_config, Mcp7940Alarm};
use datetime::{reencode_hours, Mcp7940DateTime};
use embedded_hal::i2c::I2c;
use paste::paste;

/// Configuration for the MCP7940.
///
/// Applied with [`Mcp7940::configure`]. The driver remembers the time
/// representation, battery backup and alarm settings so that later block
/// writes of the clock and alarms carry the same control bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Hour register format used when writing times
    pub time_representation: TimeRepresentation,
    /// Keep time on the backup supply (VBATEN)
    pub battery_backup: bool,
    /// Square wave output on MFP, `None` to disable
    pub square_wave: Option<SquareWaveFrequency>,
    /// Use an external 32.768 kHz clock instead of a crystal
    pub external_oscillator: bool,
    /// Match configuration of Alarm 1
    pub alarm1: AlarmConfig,
    /// Match configuration of Alarm 2
    pub alarm2: AlarmConfig,
}

/// Error type for MCP7940 operations.
#[derive(Debug)]
pub enum Mcp7940Error<I2CE> {
    /// I2C bus error, passed through unchanged
    I2c(I2CE),
    /// A value was rejected before any bus traffic
    Validation(ValidationError),
    /// SRAM access outside the 64-byte range
    SramOutOfRange,
}

impl<I2CE> From<I2CE> for Mcp7940Error<I2CE> {
    fn from(e: I2CE) -> Self {
        Mcp7940Error::I2c(e)
    }
}

/// MCP7940 Real-Time Clock driver.
pub struct Mcp7940<I2C: I2c> {
    i2c: I2C,
    address: u8,
    time_representation: TimeRepresentation,
    battery_backup: bool,
    alarm_configs: [AlarmConfig; 2],
}

impl<I2C: I2c> Mcp7940<I2C> {
    /// Creates a new driver instance.
    ///
    /// Until [`configure`](Self::configure) or [`load_config`](Self::load_config)
    /// is called, times are written in 24-hour format with battery backup
    /// disabled and both alarms matching on all fields. The chip keeps its
    /// configuration on the backup supply, so call `load_config` first when
    /// it may already be set up.
    ///
    /// # Arguments
    /// * `i2c` - The I2C bus implementation
    /// * `address` - The I2C address of the device (normally [`DEFAULT_ADDRESS`])
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            time_representation: TimeRepresentation::TwentyFourHour,
            battery_backup: false,
            alarm_configs: [AlarmConfig::default(); 2],
        }
    }

    /// Consumes the driver and returns the I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Loads the configuration already stored on the chip.
    ///
    /// Reads VBATEN, the hour format and both alarm mask/polarity registers
    /// so that later block writes carry the same bits. Only reads are issued.
    pub fn load_config(&mut self) -> Result<(), Mcp7940Error<I2C::Error>> {
        let weekday = self.rtc_weekday()?;
        let hours = self.rtc_hours()?;
        let alarm1 = self.alarm_weekday(AlarmSlot::Alarm1)?;
        let alarm2 = self.alarm_weekday(AlarmSlot::Alarm2)?;

        self.battery_backup = weekday.battery_backup();
        self.time_representation = hours.time_representation();
        self.alarm_configs = [alarm1.into(), alarm2.into()];
        debug!(
            "MCP7940: loaded {:?} battery_backup={} alarms={:?}",
            self.time_representation,
            self.battery_backup,
            self.alarm_configs
        );
        Ok(())
    }

    /// Configures the device according to the provided configuration.
    ///
    /// Every affected register is read and checked before the first write.
    /// The clock and both alarm hours registers are re-encoded so their
    /// hours survive a change of format.
    ///
    /// # Errors
    /// Returns a validation error, with nothing written, for a reserved alarm
    /// mask or an hours register holding an hour the chip should never
    /// report. A bus error while writing leaves the registers already written
    /// in place; calling `configure` again completes the change.
    pub fn configure(&mut self, config: &Config) -> Result<(), Mcp7940Error<I2C::Error>> {
        config.alarm1.validate().map_err(Mcp7940Error::Validation)?;
        config.alarm2.validate().map_err(Mcp7940Error::Validation)?;
        let representation = config.time_representation;

        debug!("MCP7940: reading control register");
        let mut control = self.control()?;
        control.set_square_wave_enable(config.square_wave.is_some());
        if let Some(frequency) = config.square_wave {
            control.set_square_wave_frequency(frequency);
        }
        control.set_external_oscillator(config.external_oscillator);

        let mut weekday = self.rtc_weekday()?;
        weekday.set_battery_backup(config.battery_backup);

        debug!("MCP7940: reading hours registers");
        let hours = reencode_hours(self.rtc_hours()?, representation)
            .map_err(Mcp7940Error::Validation)?;
        let alarm1_hours = reencode_hours(self.alarm_hours(AlarmSlot::Alarm1)?, representation)
            .map_err(Mcp7940Error::Validation)?;
        let alarm2_hours = reencode_hours(self.alarm_hours(AlarmSlot::Alarm2)?, representation)
            .map_err(Mcp7940Error::Validation)?;

        let mut alarm1_weekday = self.alarm_weekday(AlarmSlot::Alarm1)?;
        apply_config(&mut alarm1_weekday, AlarmSlot::Alarm1, config.alarm1);
        let mut alarm2_weekday = self.alarm_weekday(AlarmSlot::Alarm2)?;
        apply_config(&mut alarm2_weekday, AlarmSlot::Alarm2, config.alarm2);

        debug!("MCP7940: writing control: {:?}", control);
        self.set_control(control)?;
        self.set_rtc_weekday(weekday)?;
        self.set_rtc_hours(hours)?;
        self.set_alarm_hours(AlarmSlot::Alarm1, alarm1_hours)?;
        self.set_alarm_hours(AlarmSlot::Alarm2, alarm2_hours)?;
        self.set_alarm_weekday(AlarmSlot::Alarm1, alarm1_weekday)?;
        self.set_alarm_weekday(AlarmSlot::Alarm2, alarm2_weekday)?;
        self.alarm_configs = [config.alarm1, config.alarm2];
        Ok(())
    }

    fn read_register(&mut self, register: RegAddr) -> Result<u8, Mcp7940Error<I2C::Error>> {
        let mut data = [0];
        self.i2c
            .write_read(self.address, &[register as u8], &mut data)?;
        Ok(data[0])
    }

    fn write_register(
        &mut self,
        register: RegAddr,
        value: u8,
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.i2c.write(self.address, &[register as u8, value])?;
        Ok(())
    }

    /// Gets the value of the rtc_hours register.
    pub fn rtc_hours(&mut self) -> Result<Hours, Mcp7940Error<I2C::Error>> {
        Ok(Hours(self.read_register(RegAddr::Hours)?))
    }

    /// Sets the value of the rtc_hours register.
    ///
    /// The 12/24-hour bit written here becomes the format of later time and
    /// alarm writes.
    pub fn set_rtc_hours(&mut self, value: Hours) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_register(RegAddr::Hours, value.into())?;
        self.time_representation = value.time_representation();
        Ok(())
    }

    /// Gets the value of the rtc_weekday register.
    pub fn rtc_weekday(&mut self) -> Result<Weekday, Mcp7940Error<I2C::Error>> {
        Ok(Weekday(self.read_register(RegAddr::Weekday)?))
    }

    /// Sets the value of the rtc_weekday register.
    ///
    /// The VBATEN bit written here is kept by later [`set_time`](Self::set_time)
    /// calls.
    pub fn set_rtc_weekday(&mut self, value: Weekday) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_register(RegAddr::Weekday, value.into())?;
        self.battery_backup = value.battery_backup();
        Ok(())
    }

    fn alarm_hours(&mut self, slot: AlarmSlot) -> Result<Hours, Mcp7940Error<I2C::Error>> {
        Ok(Hours(self.read_register(slot.hours_register())?))
    }

    fn set_alarm_hours(
        &mut self,
        slot: AlarmSlot,
        value: Hours,
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_register(slot.hours_register(), value.into())
    }

    /// Reads the raw clock registers from the device.
    fn read_raw_datetime(&mut self) -> Result<Mcp7940DateTime, Mcp7940Error<I2C::Error>> {
        let mut data = [0; CLOCK_REGISTERS];
        self.i2c
            .write_read(self.address, &[RegAddr::Seconds as u8], &mut data)?;
        Ok(data.into())
    }

    /// Writes the raw clock registers in one transaction.
    fn write_raw_datetime(
        &mut self,
        datetime: &Mcp7940DateTime,
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        let data: [u8; CLOCK_REGISTERS] = datetime.into();
        let mut buffer = [0; CLOCK_REGISTERS + 1];
        buffer[0] = RegAddr::Seconds as u8;
        buffer[1..].copy_from_slice(&data);
        self.i2c.write(self.address, &buffer)?;
        Ok(())
    }

    /// Gets the current date and time from the device.
    ///
    /// Control bits are stripped from each register before decoding, no
    /// calendar validation is applied, and `yearday` is always 0.
    ///
    /// # Errors
    /// Returns the bus error if the read fails.
    pub fn get_time(&mut self) -> Result<Timestamp, Mcp7940Error<I2C::Error>> {
        let raw = self.read_raw_datetime()?;
        Ok(raw.into_timestamp())
    }

    /// Sets the current date and time on the device.
    ///
    /// `yearday` is ignored. The oscillator start bit is set so the clock
    /// keeps running after the write.
    ///
    /// # Errors
    /// Returns [`Mcp7940Error::Validation`] without touching the bus if any
    /// field is out of range or the day does not exist in that month.
    pub fn set_time(&mut self, timestamp: &Timestamp) -> Result<(), Mcp7940Error<I2C::Error>> {
        let raw =
            Mcp7940DateTime::from_timestamp(timestamp, self.time_representation, self.battery_backup)
                .map_err(|e| {
                    error!("MCP7940: rejected time: {:?}", e);
                    Mcp7940Error::Validation(e)
                })?;
        self.write_raw_datetime(&raw)
    }

    /// Reads one alarm block from the device.
    fn read_raw_alarm(&mut self, slot: AlarmSlot) -> Result<Mcp7940Alarm, Mcp7940Error<I2C::Error>> {
        let mut data = [0; ALARM_REGISTERS];
        self.i2c
            .write_read(self.address, &[slot.base() as u8], &mut data)?;
        Ok(data.into())
    }

    /// Writes one alarm block in one transaction.
    fn write_raw_alarm(
        &mut self,
        slot: AlarmSlot,
        alarm: &Mcp7940Alarm,
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        let data: [u8; ALARM_REGISTERS] = alarm.into();
        let mut buffer = [0; ALARM_REGISTERS + 1];
        buffer[0] = slot.base() as u8;
        buffer[1..].copy_from_slice(&data);
        self.i2c.write(self.address, &buffer)?;
        Ok(())
    }

    /// Gets the time fields of an alarm.
    ///
    /// # Errors
    /// Returns the bus error if the read fails.
    pub fn get_alarm(&mut self, slot: AlarmSlot) -> Result<AlarmTimestamp, Mcp7940Error<I2C::Error>> {
        let raw = self.read_raw_alarm(slot)?;
        Ok(raw.into_alarm())
    }

    /// Sets the time fields of an alarm.
    ///
    /// Accepts an [`AlarmTimestamp`] or a [`Timestamp`], whose year and
    /// yearday are dropped. Only the slot's own six registers are written;
    /// the weekday register carries the slot's configured mask and polarity
    /// and a cleared interrupt flag.
    ///
    /// # Errors
    /// Returns [`Mcp7940Error::Validation`] without touching the bus if any
    /// field is out of range.
    pub fn set_alarm(
        &mut self,
        slot: AlarmSlot,
        alarm: impl Into<AlarmTimestamp>,
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        let alarm = alarm.into();
        let raw = Mcp7940Alarm::from_alarm(
            &alarm,
            slot,
            self.alarm_configs[slot.index()],
            self.time_representation,
        )
        .map_err(|e| {
            error!("MCP7940: rejected {:?} value: {:?}", slot, e);
            Mcp7940Error::Validation(e)
        })?;
        self.write_raw_alarm(slot, &raw)
    }

    /// Reads an alarm's weekday, mask and polarity register.
    pub fn alarm_weekday(
        &mut self,
        slot: AlarmSlot,
    ) -> Result<AlarmWeekday, Mcp7940Error<I2C::Error>> {
        Ok(AlarmWeekday(self.read_register(slot.weekday_register())?))
    }

    /// Writes an alarm's weekday, mask and polarity register.
    ///
    /// The mask and polarity written here are kept by later
    /// [`set_alarm`](Self::set_alarm) calls for that slot.
    pub fn set_alarm_weekday(
        &mut self,
        slot: AlarmSlot,
        value: AlarmWeekday,
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        self.write_register(slot.weekday_register(), value.into())?;
        self.alarm_configs[slot.index()] = value.into();
        Ok(())
    }

    /// Reads the mask and polarity currently stored for an alarm.
    pub fn alarm_config(&mut self, slot: AlarmSlot) -> Result<AlarmConfig, Mcp7940Error<I2C::Error>> {
        Ok(self.alarm_weekday(slot)?.into())
    }

    /// Changes the mask and polarity of an alarm, leaving its time fields
    /// and interrupt flag alone. Later [`set_alarm`](Self::set_alarm) calls
    /// use the new configuration.
    ///
    /// # Errors
    /// Returns [`Mcp7940Error::Validation`] without touching the bus for a
    /// reserved mask.
    pub fn set_alarm_config(
        &mut self,
        slot: AlarmSlot,
        config: AlarmConfig,
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        config.validate().map_err(Mcp7940Error::Validation)?;
        let mut weekday = self.alarm_weekday(slot)?;
        apply_config(&mut weekday, slot, config);
        debug!("MCP7940: {:?} weekday: {:?}", slot, weekday);
        self.set_alarm_weekday(slot, weekday)
    }

    /// Enables or disables an alarm in the control register.
    pub fn set_alarm_enabled(
        &mut self,
        slot: AlarmSlot,
        enabled: bool,
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        let mut control = self.control()?;
        match slot {
            AlarmSlot::Alarm1 => control.set_alarm1_enable(enabled),
            AlarmSlot::Alarm2 => control.set_alarm2_enable(enabled),
        }
        self.set_control(control)
    }

    /// Returns whether an alarm is enabled.
    pub fn is_alarm_enabled(&mut self, slot: AlarmSlot) -> Result<bool, Mcp7940Error<I2C::Error>> {
        let control = self.control()?;
        Ok(match slot {
            AlarmSlot::Alarm1 => control.alarm1_enable(),
            AlarmSlot::Alarm2 => control.alarm2_enable(),
        })
    }

    /// Returns whether an alarm has matched since its flag was last cleared.
    pub fn is_alarm_triggered(&mut self, slot: AlarmSlot) -> Result<bool, Mcp7940Error<I2C::Error>> {
        Ok(self.alarm_weekday(slot)?.interrupt_flag())
    }

    /// Clears an alarm's interrupt flag.
    pub fn clear_alarm_flag(&mut self, slot: AlarmSlot) -> Result<(), Mcp7940Error<I2C::Error>> {
        let mut weekday = self.alarm_weekday(slot)?;
        weekday.set_interrupt_flag(false);
        self.set_alarm_weekday(slot, weekday)
    }

    /// Starts the oscillator (sets ST).
    pub fn start(&mut self) -> Result<(), Mcp7940Error<I2C::Error>> {
        let mut seconds = self.rtc_seconds()?;
        seconds.set_start_oscillator(true);
        self.set_rtc_seconds(seconds)
    }

    /// Stops the oscillator (clears ST).
    pub fn stop(&mut self) -> Result<(), Mcp7940Error<I2C::Error>> {
        let mut seconds = self.rtc_seconds()?;
        seconds.set_start_oscillator(false);
        self.set_rtc_seconds(seconds)
    }

    /// Returns whether the oscillator has been told to run.
    pub fn is_started(&mut self) -> Result<bool, Mcp7940Error<I2C::Error>> {
        Ok(self.rtc_seconds()?.start_oscillator())
    }

    /// Returns whether the oscillator is actually running (OSCRUN).
    pub fn is_oscillator_running(&mut self) -> Result<bool, Mcp7940Error<I2C::Error>> {
        Ok(self.rtc_weekday()?.oscillator_running())
    }

    /// Enables or disables the battery backup supply.
    pub fn set_battery_backup(&mut self, enabled: bool) -> Result<(), Mcp7940Error<I2C::Error>> {
        let mut weekday = self.rtc_weekday()?;
        weekday.set_battery_backup(enabled);
        self.set_rtc_weekday(weekday)
    }

    /// Returns whether the battery backup supply is enabled.
    pub fn is_battery_backup_enabled(&mut self) -> Result<bool, Mcp7940Error<I2C::Error>> {
        Ok(self.rtc_weekday()?.battery_backup())
    }

    /// Returns whether primary power was lost while on battery.
    pub fn power_failed(&mut self) -> Result<bool, Mcp7940Error<I2C::Error>> {
        Ok(self.rtc_weekday()?.power_fail())
    }

    /// Clears the power-fail flag.
    pub fn clear_power_failed(&mut self) -> Result<(), Mcp7940Error<I2C::Error>> {
        let mut weekday = self.rtc_weekday()?;
        weekday.set_power_fail(false);
        self.set_rtc_weekday(weekday)
    }

    /// Reads `buffer.len()` bytes of SRAM starting at `offset`.
    ///
    /// # Errors
    /// Returns [`Mcp7940Error::SramOutOfRange`] if the span leaves the
    /// 64-byte SRAM.
    pub fn read_sram(
        &mut self,
        offset: u8,
        buffer: &mut [u8],
    ) -> Result<(), Mcp7940Error<I2C::Error>> {
        let start = sram_address(offset, buffer.len())?;
        if buffer.is_empty() {
            return Ok(());
        }
        self.i2c.write_read(self.address, &[start], buffer)?;
        Ok(())
    }

    /// Writes `data` to SRAM starting at `offset`.
    ///
    /// # Errors
    /// Returns [`Mcp7940Error::SramOutOfRange`] if the span leaves the
    /// 64-byte SRAM.
    pub fn write_sram(&mut self, offset: u8, data: &[u8]) -> Result<(), Mcp7940Error<I2C::Error>> {
        let start = sram_address(offset, data.len())?;
        if data.is_empty() {
            return Ok(());
        }
        let mut buffer = [0; SRAM_SIZE + 1];
        buffer[0] = start;
        buffer[1..=data.len()].copy_from_slice(data);
        self.i2c.write(self.address, &buffer[..=data.len()])?;
        Ok(())
    }
}

/// Register address of an SRAM span, checking it fits.
pub(crate) fn sram_address<E>(offset: u8, len: usize) -> Result<u8, Mcp7940Error<E>> {
    if usize::from(offset) + len > SRAM_SIZE {
        error!("MCP7940: SRAM span {}+{} out of range", offset, len);
        return Err(Mcp7940Error::SramOutOfRange);
    }
    Ok(RegAddr::Sram as u8 + offset)
}

// Single register access implementations
macro_rules! impl_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ident)),+) => {
        impl<I2C: I2c> Mcp7940<I2C> {
            $(
                paste! {
                    #[doc = concat!("Gets the value of the ", stringify!($name), " register.")]
                    pub fn $name(&mut self) -> Result<$typ, Mcp7940Error<I2C::Error>> {
                        let mut data = [0];
                        self.i2c
                            .write_read(self.address, &[$regaddr as u8], &mut data)?;
                        Ok($typ(data[0]))
                    }

                    #[doc = concat!("Sets the value of the ", stringify!($name), " register.")]
                    pub fn [<set_ $name>](&mut self, value: $typ) -> Result<(), Mcp7940Error<I2C::Error>> {
                        self.i2c.write(
                            self.address,
                            &[$regaddr as u8, value.into()],
                        )?;
                        Ok(())
                    }
                }
            )+
        }
    }
}

impl_register_access!(
    (rtc_seconds, RegAddr::Seconds, Seconds),
    (control, RegAddr::Control, Control),
    (osc_trim, RegAddr::OscTrim, OscTrim)
);
