//! The loop's view of the board
//!
//! [`PeripheralPort`] is everything the polling loop needs from the outside
//! world apart from the buttons: one analog channel, the LED-bar byte sink,
//! the two mode indicators and two temperatures. Every call is synchronous
//! and treated as atomic by the loop.

use crate::error::PeripheralError;
use crate::modes::IndicatorPattern;

/// Full-scale value of the 10-bit ADC.
pub const ADC_FULL_SCALE: u16 = 1023;

/// One ADC conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalogReading {
    raw: u16,
    normalized: f32,
}

impl AnalogReading {
    /// Build a reading from a raw conversion result.
    ///
    /// Values above full scale are clamped to 1023.
    pub fn new(raw: u16) -> Self {
        let raw = raw.min(ADC_FULL_SCALE);
        Self {
            raw,
            normalized: raw as f32 / ADC_FULL_SCALE as f32,
        }
    }

    pub const fn zero() -> Self {
        Self {
            raw: 0,
            normalized: 0.0,
        }
    }

    pub const fn raw(&self) -> u16 {
        self.raw
    }

    /// Reading scaled to [0, 1].
    pub const fn normalized(&self) -> f32 {
        self.normalized
    }
}

impl Default for AnalogReading {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<u16> for AnalogReading {
    fn from(raw: u16) -> Self {
        Self::new(raw)
    }
}

/// Peripherals consumed by [`AppLoop`](crate::app::AppLoop).
///
/// Failures are reported as values. The loop keeps the last good reading on a
/// failed read and skips a failed write; nothing here may panic.
pub trait PeripheralPort {
    fn read_channel(&mut self, channel: u8) -> Result<AnalogReading, PeripheralError>;

    fn write_display(&mut self, value: u8) -> Result<(), PeripheralError>;

    fn write_indicators(&mut self, pattern: IndicatorPattern) -> Result<(), PeripheralError>;

    /// SoC temperature in °C.
    fn read_cpu_temperature(&mut self) -> Result<f32, PeripheralError>;

    /// PCB temperature in °C.
    fn read_board_temperature(&mut self) -> Result<f32, PeripheralError>;
}

impl<T: PeripheralPort + ?Sized> PeripheralPort for &mut T {
    fn read_channel(&mut self, channel: u8) -> Result<AnalogReading, PeripheralError> {
        (**self).read_channel(channel)
    }

    fn write_display(&mut self, value: u8) -> Result<(), PeripheralError> {
        (**self).write_display(value)
    }

    fn write_indicators(&mut self, pattern: IndicatorPattern) -> Result<(), PeripheralError> {
        (**self).write_indicators(pattern)
    }

    fn read_cpu_temperature(&mut self) -> Result<f32, PeripheralError> {
        (**self).read_cpu_temperature()
    }

    fn read_board_temperature(&mut self) -> Result<f32, PeripheralError> {
        (**self).read_board_temperature()
    }
}
