//! Board constants and runtime loop configuration
//!
//! Pin numbers, bus parameters and timing defaults live here so they can be
//! tuned in one place. [`LoopConfig`] carries the values the polling loop
//! reads at runtime and can be persisted with postcard.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// GPIO pin assignments (BCM numbering)
//
//   LED0 (mode bit 0)   → GPIO27
//   LED1 (mode bit 1)   → GPIO22
//   BTN0 (mode select)  → GPIO23
//   BTN1 (action)       → GPIO24
//   LED bar latch       → GPIO25
//   ADC nCS             → GPIO8

pub const GPIO_LED0: u8 = 27;
pub const GPIO_LED1: u8 = 22;
pub const GPIO_BTN0: u8 = 23;
pub const GPIO_BTN1: u8 = 24;
pub const GPIO_SR_LATCH: u8 = 25;
pub const GPIO_ADC_NCS: u8 = 8;

// SPI

/// Maximum SCLK frequency for the ADC (Hz).
pub const ADC_MAX_CLOCK_HZ: u32 = 811_000;

/// Maximum SCLK frequency for the LED-bar shift register (Hz).
pub const LED_BAR_MAX_CLOCK_HZ: u32 = 411_000;

/// ADC channel the potentiometer is wired to.
pub const POT_CHANNEL: u8 = 0;

// I2C

/// 7-bit address of the TMP1075 board temperature sensor.
pub const TMP1075_ADDRESS: u8 = 0x48;

// Timing defaults

/// Interval between two sensor refreshes (ms).
pub const SAMPLE_INTERVAL_MS: u64 = 30;

/// Sleep at the end of every loop iteration (ms).
pub const LOOP_SLEEP_MS: u32 = 5;

/// Hold time of the mode button that requests shutdown (ms).
pub const LONG_PRESS_MS: u64 = 1000;

/// Minimum spacing of "invalid state" log lines (ms).
pub const INVALID_STATE_LOG_INTERVAL_MS: u64 = 5000;

/// Size of a postcard-encoded [`LoopConfig`] buffer.
pub const CONFIG_BUFFER_SIZE: usize = 48;

/// Runtime parameters of the polling loop.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    pub sample_interval_ms: u64,
    pub loop_sleep_ms: u32,
    pub long_press_ms: u64,
    pub invalid_state_log_interval_ms: u64,
    pub long_press_exit: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: SAMPLE_INTERVAL_MS,
            loop_sleep_ms: LOOP_SLEEP_MS,
            long_press_ms: LONG_PRESS_MS,
            invalid_state_log_interval_ms: INVALID_STATE_LOG_INTERVAL_MS,
            long_press_exit: true,
        }
    }
}

impl LoopConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn invalid_state_log_interval(&self) -> Duration {
        Duration::from_millis(self.invalid_state_log_interval_ms)
    }

    /// Decode a configuration previously written with [`LoopConfig::to_slice`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AppError> {
        Ok(postcard::from_bytes(bytes)?)
    }

    /// Encode into `buf`, returning the used prefix.
    pub fn to_slice<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], AppError> {
        Ok(postcard::to_slice(self, buf)?)
    }
}
