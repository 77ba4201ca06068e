//! Error types shared by the loop, the port and the drivers

use core::fmt::Write;

use thiserror_no_std::Error;

/// Failure of a single peripheral access.
///
/// All variants are `Copy` and carry only static strings so they can be
/// logged and dropped inside the polling loop without allocation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralError {
    #[error("{device}: bus error during {operation}")]
    Bus {
        device: &'static str,
        operation: &'static str,
    },
    #[error("invalid ADC channel {0}")]
    InvalidChannel(u8),
    #[error("{device}: unexpected device ID 0x{id:04x}")]
    UnexpectedDeviceId { device: &'static str, id: u16 },
    #[error("{device}: not available")]
    Unavailable { device: &'static str },
}

impl PeripheralError {
    /// Whether the error comes from a subsystem that was never brought up.
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Construction-time failures of the application.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Initialization failed: {0}")]
    Init(heapless::String<64>),
    #[error("Button error: {0}")]
    Button(heapless::String<64>),
    #[error("Config error: {0}")]
    Config(heapless::String<64>),
}

/// Render a displayable value into a bounded message.
///
/// Output that does not fit is truncated.
pub fn message<const N: usize>(args: core::fmt::Arguments<'_>) -> heapless::String<N> {
    let mut msg = heapless::String::new();
    // Err only signals that the buffer filled up.
    let _ = Truncating(&mut msg).write_fmt(args);
    msg
}

/// Writer that keeps the longest prefix fitting into the buffer.
struct Truncating<'a, const N: usize>(&'a mut heapless::String<N>);

impl<const N: usize> Write for Truncating<'_, N> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                return Err(core::fmt::Error);
            }
        }
        Ok(())
    }
}

impl From<PeripheralError> for AppError {
    fn from(e: PeripheralError) -> Self {
        AppError::Init(message(format_args!("{}", e)))
    }
}

impl From<postcard::Error> for AppError {
    fn from(e: postcard::Error) -> Self {
        AppError::Config(message(format_args!("{}", e)))
    }
}
