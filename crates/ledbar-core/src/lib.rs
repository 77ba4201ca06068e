//! Hardware-independent core library for the ledbar board
//!
//! This crate contains all platform-agnostic logic of the LED-bar demo
//! application: edge detection and button handling, the display mode state
//! machine, the LED-bar encodings, the polling loop itself, and blocking
//! `embedded-hal` drivers for the peripherals on the board.
//!
//! It is `#![no_std]` so it compiles on both embedded targets and desktop
//! hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

pub mod app;
pub mod button;
pub mod config;
pub mod drivers;
pub mod encoder;
pub mod error;
pub mod modes;
pub mod port;
pub mod signal;

pub use app::{AppContext, AppLoop, AppState, LoopStatus};
pub use button::{DebouncedButton, Polarity};
pub use config::LoopConfig;
pub use error::{AppError, PeripheralError};
pub use modes::{ButtonCounter, DisplayMode, IndicatorPattern, ModeController, TemperatureSample};
pub use port::{AnalogReading, PeripheralPort};
pub use signal::EdgeDetector;
