//! Polled push buttons with edge flags
//!
//! Debouncing is done by cadence: the loop samples every button once per
//! iteration, which is slow compared to contact bounce, and the
//! [`EdgeDetector`] turns consecutive samples into one-shot press/release
//! flags.

use embedded_hal::digital::InputPin;
use log::{debug, warn};

use crate::error::{AppError, message};
use crate::signal::EdgeDetector;

/// Electrical level that means "pressed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Map a raw pin level to the logical "pressed" level.
    pub const fn apply(self, is_high: bool) -> bool {
        match self {
            Self::ActiveHigh => is_high,
            Self::ActiveLow => !is_high,
        }
    }
}

pub struct DebouncedButton<P> {
    pin: P,
    polarity: Polarity,
    signal: EdgeDetector,
    name: &'static str,
}

impl<P: InputPin> DebouncedButton<P> {
    /// Take ownership of `pin` and seed the edge detector from two
    /// consecutive reads, so the first [`update`](Self::update) compares
    /// against a real level instead of an assumed default.
    pub fn new(name: &'static str, mut pin: P, polarity: Polarity) -> Result<Self, AppError> {
        let first = Self::read(&mut pin, name)?;
        let second = Self::read(&mut pin, name)?;

        Ok(Self {
            pin,
            polarity,
            signal: EdgeDetector::seeded(polarity.apply(first), polarity.apply(second)),
            name,
        })
    }

    fn read(pin: &mut P, name: &'static str) -> Result<bool, AppError> {
        pin.is_high().map_err(|e| {
            AppError::Button(message(format_args!("{}: initial read failed: {:?}", name, e)))
        })
    }

    /// Sample the pin once. Call exactly once per loop iteration.
    ///
    /// A failed read repeats the last known level.
    pub fn update(&mut self) {
        let level = match self.pin.is_high() {
            Ok(high) => self.polarity.apply(high),
            Err(e) => {
                warn!("{}: read failed, holding last level: {:?}", self.name, e);
                self.signal.level()
            }
        };

        self.signal.update(level);

        if self.signal.rising() {
            debug!("{} pressed", self.name);
        }
        if self.signal.falling() {
            debug!("{} released", self.name);
        }
    }

    /// Pressed right now.
    pub fn level(&self) -> bool {
        self.signal.level()
    }

    /// Pressed on the last update.
    pub fn rose(&self) -> bool {
        self.signal.rising()
    }

    /// Released on the last update.
    pub fn fell(&self) -> bool {
        self.signal.falling()
    }

    pub fn release(self) -> P {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use std::collections::VecDeque;

    /// Input pin replaying a fixed sequence of raw levels, then holding the last one.
    struct ScriptedPin {
        levels: VecDeque<bool>,
        last: bool,
    }

    impl ScriptedPin {
        fn new(levels: &[bool]) -> Self {
            Self {
                levels: levels.iter().copied().collect(),
                last: false,
            }
        }
    }

    impl embedded_hal::digital::ErrorType for ScriptedPin {
        type Error = Infallible;
    }

    impl InputPin for ScriptedPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            if let Some(level) = self.levels.pop_front() {
                self.last = level;
            }
            Ok(self.last)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.is_high().map(|high| !high)
        }
    }

    /// Input pin that always fails.
    struct BrokenPin;

    impl embedded_hal::digital::ErrorType for BrokenPin {
        type Error = embedded_hal::digital::ErrorKind;
    }

    impl InputPin for BrokenPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Err(embedded_hal::digital::ErrorKind::Other)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Err(embedded_hal::digital::ErrorKind::Other)
        }
    }

    #[test]
    fn test_no_spurious_edge_after_construction() {
        // Pin already held high at start-up.
        let mut button =
            DebouncedButton::new("BTN0", ScriptedPin::new(&[true, true, true]), Polarity::ActiveHigh)
                .unwrap();

        button.update();
        assert!(button.level());
        assert!(!button.rose());
    }

    #[test]
    fn test_active_high_edges() {
        let pin = ScriptedPin::new(&[false, false, true, true, false]);
        let mut button = DebouncedButton::new("BTN0", pin, Polarity::ActiveHigh).unwrap();

        button.update();
        assert!(button.rose());
        button.update();
        assert!(!button.rose());
        assert!(button.level());
        button.update();
        assert!(button.fell());
        assert!(!button.level());
    }

    #[test]
    fn test_active_low_inverts_raw_level() {
        // Idle high, pressed pulls the line low.
        let pin = ScriptedPin::new(&[true, true, false, true]);
        let mut button = DebouncedButton::new("BTN1", pin, Polarity::ActiveLow).unwrap();
        assert!(!button.level());

        button.update();
        assert!(button.rose());
        assert!(button.level());

        button.update();
        assert!(button.fell());
    }

    #[test]
    fn test_construction_fails_on_read_error() {
        assert!(matches!(
            DebouncedButton::new("BTN0", BrokenPin, Polarity::ActiveHigh),
            Err(AppError::Button(_))
        ));
    }

    #[test]
    fn test_polarity_apply() {
        assert!(Polarity::ActiveHigh.apply(true));
        assert!(!Polarity::ActiveHigh.apply(false));
        assert!(Polarity::ActiveLow.apply(false));
        assert!(!Polarity::ActiveLow.apply(true));
    }
}
