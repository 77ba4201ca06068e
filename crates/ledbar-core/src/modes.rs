//! Display modes and the mode state machine
//!
//! The mode button steps through [`DisplayMode`] in a ring; the action button
//! has a mode-specific meaning. The active mode is shown in binary on two
//! indicator LEDs.

use log::{debug, info};

use crate::app::AppContext;
use crate::encoder;

/// What the LED bar currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Potentiometer as a filled bar
    #[default]
    PotBar,
    /// Potentiometer as a binary number
    PotRaw,
    /// Action-button counter
    ButtonCounter,
    /// Board or CPU temperature, 7.1 fixed point
    Temperature,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 4] = [
        Self::PotBar,
        Self::PotRaw,
        Self::ButtonCounter,
        Self::Temperature,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub const fn index(self) -> u8 {
        match self {
            Self::PotBar => 0,
            Self::PotRaw => 1,
            Self::ButtonCounter => 2,
            Self::Temperature => 3,
        }
    }

    /// Mode for `index`, wrapping around the ring.
    pub const fn from_index(index: u8) -> Self {
        Self::ALL[index as usize % Self::COUNT]
    }

    pub const fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PotBar => "potentiometer => LED bar",
            Self::PotRaw => "potentiometer => LED bar (as binary value)",
            Self::ButtonCounter => "button counter => LED bar",
            Self::Temperature => "board/CPU temperature => LED bar (fixed point 7.1)",
        }
    }
}

// Two indicator LEDs hold the mode index in binary.
const _: () = assert!(DisplayMode::COUNT <= 4, "LED0/LED1 can't represent all modes");

/// State of the two mode indicator LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndicatorPattern {
    pub led0: bool,
    pub led1: bool,
}

impl IndicatorPattern {
    pub const OFF: Self = Self {
        led0: false,
        led1: false,
    };

    pub const fn for_mode(mode: DisplayMode) -> Self {
        let index = mode.index();
        Self {
            led0: index & 0x01 != 0,
            led1: index & 0x02 != 0,
        }
    }

    /// The pattern read back as a 2-bit number.
    pub const fn bits(self) -> u8 {
        (self.led0 as u8) | ((self.led1 as u8) << 1)
    }
}

/// Counter step selected by the potentiometer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterStep {
    Up16,
    Up1,
    Down1,
    Down16,
}

impl CounterStep {
    /// Quarter of the potentiometer travel → step.
    pub fn from_position(normalized: f32) -> Self {
        if normalized >= 0.75 {
            Self::Up16
        } else if normalized >= 0.5 {
            Self::Up1
        } else if normalized >= 0.25 {
            Self::Down1
        } else {
            Self::Down16
        }
    }

    pub const fn delta(self) -> i8 {
        match self {
            Self::Up16 => 16,
            Self::Up1 => 1,
            Self::Down1 => -1,
            Self::Down16 => -16,
        }
    }
}

/// 8-bit counter driven by the action button, wrapping in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonCounter(u8);

impl ButtonCounter {
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub fn step(&mut self, step: CounterStep) {
        self.0 = self.0.wrapping_add_signed(step.delta());
    }
}

/// Last temperatures read and which one is on display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureSample {
    pub cpu: f32,
    pub board: f32,
    pub show_board_not_cpu: bool,
}

impl TemperatureSample {
    pub const fn new() -> Self {
        Self {
            cpu: 0.0,
            board: 0.0,
            show_board_not_cpu: true,
        }
    }

    /// The temperature selected for display.
    pub fn selected(&self) -> f32 {
        if self.show_board_not_cpu {
            self.board
        } else {
            self.cpu
        }
    }
}

impl Default for TemperatureSample {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the active [`DisplayMode`] and dispatches button actions and
/// rendering for it.
#[derive(Debug, Default)]
pub struct ModeController {
    mode: DisplayMode,
}

impl ModeController {
    pub const fn new() -> Self {
        Self {
            mode: DisplayMode::PotBar,
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn indicators(&self) -> IndicatorPattern {
        IndicatorPattern::for_mode(self.mode)
    }

    /// Back to the first mode.
    pub fn reset(&mut self) {
        self.mode = DisplayMode::PotBar;
    }

    /// Advance to the next mode and return the indicator pattern to drive.
    pub fn cycle(&mut self) -> IndicatorPattern {
        self.mode = self.mode.next();
        info!("mode: {} {}", self.mode.index(), self.mode.label());
        self.indicators()
    }

    /// Apply the action button's meaning in the current mode.
    pub fn on_action(&self, ctx: &mut AppContext) {
        match self.mode {
            DisplayMode::ButtonCounter => {
                let step = CounterStep::from_position(ctx.pot.normalized());
                ctx.counter.step(step);
                debug!("counter {:?} -> 0x{:02x}", step, ctx.counter.value());
            }
            DisplayMode::Temperature => {
                ctx.temperature.show_board_not_cpu = !ctx.temperature.show_board_not_cpu;
                info!(
                    "showing {} temperature",
                    if ctx.temperature.show_board_not_cpu {
                        "board"
                    } else {
                        "CPU"
                    }
                );
            }
            DisplayMode::PotBar | DisplayMode::PotRaw => {}
        }
    }

    /// LED-bar pattern for the current mode.
    pub fn render(&self, ctx: &AppContext) -> u8 {
        match self.mode {
            DisplayMode::PotBar => encoder::pot_bar(ctx.pot.normalized()),
            DisplayMode::PotRaw => encoder::pot_raw(ctx.pot.raw()),
            DisplayMode::ButtonCounter => encoder::counter(ctx.counter.value()),
            DisplayMode::Temperature => encoder::temperature(ctx.temperature.selected()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::AnalogReading;

    fn context_with_pot(normalized: f32) -> AppContext {
        AppContext {
            pot: AnalogReading::new((normalized * 1023.0) as u16),
            ..AppContext::default()
        }
    }

    fn controller_in(mode: DisplayMode) -> ModeController {
        let mut controller = ModeController::new();
        while controller.mode() != mode {
            controller.cycle();
        }
        controller
    }

    #[test]
    fn test_four_edges_return_to_first_mode() {
        let mut controller = ModeController::new();
        assert_eq!(controller.mode(), DisplayMode::PotBar);
        assert_eq!(controller.indicators(), IndicatorPattern::OFF);

        for step in 1..=4u8 {
            let pattern = controller.cycle();
            assert_eq!(controller.mode().index(), step % 4);
            assert_eq!(pattern.bits(), controller.mode().index());
        }

        assert_eq!(controller.mode(), DisplayMode::PotBar);
    }

    #[test]
    fn test_indicator_pattern_per_mode() {
        assert_eq!(
            IndicatorPattern::for_mode(DisplayMode::PotRaw),
            IndicatorPattern {
                led0: true,
                led1: false
            }
        );
        assert_eq!(
            IndicatorPattern::for_mode(DisplayMode::ButtonCounter),
            IndicatorPattern {
                led0: false,
                led1: true
            }
        );
        assert_eq!(IndicatorPattern::for_mode(DisplayMode::Temperature).bits(), 3);
    }

    #[test]
    fn test_counter_steps_by_pot_quarter() {
        assert_eq!(CounterStep::from_position(1.0), CounterStep::Up16);
        assert_eq!(CounterStep::from_position(0.75), CounterStep::Up16);
        assert_eq!(CounterStep::from_position(0.6), CounterStep::Up1);
        assert_eq!(CounterStep::from_position(0.5), CounterStep::Up1);
        assert_eq!(CounterStep::from_position(0.3), CounterStep::Down1);
        assert_eq!(CounterStep::from_position(0.25), CounterStep::Down1);
        assert_eq!(CounterStep::from_position(0.1), CounterStep::Down16);
        assert_eq!(CounterStep::from_position(0.0), CounterStep::Down16);
    }

    #[test]
    fn test_counter_wraps_instead_of_saturating() {
        let mut counter = ButtonCounter::new(0xFF);
        counter.step(CounterStep::Up16);
        assert_eq!(counter.value(), 0x0F);

        let mut counter = ButtonCounter::new(0x05);
        counter.step(CounterStep::Down16);
        assert_eq!(counter.value(), 0xF5);

        let mut counter = ButtonCounter::new(0x00);
        counter.step(CounterStep::Down1);
        assert_eq!(counter.value(), 0xFF);
    }

    #[test]
    fn test_action_in_counter_mode() {
        let controller = controller_in(DisplayMode::ButtonCounter);
        let mut ctx = context_with_pot(0.6);
        ctx.counter = ButtonCounter::new(10);

        controller.on_action(&mut ctx);

        assert_eq!(ctx.counter.value(), 11);
        assert_eq!(controller.render(&ctx), 11);
    }

    #[test]
    fn test_action_in_temperature_mode_toggles_source() {
        let controller = controller_in(DisplayMode::Temperature);
        let mut ctx = AppContext::default();
        ctx.temperature.cpu = 50.0;
        ctx.temperature.board = 22.0;

        assert_eq!(controller.render(&ctx), 44);
        controller.on_action(&mut ctx);
        assert!(!ctx.temperature.show_board_not_cpu);
        assert_eq!(controller.render(&ctx), 100);
        controller.on_action(&mut ctx);
        assert_eq!(controller.render(&ctx), 44);
    }

    #[test]
    fn test_action_ignored_in_pot_modes() {
        for mode in [DisplayMode::PotBar, DisplayMode::PotRaw] {
            let controller = controller_in(mode);
            let mut ctx = context_with_pot(0.9);
            let before = ctx;

            controller.on_action(&mut ctx);

            assert_eq!(ctx, before);
        }
    }

    #[test]
    fn test_render_pot_modes() {
        let ctx = AppContext {
            pot: AnalogReading::new(1023),
            ..AppContext::default()
        };

        assert_eq!(controller_in(DisplayMode::PotBar).render(&ctx), 0xFF);
        assert_eq!(controller_in(DisplayMode::PotRaw).render(&ctx), 0xFF);

        let ctx = AppContext {
            pot: AnalogReading::new(300),
            ..AppContext::default()
        };
        assert_eq!(controller_in(DisplayMode::PotRaw).render(&ctx), 75);
    }

    #[test]
    fn test_from_index_wraps() {
        assert_eq!(DisplayMode::from_index(4), DisplayMode::PotBar);
        assert_eq!(DisplayMode::Temperature.next(), DisplayMode::PotBar);
    }
}
