//! The polling loop
//!
//! [`AppLoop`] owns every piece of mutable state: the two buttons, the mode
//! controller, the [`AppContext`] and the peripheral port. Each call to
//! [`AppLoop::tick`] samples both buttons exactly once, dispatches their
//! edges and then runs one step of the [`AppState`] machine.
//!
//! ```text
//! Init ──► Idle ──(interval elapsed / forced)──► Sample ──► Idle
//!            │
//!            └──(mode button held)──► Exit
//! ```

use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use log::{debug, error, info, trace, warn};

use crate::button::DebouncedButton;
use crate::config::{LoopConfig, POT_CHANNEL};
use crate::error::PeripheralError;
use crate::modes::{ButtonCounter, DisplayMode, IndicatorPattern, ModeController, TemperatureSample};
use crate::port::{AnalogReading, PeripheralPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Init,
    Idle,
    Sample,
    Exit,
    /// Unreachable through normal transitions. Reported, never acted on.
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    Running,
    Finished,
}

/// Values shared between sampling, button actions and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AppContext {
    /// Last good potentiometer reading.
    pub pot: AnalogReading,
    pub counter: ButtonCounter,
    pub temperature: TemperatureSample,
}

pub struct AppLoop<P, B0, B1> {
    port: P,
    mode_button: DebouncedButton<B0>,
    action_button: DebouncedButton<B1>,
    modes: ModeController,
    ctx: AppContext,
    state: AppState,
    config: LoopConfig,
    /// `None` forces a refresh on the next idle tick.
    last_sample: Option<Instant>,
    mode_pressed_at: Option<Instant>,
    last_invalid_report: Option<Instant>,
    last_display: Option<u8>,
}

impl<P, B0, B1> AppLoop<P, B0, B1>
where
    P: PeripheralPort,
    B0: InputPin,
    B1: InputPin,
{
    /// `mode_button` steps through the display modes, `action_button` has a
    /// mode-specific meaning.
    pub fn new(
        port: P,
        mode_button: DebouncedButton<B0>,
        action_button: DebouncedButton<B1>,
        config: LoopConfig,
    ) -> Self {
        Self {
            port,
            mode_button,
            action_button,
            modes: ModeController::new(),
            ctx: AppContext::default(),
            state: AppState::Init,
            config,
            last_sample: None,
            mode_pressed_at: None,
            last_invalid_report: None,
            last_display: None,
        }
    }

    /// Run one loop iteration at time `now`.
    pub fn tick(&mut self, now: Instant) -> LoopStatus {
        self.mode_button.update();
        self.action_button.update();

        if self.state != AppState::Exit {
            self.handle_buttons(now);
        }

        match self.state {
            AppState::Init => {
                self.ctx = AppContext::default();
                self.modes.reset();
                self.last_sample = None;
                self.mode_pressed_at = None;
                self.last_display = None;
                self.set_indicators(IndicatorPattern::OFF);
                info!(
                    "mode: {} {}",
                    self.modes.mode().index(),
                    self.modes.mode().label()
                );
                self.state = AppState::Idle;
            }
            AppState::Idle => {
                if self.sample_due(now) {
                    self.last_sample = Some(now);
                    self.state = AppState::Sample;
                }
            }
            AppState::Sample => {
                self.sample();
                self.refresh_display();
                self.state = AppState::Idle;
            }
            AppState::Exit => return LoopStatus::Finished,
            AppState::Invalid => self.report_invalid_state(now),
        }

        LoopStatus::Running
    }

    /// Tick until the loop finishes or `keep_running` returns false, sleeping
    /// the configured idle time between iterations.
    pub fn run<D: DelayNs>(&mut self, delay: &mut D, mut keep_running: impl FnMut() -> bool) {
        while keep_running() {
            if self.tick(Instant::now()) == LoopStatus::Finished {
                break;
            }
            delay.delay_ms(self.config.loop_sleep_ms);
        }
    }

    fn handle_buttons(&mut self, now: Instant) {
        if self.mode_button.rose() {
            self.mode_pressed_at = Some(now);
            let pattern = self.modes.cycle();
            self.set_indicators(pattern);
            self.last_sample = None;
        }

        // Hold time counts from the first tick the button is seen pressed,
        // including a button already held at start-up.
        if !self.mode_button.level() {
            self.mode_pressed_at = None;
        } else if self.mode_pressed_at.is_none() {
            self.mode_pressed_at = Some(now);
        }

        if self.action_button.rose() {
            self.modes.on_action(&mut self.ctx);
            self.last_sample = None;
        }

        if let Some(pressed_at) = self.mode_pressed_at
            && self.config.long_press_exit
            && now.saturating_duration_since(pressed_at) >= self.config.long_press()
        {
            info!("long press");
            self.mode_pressed_at = None;
            self.exit();
        }
    }

    /// Blank the bar and stop. Exit is terminal.
    fn exit(&mut self) {
        self.write_display(0x00);
        self.state = AppState::Exit;
        info!("exit");
    }

    fn sample_due(&self, now: Instant) -> bool {
        self.last_sample
            .is_none_or(|at| now.saturating_duration_since(at) >= self.config.sample_interval())
    }

    fn sample(&mut self) {
        match self.port.read_channel(POT_CHANNEL) {
            Ok(reading) => self.ctx.pot = reading,
            Err(e) => report_failure(e),
        }

        match self.port.read_cpu_temperature() {
            Ok(celsius) => self.ctx.temperature.cpu = celsius,
            Err(e) => report_failure(e),
        }

        match self.port.read_board_temperature() {
            Ok(celsius) => self.ctx.temperature.board = celsius,
            Err(e) => report_failure(e),
        }

        trace!(
            "sample: pot {} cpu {} board {}",
            self.ctx.pot.raw(),
            self.ctx.temperature.cpu,
            self.ctx.temperature.board
        );
    }

    fn refresh_display(&mut self) {
        let pattern = self.modes.render(&self.ctx);
        if self.last_display != Some(pattern) {
            debug!("display: 0x{:02x}", pattern);
        }
        self.write_display(pattern);
    }

    fn write_display(&mut self, pattern: u8) {
        match self.port.write_display(pattern) {
            Ok(()) => self.last_display = Some(pattern),
            Err(e) => report_failure(e),
        }
    }

    fn set_indicators(&mut self, pattern: IndicatorPattern) {
        if let Err(e) = self.port.write_indicators(pattern) {
            report_failure(e);
        }
    }

    fn report_invalid_state(&mut self, now: Instant) {
        let interval: Duration = self.config.invalid_state_log_interval();
        let due = self
            .last_invalid_report
            .is_none_or(|at| now.saturating_duration_since(at) >= interval);

        if due {
            error!("invalid state");
            self.last_invalid_report = Some(now);
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn mode(&self) -> DisplayMode {
        self.modes.mode()
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Last pattern successfully written to the LED bar.
    pub fn display(&self) -> Option<u8> {
        self.last_display
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Give the port and button pins back.
    pub fn release(self) -> (P, B0, B1) {
        (
            self.port,
            self.mode_button.release(),
            self.action_button.release(),
        )
    }

    #[cfg(test)]
    fn force_state(&mut self, state: AppState) {
        self.state = state;
    }
}

fn report_failure(e: PeripheralError) {
    if e.is_unavailable() {
        trace!("{}", e);
    } else {
        warn!("{}", e);
    }
}
