//! Desktop simulator for the ledbar control loop.
//!
//! Runs the `ledbar-core` polling loop on the host against emulated
//! peripherals: the real MCP3004, 74HC595 and TMP1075 drivers talk to
//! in-memory register models through `embedded-hal-bus` devices. The CPU
//! temperature comes from the host's thermal zone when there is one.
//!
//! # Commands (one per line on stdin)
//!
//! | Command   | Action                                   |
//! |-----------|------------------------------------------|
//! | `m`       | Tap the mode button                      |
//! | `a`       | Tap the action button                    |
//! | `h`       | Hold the mode button (long-press exit)   |
//! | `p <0-1>` | Set the potentiometer                    |
//! | `t <°C>`  | Set the board temperature                |
//! | `q`       | Quit                                     |
//!
//! LED-bar changes are logged at `info` level; set `RUST_LOG=debug` to see
//! edges and indicator LEDs as well. `LEDBAR_CONFIG` may name a file holding
//! a postcard-encoded `LoopConfig`.

mod emulated;

use std::cell::{Cell, RefCell};
use std::io::BufRead;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::{env, fs, process, thread};

use embassy_time::Delay;
use embedded_hal_bus::spi::RefCellDevice;
use log::{error, info, warn};

use ledbar_core::config::{
    ADC_MAX_CLOCK_HZ, GPIO_ADC_NCS, GPIO_BTN0, GPIO_BTN1, GPIO_LED0, GPIO_LED1, GPIO_SR_LATCH,
    LED_BAR_MAX_CLOCK_HZ, TMP1075_ADDRESS,
};
use ledbar_core::drivers::{HardwarePort, LedBar, Mcp3004, Tmp1075};
use ledbar_core::{AppLoop, DebouncedButton, LoopConfig, Polarity};

use emulated::{
    AdcChipSelect, BoardState, Button, CPU_THERMAL_ZONE, CpuTemperature, EmulatedButton,
    EmulatedSpiBus, EmulatedTmp1075, IndicatorLed, ShiftRegisterLatch,
};

/// Loop iterations a tapped button stays pressed.
const TAP_ITERATIONS: u32 = 4;

/// Loop iterations the `h` command holds the mode button.
const HOLD_ITERATIONS: u32 = 300;

const CONFIG_ENV: &str = "LEDBAR_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    TapMode,
    TapAction,
    HoldMode,
    Pot(f32),
    BoardTemperature(f32),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let command = match parts.next()? {
        "m" => Command::TapMode,
        "a" => Command::TapAction,
        "h" => Command::HoldMode,
        "q" => Command::Quit,
        "p" => {
            let value: f32 = parts.next()?.parse().ok()?;
            if !(0.0..=1.0).contains(&value) {
                return None;
            }
            Command::Pot(value)
        }
        "t" => Command::BoardTemperature(parts.next()?.parse().ok()?),
        _ => return None,
    };
    Some(command)
}

/// Forward parsed stdin lines to the loop thread.
fn spawn_command_reader() -> Receiver<Command> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }

            match parse_command(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None => warn!("unknown command: {:?}", line.trim()),
            }
        }
    });

    rx
}

/// Turns commands into button presses that span several loop iterations.
struct Controls {
    board: Rc<BoardState>,
    commands: Receiver<Command>,
    mode_release_in: Option<u32>,
    action_release_in: Option<u32>,
    stdin_open: bool,
}

impl Controls {
    fn new(board: Rc<BoardState>, commands: Receiver<Command>) -> Self {
        Self {
            board,
            commands,
            mode_release_in: None,
            action_release_in: None,
            stdin_open: true,
        }
    }

    /// Apply pending commands. Returns false once the user asked to quit.
    fn poll(&mut self) -> bool {
        release_after(&mut self.mode_release_in, &self.board.mode_button);
        release_after(&mut self.action_release_in, &self.board.action_button);

        while self.stdin_open {
            let command = match self.commands.try_recv() {
                Ok(command) => command,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("stdin closed, running until long press or Ctrl-C");
                    self.stdin_open = false;
                    break;
                }
            };

            match command {
                Command::TapMode => press(
                    &mut self.mode_release_in,
                    &self.board.mode_button,
                    TAP_ITERATIONS,
                ),
                Command::HoldMode => press(
                    &mut self.mode_release_in,
                    &self.board.mode_button,
                    HOLD_ITERATIONS,
                ),
                Command::TapAction => press(
                    &mut self.action_release_in,
                    &self.board.action_button,
                    TAP_ITERATIONS,
                ),
                Command::Pot(value) => {
                    let raw = (value * 1023.0).round() as u16;
                    self.board.pot.set(raw);
                    info!("potentiometer {:.2} (raw {})", value, raw);
                }
                Command::BoardTemperature(celsius) => {
                    self.board.board_celsius.set(celsius);
                    info!("board temperature {:.2} °C", celsius);
                }
                Command::Quit => return false,
            }
        }

        true
    }
}

fn press(release_in: &mut Option<u32>, button: &Cell<bool>, iterations: u32) {
    button.set(true);
    *release_in = Some(iterations);
}

fn release_after(release_in: &mut Option<u32>, button: &Cell<bool>) {
    if let Some(remaining) = release_in {
        if *remaining == 0 {
            button.set(false);
            *release_in = None;
        } else {
            *remaining -= 1;
        }
    }
}

fn load_config() -> LoopConfig {
    let Ok(path) = env::var(CONFIG_ENV) else {
        return LoopConfig::default();
    };

    match fs::read(&path) {
        Ok(bytes) => match LoopConfig::from_bytes(&bytes) {
            Ok(config) => {
                info!("loaded config from {}: {:?}", path, config);
                config
            }
            Err(e) => {
                warn!("{}: {}, using defaults", path, e);
                LoopConfig::default()
            }
        },
        Err(e) => {
            warn!("{}: {}, using defaults", path, e);
            LoopConfig::default()
        }
    }
}

fn main() {
    env_logger::init();
    info!("Starting ledbar simulator");
    info!("Commands: m=mode  a=action  h=hold mode  p <0-1>=pot  t <°C>=board temp  q=quit");

    let config = load_config();
    let board = BoardState::new();

    // One SPI bus, two chip selects.
    let spi_bus = RefCell::new(EmulatedSpiBus::new(board.clone()));
    let adc_spi = match RefCellDevice::new_no_delay(&spi_bus, AdcChipSelect::new(board.clone())) {
        Ok(device) => device,
        Err(e) => match e {},
    };
    let bar_spi =
        match RefCellDevice::new_no_delay(&spi_bus, ShiftRegisterLatch::new(board.clone())) {
            Ok(device) => device,
            Err(e) => match e {},
        };

    let port = HardwarePort::new(
        Mcp3004::new(adc_spi),
        LedBar::new(bar_spi),
        Tmp1075::new(EmulatedTmp1075::new(board.clone(), TMP1075_ADDRESS)),
        IndicatorLed::new(board.clone(), 0),
        IndicatorLed::new(board.clone(), 1),
        CpuTemperature::new(CPU_THERMAL_ZONE),
    );

    let mode_button = DebouncedButton::new(
        "BTN0",
        EmulatedButton::new(board.clone(), Button::Mode),
        Polarity::ActiveHigh,
    );
    let action_button = DebouncedButton::new(
        "BTN1",
        EmulatedButton::new(board.clone(), Button::Action),
        Polarity::ActiveHigh,
    );
    let (mode_button, action_button) = match (mode_button, action_button) {
        (Ok(mode), Ok(action)) => (mode, action),
        (Err(e), _) | (_, Err(e)) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    info!(
        "emulating: buttons GPIO{}/GPIO{}, indicators GPIO{}/GPIO{}, \
         ADC nCS GPIO{} (<= {} Hz), LED bar latch GPIO{} (<= {} Hz), TMP1075 at 0x{:02x}",
        GPIO_BTN0,
        GPIO_BTN1,
        GPIO_LED0,
        GPIO_LED1,
        GPIO_ADC_NCS,
        ADC_MAX_CLOCK_HZ,
        GPIO_SR_LATCH,
        LED_BAR_MAX_CLOCK_HZ,
        TMP1075_ADDRESS
    );

    let mut app = AppLoop::new(port, mode_button, action_button, config);
    let mut controls = Controls::new(board.clone(), spawn_command_reader());

    app.run(&mut Delay, || controls.poll());

    info!(
        "simulator stopped in state {:?}, LED bar 0x{:02x}",
        app.state(),
        board.bar()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("m"), Some(Command::TapMode));
        assert_eq!(parse_command(" a "), Some(Command::TapAction));
        assert_eq!(parse_command("h"), Some(Command::HoldMode));
        assert_eq!(parse_command("q"), Some(Command::Quit));
        assert_eq!(parse_command("p 0.6"), Some(Command::Pot(0.6)));
        assert_eq!(parse_command("t -3.5"), Some(Command::BoardTemperature(-3.5)));
    }

    #[test]
    fn test_reject_bad_commands() {
        assert_eq!(parse_command("x"), None);
        assert_eq!(parse_command("p"), None);
        assert_eq!(parse_command("p 1.5"), None);
        assert_eq!(parse_command("t warm"), None);
    }

    #[test]
    fn test_tap_releases_after_iterations() {
        let board = BoardState::new();
        let (tx, rx) = mpsc::channel();
        let mut controls = Controls::new(board.clone(), rx);

        tx.send(Command::TapAction).unwrap();
        assert!(controls.poll());
        assert!(board.action_button.get());

        for _ in 0..TAP_ITERATIONS {
            assert!(controls.poll());
            assert!(board.action_button.get());
        }
        controls.poll();
        assert!(!board.action_button.get());

        tx.send(Command::Quit).unwrap();
        assert!(!controls.poll());
    }
}
