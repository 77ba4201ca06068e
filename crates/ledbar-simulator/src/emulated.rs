//! Emulated board peripherals.
//!
//! Every part shares one [`BoardState`]: the controls the user moves from
//! stdin and the outputs the loop drives. The SPI side mirrors the real
//! wiring, with one bus and two chip selects, so the core drivers run
//! unmodified on top of `embedded-hal-bus` devices.

use std::cell::Cell;
use std::convert::Infallible;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use embedded_hal::digital::{ErrorType as PinErrorType, InputPin, OutputPin};
use embedded_hal::i2c::{self, I2c, Operation as I2cOperation};
use embedded_hal::spi::{ErrorType as SpiErrorType, SpiBus};
use log::{debug, info, warn};

use ledbar_core::PeripheralError;
use ledbar_core::drivers::TemperatureSource;

/// Controls and outputs of the emulated board.
pub struct BoardState {
    /// Potentiometer, raw 10-bit.
    pub pot: Cell<u16>,
    pub board_celsius: Cell<f32>,
    pub mode_button: Cell<bool>,
    pub action_button: Cell<bool>,
    leds: [Cell<bool>; 2],
    adc_selected: Cell<bool>,
    latch_low: Cell<bool>,
    shift_register: Cell<u8>,
    bar: Cell<u8>,
}

impl BoardState {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            pot: Cell::new(512),
            board_celsius: Cell::new(23.5),
            mode_button: Cell::new(false),
            action_button: Cell::new(false),
            leds: [Cell::new(false), Cell::new(false)],
            adc_selected: Cell::new(false),
            latch_low: Cell::new(false),
            shift_register: Cell::new(0),
            bar: Cell::new(0),
        })
    }

    /// Pattern currently latched onto the LED bar.
    pub fn bar(&self) -> u8 {
        self.bar.get()
    }
}

/// `#` for a lit segment, `.` for a dark one, first segment leftmost.
pub fn render_bar(pattern: u8) -> String {
    (0..8)
        .map(|bit| if pattern & (1 << bit) != 0 { '#' } else { '.' })
        .collect()
}

// ---------------------------------------------------------------------------
// SPI: MCP3004 and 74HC595 on one bus
// ---------------------------------------------------------------------------

/// Shared SPI bus. Frames are routed to whichever device is selected.
pub struct EmulatedSpiBus {
    board: Rc<BoardState>,
}

impl EmulatedSpiBus {
    pub fn new(board: Rc<BoardState>) -> Self {
        Self { board }
    }

    fn convert(&self, channel: u8) -> u16 {
        if channel == 0 {
            self.board.pot.get().min(1023)
        } else {
            0
        }
    }

    fn shift_in(&self, words: &[u8]) {
        if let Some(&last) = words.last() {
            self.board.shift_register.set(last);
        }
    }
}

impl SpiErrorType for EmulatedSpiBus {
    type Error = Infallible;
}

impl SpiBus<u8> for EmulatedSpiBus {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        if self.board.latch_low.get() {
            self.shift_in(words);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let len = read.len().min(write.len());
        read[..len].copy_from_slice(&write[..len]);
        read[len..].fill(0);
        self.transfer_in_place(read)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        if self.board.latch_low.get() {
            self.shift_in(words);
        }

        if self.board.adc_selected.get() && words.len() >= 3 && words[0] & 0x01 != 0 {
            let value = self.convert((words[1] >> 4) & 0x03);
            words[0] = 0xFF;
            words[1] = 0xF8 | ((value >> 8) as u8 & 0x03);
            words[2] = value as u8;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Active-low ADC chip select.
pub struct AdcChipSelect {
    board: Rc<BoardState>,
}

impl AdcChipSelect {
    pub fn new(board: Rc<BoardState>) -> Self {
        Self { board }
    }
}

impl PinErrorType for AdcChipSelect {
    type Error = Infallible;
}

impl OutputPin for AdcChipSelect {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.board.adc_selected.set(true);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.board.adc_selected.set(false);
        Ok(())
    }
}

/// 74HC595 storage-register clock, used as the LED bar's chip select.
pub struct ShiftRegisterLatch {
    board: Rc<BoardState>,
}

impl ShiftRegisterLatch {
    pub fn new(board: Rc<BoardState>) -> Self {
        Self { board }
    }
}

impl PinErrorType for ShiftRegisterLatch {
    type Error = Infallible;
}

impl OutputPin for ShiftRegisterLatch {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.board.latch_low.set(true);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let rising = self.board.latch_low.replace(false);
        if rising {
            let pattern = self.board.shift_register.get();
            if self.board.bar.replace(pattern) != pattern {
                info!("LED bar [{}] 0x{:02x}", render_bar(pattern), pattern);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GPIO
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub enum Button {
    Mode,
    Action,
}

pub struct EmulatedButton {
    board: Rc<BoardState>,
    button: Button,
}

impl EmulatedButton {
    pub fn new(board: Rc<BoardState>, button: Button) -> Self {
        Self { board, button }
    }

    fn pressed(&self) -> bool {
        match self.button {
            Button::Mode => self.board.mode_button.get(),
            Button::Action => self.board.action_button.get(),
        }
    }
}

impl PinErrorType for EmulatedButton {
    type Error = Infallible;
}

impl InputPin for EmulatedButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pressed())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.pressed())
    }
}

/// One of the two mode indicator LEDs.
pub struct IndicatorLed {
    board: Rc<BoardState>,
    index: usize,
}

impl IndicatorLed {
    pub fn new(board: Rc<BoardState>, index: usize) -> Self {
        Self { board, index }
    }

    fn set(&self, on: bool) {
        if self.board.leds[self.index].replace(on) != on {
            debug!("LED{} {}", self.index, if on { "on" } else { "off" });
        }
    }
}

impl PinErrorType for IndicatorLed {
    type Error = Infallible;
}

impl OutputPin for IndicatorLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// I2C: TMP1075
// ---------------------------------------------------------------------------

/// TMP1075 register file backed by the board temperature.
pub struct EmulatedTmp1075 {
    board: Rc<BoardState>,
    address: u8,
    pointer: u8,
    config: u16,
}

impl EmulatedTmp1075 {
    pub fn new(board: Rc<BoardState>, address: u8) -> Self {
        Self {
            board,
            address,
            pointer: 0,
            config: 0x00FF,
        }
    }

    /// Register contents for the current pointer.
    fn register(&self) -> u16 {
        match self.pointer {
            0x00 => encode_temperature(self.board.board_celsius.get()),
            0x01 => self.config,
            0x0F => 0x7500,
            _ => 0,
        }
    }
}

/// 12-bit left-justified two's complement, 0.0625 °C per LSB.
fn encode_temperature(celsius: f32) -> u16 {
    let counts = (celsius * 16.0).round() as i16;
    (counts << 4) as u16
}

impl i2c::ErrorType for EmulatedTmp1075 {
    type Error = i2c::ErrorKind;
}

impl I2c for EmulatedTmp1075 {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [I2cOperation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(i2c::ErrorKind::NoAcknowledge(
                i2c::NoAcknowledgeSource::Address,
            ));
        }

        for op in operations.iter_mut() {
            match op {
                I2cOperation::Write(bytes) => {
                    if let Some((&pointer, data)) = bytes.split_first() {
                        self.pointer = pointer;
                        if pointer == 0x01 && !data.is_empty() {
                            self.config = (data[0] as u16) << 8
                                | data.get(1).copied().unwrap_or(0) as u16;
                            debug!("TMP1075 config 0x{:04x}", self.config);
                        }
                    }
                }
                I2cOperation::Read(buf) => {
                    let value = self.register().to_be_bytes();
                    for (dst, src) in buf.iter_mut().zip(value.iter().cycle()) {
                        *dst = *src;
                    }
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CPU temperature
// ---------------------------------------------------------------------------

/// Default Linux thermal zone of the SoC.
pub const CPU_THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Reads the host CPU temperature from sysfs and falls back to a slowly
/// varying synthetic value when the file is not there.
pub struct CpuTemperature {
    path: PathBuf,
    started: Instant,
    sysfs_ok: bool,
}

impl CpuTemperature {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let sysfs_ok = fs::metadata(&path).is_ok();
        if !sysfs_ok {
            warn!(
                "{} not readable, using synthetic CPU temperature",
                path.display()
            );
        }

        Self {
            path,
            started: Instant::now(),
            sysfs_ok,
        }
    }

    fn read_sysfs(&self) -> Option<f32> {
        let text = fs::read_to_string(&self.path).ok()?;
        let millidegrees: i32 = text.trim().parse().ok()?;
        Some(millidegrees as f32 / 1000.0)
    }

    /// 45–55 °C with slow drift.
    fn synthetic(&self) -> f32 {
        let t = self.started.elapsed().as_secs_f32();
        50.0 + 4.0 * (t / 20.0).sin() + 1.0 * (t / 7.0).cos()
    }
}

impl TemperatureSource for CpuTemperature {
    fn read_celsius(&mut self) -> Result<f32, PeripheralError> {
        if self.sysfs_ok {
            match self.read_sysfs() {
                Some(celsius) => return Ok(celsius),
                None => {
                    warn!("{} read failed, switching to synthetic", self.path.display());
                    self.sysfs_ok = false;
                }
            }
        }
        Ok(self.synthetic())
    }
}
