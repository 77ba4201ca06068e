//! Blocking `embedded-hal` drivers for the board and the [`HardwarePort`]
//! that ties them to the loop

mod led_bar;
mod mcp3004;
mod tmp1075;

pub use led_bar::LedBar;
pub use mcp3004::Mcp3004;
pub use tmp1075::Tmp1075;

use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal::i2c::I2c;
use embedded_hal::spi::SpiDevice;
use log::{error, info};

use crate::error::PeripheralError;
use crate::modes::IndicatorPattern;
use crate::port::{AnalogReading, PeripheralPort};

/// Source of the SoC temperature.
///
/// On Linux hosts this is typically backed by the kernel's thermal zone; the
/// core library only needs a reading in °C.
pub trait TemperatureSource {
    fn read_celsius(&mut self) -> Result<f32, PeripheralError>;
}

impl<F> TemperatureSource for F
where
    F: FnMut() -> Result<f32, PeripheralError>,
{
    fn read_celsius(&mut self) -> Result<f32, PeripheralError> {
        self()
    }
}

/// [`PeripheralPort`] over the real board peripherals.
pub struct HardwarePort<ADC, BAR, I2C, L0, L1, CPU> {
    adc: Mcp3004<ADC>,
    bar: LedBar<BAR>,
    /// `None` if the sensor did not come up.
    board: Option<Tmp1075<I2C>>,
    led0: L0,
    led1: L1,
    cpu: CPU,
}

impl<ADC, BAR, I2C, L0, L1, CPU> HardwarePort<ADC, BAR, I2C, L0, L1, CPU>
where
    ADC: SpiDevice,
    BAR: SpiDevice,
    I2C: I2c,
    L0: OutputPin,
    L1: OutputPin,
    CPU: TemperatureSource,
{
    /// Initialize the board sensor and assemble the port.
    ///
    /// A board sensor that fails to initialize is logged and left out; its
    /// reads then report [`PeripheralError::Unavailable`] without touching
    /// the bus.
    pub fn new(
        adc: Mcp3004<ADC>,
        bar: LedBar<BAR>,
        mut board: Tmp1075<I2C>,
        led0: L0,
        led1: L1,
        cpu: CPU,
    ) -> Self {
        let board = match board.init() {
            Ok(()) => Some(board),
            Err(e) => {
                error!("{}, board temperature disabled", e);
                None
            }
        };

        info!(
            "hardware port ready (board temperature {})",
            if board.is_some() { "on" } else { "off" }
        );

        Self {
            adc,
            bar,
            board,
            led0,
            led1,
            cpu,
        }
    }

    pub fn board_sensor_available(&self) -> bool {
        self.board.is_some()
    }
}

impl<ADC, BAR, I2C, L0, L1, CPU> PeripheralPort for HardwarePort<ADC, BAR, I2C, L0, L1, CPU>
where
    ADC: SpiDevice,
    BAR: SpiDevice,
    I2C: I2c,
    L0: OutputPin,
    L1: OutputPin,
    CPU: TemperatureSource,
{
    fn read_channel(&mut self, channel: u8) -> Result<AnalogReading, PeripheralError> {
        self.adc.read(channel)
    }

    fn write_display(&mut self, value: u8) -> Result<(), PeripheralError> {
        self.bar.write(value)
    }

    fn write_indicators(&mut self, pattern: IndicatorPattern) -> Result<(), PeripheralError> {
        let led0 = self.led0.set_state(PinState::from(pattern.led0));
        let led1 = self.led1.set_state(PinState::from(pattern.led1));

        led0.map_err(|_| PeripheralError::Bus {
            device: "LED0",
            operation: "set state",
        })?;
        led1.map_err(|_| PeripheralError::Bus {
            device: "LED1",
            operation: "set state",
        })
    }

    fn read_cpu_temperature(&mut self) -> Result<f32, PeripheralError> {
        self.cpu.read_celsius()
    }

    fn read_board_temperature(&mut self) -> Result<f32, PeripheralError> {
        match self.board.as_mut() {
            Some(sensor) => sensor.read_celsius(),
            None => Err(PeripheralError::Unavailable { device: "TMP1075" }),
        }
    }
}
