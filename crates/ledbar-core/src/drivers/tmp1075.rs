use embedded_hal::i2c::I2c;
use log::{debug, info};

use crate::config::TMP1075_ADDRESS;
use crate::error::PeripheralError;

const REG_TEMPERATURE: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;
const REG_DEVICE_ID: u8 = 0x0F;

const DEVICE_ID_MASK: u16 = 0xFF00;
const DEVICE_ID: u16 = 0x7500;

/// Continuous conversion, 220 ms conversion rate.
const CONFIG_CONTINUOUS_220MS: u8 = 0x60;

/// TMP1075 digital temperature sensor on I2C.
pub struct Tmp1075<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Tmp1075<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, TMP1075_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Check the device ID and start continuous conversion.
    pub fn init(&mut self) -> Result<(), PeripheralError> {
        let id = self.read_register(REG_DEVICE_ID, "read device ID")?;
        if id & DEVICE_ID_MASK != DEVICE_ID {
            return Err(PeripheralError::UnexpectedDeviceId {
                device: "TMP1075",
                id,
            });
        }

        self.i2c
            .write(self.address, &[REG_CONFIG, CONFIG_CONTINUOUS_220MS])
            .map_err(|e| bus_error(e, "write config"))?;

        info!("TMP1075 at 0x{:02x} initialized (ID 0x{:04x})", self.address, id);
        Ok(())
    }

    /// Latest conversion result in °C.
    pub fn read_celsius(&mut self) -> Result<f32, PeripheralError> {
        let raw = self.read_register(REG_TEMPERATURE, "read temperature")? as i16;
        Ok(raw as f32 / 256.0)
    }

    fn read_register(&mut self, register: u8, operation: &'static str) -> Result<u16, PeripheralError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(|e| bus_error(e, operation))?;
        Ok(u16::from_be_bytes(buf))
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

fn bus_error<E: core::fmt::Debug>(e: E, operation: &'static str) -> PeripheralError {
    debug!("TMP1075 {} failed: {:?}", operation, e);
    PeripheralError::Bus {
        device: "TMP1075",
        operation,
    }
}
