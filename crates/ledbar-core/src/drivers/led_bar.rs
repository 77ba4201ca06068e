use embedded_hal::spi::SpiDevice;
use log::debug;

use crate::error::PeripheralError;

/// 8-segment LED bar behind a 74HC595 shift register.
///
/// The register's latch is wired as the SPI chip select: the byte is shifted
/// in while the latch is low and appears on the outputs on the rising edge at
/// the end of the transaction.
pub struct LedBar<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> LedBar<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Show `pattern`. Bit 0 drives the first segment.
    pub fn write(&mut self, pattern: u8) -> Result<(), PeripheralError> {
        self.spi.write(&[pattern]).map_err(|e| {
            debug!("LED bar write failed: {:?}", e);
            PeripheralError::Bus {
                device: "LED bar",
                operation: "write pattern",
            }
        })
    }

    pub fn clear(&mut self) -> Result<(), PeripheralError> {
        self.write(0x00)
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}
