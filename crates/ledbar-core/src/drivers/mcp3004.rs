use embedded_hal::spi::SpiDevice;
use log::debug;

use crate::error::PeripheralError;
use crate::port::AnalogReading;

/// MCP3004 4-channel 10-bit SAR ADC on SPI.
pub struct Mcp3004<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> Mcp3004<SPI> {
    pub const CHANNELS: u8 = 4;

    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Single-ended conversion on `channel`, raw 10-bit result.
    pub fn read_raw(&mut self, channel: u8) -> Result<u16, PeripheralError> {
        if channel >= Self::CHANNELS {
            return Err(PeripheralError::InvalidChannel(channel));
        }

        // Start bit, then SGL/DIFF=1 with the channel in D1..D0. The result
        // is clocked out in the low two bits of byte 1 and all of byte 2.
        let mut frame = [0x01, 0x80 | ((channel & 0x03) << 4), 0x00];
        self.spi.transfer_in_place(&mut frame).map_err(|e| {
            debug!("MCP3004 transfer failed: {:?}", e);
            PeripheralError::Bus {
                device: "MCP3004",
                operation: "read channel",
            }
        })?;

        Ok((((frame[1] & 0x03) as u16) << 8) | frame[2] as u16)
    }

    pub fn read(&mut self, channel: u8) -> Result<AnalogReading, PeripheralError> {
        self.read_raw(channel).map(AnalogReading::new)
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::spi::{ErrorKind, ErrorType, Operation};
    use std::vec::Vec;

    /// Answers conversion frames with fixed per-channel values.
    struct MockAdc {
        values: [u16; 4],
        frames: Vec<[u8; 3]>,
        fail: bool,
    }

    impl MockAdc {
        fn new(values: [u16; 4]) -> Self {
            Self {
                values,
                frames: Vec::new(),
                fail: false,
            }
        }
    }

    impl ErrorType for MockAdc {
        type Error = ErrorKind;
    }

    impl SpiDevice for MockAdc {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), ErrorKind> {
            if self.fail {
                return Err(ErrorKind::Other);
            }

            for op in operations.iter_mut() {
                if let Operation::TransferInPlace(buf) = op {
                    self.frames.push([buf[0], buf[1], buf[2]]);
                    let value = self.values[((buf[1] >> 4) & 0x03) as usize];
                    // Undefined bits ahead of the result read back high.
                    buf[0] = 0xFF;
                    buf[1] = 0xF8 | ((value >> 8) as u8 & 0x03);
                    buf[2] = value as u8;
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_command_frame_per_channel() {
        let mut adc = Mcp3004::new(MockAdc::new([0; 4]));
        for channel in 0..4 {
            adc.read_raw(channel).unwrap();
        }

        let spi = adc.release();
        assert_eq!(
            spi.frames,
            [
                [0x01, 0x80, 0x00],
                [0x01, 0x90, 0x00],
                [0x01, 0xA0, 0x00],
                [0x01, 0xB0, 0x00]
            ]
        );
    }

    #[test]
    fn test_result_masks_undefined_bits() {
        let mut adc = Mcp3004::new(MockAdc::new([0, 1023, 512, 0x0AB]));
        assert_eq!(adc.read_raw(0).unwrap(), 0);
        assert_eq!(adc.read_raw(1).unwrap(), 1023);
        assert_eq!(adc.read_raw(2).unwrap(), 512);
        assert_eq!(adc.read_raw(3).unwrap(), 0x0AB);

        let reading = adc.read(1).unwrap();
        assert_eq!(reading.normalized(), 1.0);
    }

    #[test]
    fn test_invalid_channel_skips_bus() {
        let mut adc = Mcp3004::new(MockAdc::new([0; 4]));
        assert_eq!(adc.read_raw(4), Err(PeripheralError::InvalidChannel(4)));
        assert!(adc.release().frames.is_empty());
    }

    #[test]
    fn test_bus_error() {
        let mut spi = MockAdc::new([0; 4]);
        spi.fail = true;
        let mut adc = Mcp3004::new(spi);

        assert!(matches!(
            adc.read_raw(0),
            Err(PeripheralError::Bus {
                device: "MCP3004",
                ..
            })
        ));
    }
}
