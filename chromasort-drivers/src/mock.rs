//! embedded-hal test doubles

use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::i2c::{self, I2c, Operation, SevenBitAddress};

/// GPIO pin that records output levels and replays a fixed input level
#[derive(Debug, Default)]
pub struct MockPin {
    pub high: bool,
    /// Number of rising edges driven
    pub rising_edges: u32,
    pub fail: bool,
}

impl MockPin {
    pub fn input(high: bool) -> Self {
        Self {
            high,
            ..Self::default()
        }
    }
}

impl digital::ErrorType for MockPin {
    type Error = digital::ErrorKind;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.fail {
            return Err(digital::ErrorKind::Other);
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.fail {
            return Err(digital::ErrorKind::Other);
        }
        if !self.high {
            self.rising_edges += 1;
        }
        self.high = true;
        Ok(())
    }
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.fail {
            return Err(digital::ErrorKind::Other);
        }
        Ok(self.high)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Delay that only accumulates the requested time
#[derive(Debug, Default)]
pub struct MockDelay {
    pub total_ns: u64,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

/// I2C device with a flat register file and an auto-incrementing pointer
#[derive(Debug)]
pub struct MockI2c {
    pub address: SevenBitAddress,
    pub registers: [u8; 32],
    /// Register writes as (register, value)
    pub writes: Vec<(u8, u8)>,
    pub fail: bool,
    pointer: usize,
}

impl MockI2c {
    pub fn new(address: SevenBitAddress) -> Self {
        Self {
            address,
            registers: [0; 32],
            writes: Vec::new(),
            fail: false,
            pointer: 0,
        }
    }

    /// Store a little-endian 16-bit value at `reg` and `reg + 1`
    pub fn set_u16(&mut self, reg: u8, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.registers[reg as usize] = lo;
        self.registers[reg as usize + 1] = hi;
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = i2c::ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.fail || address != self.address {
            return Err(i2c::ErrorKind::NoAcknowledge(
                i2c::NoAcknowledgeSource::Address,
            ));
        }

        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    let Some((command, data)) = bytes.split_first() else {
                        continue;
                    };
                    // Low five bits select the register
                    self.pointer = (command & 0x1F) as usize;
                    for value in data.iter() {
                        self.writes.push((self.pointer as u8, *value));
                        self.registers[self.pointer] = *value;
                        self.pointer = (self.pointer + 1) % self.registers.len();
                    }
                }
                Operation::Read(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = self.registers[self.pointer];
                        self.pointer = (self.pointer + 1) % self.registers.len();
                    }
                }
            }
        }
        Ok(())
    }
}
