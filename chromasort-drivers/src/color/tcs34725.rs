//! TCS34725 RGB color sensor (I2C)
//!
//! The TCS34725 integrates clear, red, green and blue photodiodes over a
//! configurable number of 2.4 ms cycles and latches the four 16-bit counts.
//!
//! # I2C Protocol
//!
//! - Fixed 7-bit address 0x29
//! - Every register access starts with a command byte: bit 7 set, bits 6:5
//!   select the transaction type, bits 4:0 the register
//! - Auto-increment lets the four channels be read in one 8-byte burst
//!   (CDATAL..BDATAH, little-endian)
//!
//! Raw counts are scaled to 0-255 against the clear channel, which makes the
//! reading independent of the integration time and gain.

use chromasort_core::traits::{ColorSensor, HardwareError, Rgb};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// Fixed I2C address
pub const ADDRESS: u8 = 0x29;

/// Command byte bit
const COMMAND: u8 = 0x80;

/// Auto-increment transaction type
const AUTO_INCREMENT: u8 = 0x20;

/// TCS34725 register addresses
pub mod reg {
    /// Power and ADC enable
    pub const ENABLE: u8 = 0x00;
    /// Integration time (256 - cycles)
    pub const ATIME: u8 = 0x01;
    /// Analog gain
    pub const CONTROL: u8 = 0x0F;
    /// Device ID
    pub const ID: u8 = 0x12;
    /// Device status
    pub const STATUS: u8 = 0x13;
    /// Clear channel low byte; red, green, blue follow
    pub const CDATAL: u8 = 0x14;
}

/// ENABLE: oscillator on
const ENABLE_PON: u8 = 0x01;
/// ENABLE: RGBC ADC on
const ENABLE_AEN: u8 = 0x02;
/// STATUS: an integration cycle has completed
const STATUS_AVALID: u8 = 0x01;

/// ID register values for TCS34725 / TCS34727
const DEVICE_IDS: [u8; 2] = [0x44, 0x4D];

/// Oscillator warm-up after PON
const POWER_ON_DELAY_MS: u32 = 3;

/// Interval between STATUS polls while waiting for a reading
const READY_POLL_MS: u32 = 1;

/// Analog gain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    X1 = 0,
    X4 = 1,
    X16 = 2,
    X60 = 3,
}

/// TCS34725 configuration
#[derive(Debug, Clone)]
pub struct Tcs34725Config {
    /// Integration cycles of 2.4 ms each (1-256)
    pub integration_cycles: u16,
    /// Analog gain
    pub gain: Gain,
    /// Longest wait for AVALID before giving up on a sample
    pub ready_timeout_ms: u32,
}

impl Default for Tcs34725Config {
    fn default() -> Self {
        Self {
            integration_cycles: 42,
            gain: Gain::X4,
            ready_timeout_ms: 150,
        }
    }
}

impl Tcs34725Config {
    /// ATIME register value
    pub fn atime(&self) -> u8 {
        let cycles = self.integration_cycles.clamp(1, 256);
        (256 - cycles) as u8
    }

    /// Count at which the clear channel saturates
    pub fn saturation_count(&self) -> u16 {
        let cycles = u32::from(self.integration_cycles.clamp(1, 256));
        (cycles * 1024).min(u32::from(u16::MAX)) as u16
    }
}

/// Raw channel counts from one integration cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawCounts {
    pub clear: u16,
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl RawCounts {
    fn from_bytes(buf: &[u8; 8]) -> Self {
        Self {
            clear: u16::from_le_bytes([buf[0], buf[1]]),
            red: u16::from_le_bytes([buf[2], buf[3]]),
            green: u16::from_le_bytes([buf[4], buf[5]]),
            blue: u16::from_le_bytes([buf[6], buf[7]]),
        }
    }

    /// Scale each color channel to 0-255 against the clear channel
    ///
    /// A dark reading (clear == 0) scales to black.
    pub fn to_rgb(&self) -> Rgb {
        if self.clear == 0 {
            return Rgb::default();
        }
        let scale = |channel: u16| -> u8 {
            let scaled = u32::from(channel) * 255 / u32::from(self.clear);
            scaled.min(255) as u8
        };
        Rgb::new(scale(self.red), scale(self.green), scale(self.blue))
    }
}

/// TCS34725 driver
pub struct Tcs34725<I2C, D> {
    i2c: I2C,
    delay: D,
    config: Tcs34725Config,
}

impl<I2C: I2c, D: DelayNs> Tcs34725<I2C, D> {
    pub fn new(i2c: I2C, delay: D, config: Tcs34725Config) -> Self {
        Self { i2c, delay, config }
    }

    /// Check the device ID, apply timing and gain, and power on the ADC
    pub fn init(&mut self) -> Result<(), HardwareError> {
        let id = self.read_register(reg::ID)?;
        if !DEVICE_IDS.contains(&id) {
            return Err(HardwareError::NotResponding);
        }

        self.write_register(reg::ATIME, self.config.atime())?;
        self.write_register(reg::CONTROL, self.config.gain as u8)?;
        self.write_register(reg::ENABLE, ENABLE_PON)?;
        self.delay.delay_ms(POWER_ON_DELAY_MS);
        self.write_register(reg::ENABLE, ENABLE_PON | ENABLE_AEN)
    }

    /// Power the sensor down
    pub fn disable(&mut self) -> Result<(), HardwareError> {
        self.write_register(reg::ENABLE, 0)
    }

    /// Check if an integration cycle has completed
    pub fn data_ready(&mut self) -> Result<bool, HardwareError> {
        let status = self.read_register(reg::STATUS)?;
        Ok(status & STATUS_AVALID != 0)
    }

    /// Read the four channel counts in one burst
    pub fn read_counts(&mut self) -> Result<RawCounts, HardwareError> {
        let mut buf = [0u8; 8];
        self.i2c
            .write_read(ADDRESS, &[COMMAND | AUTO_INCREMENT | reg::CDATAL], &mut buf)
            .map_err(|_| HardwareError::Bus)?;
        Ok(RawCounts::from_bytes(&buf))
    }

    pub fn config(&self) -> &Tcs34725Config {
        &self.config
    }

    /// Release the bus and delay
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, HardwareError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(ADDRESS, &[COMMAND | reg], &mut buf)
            .map_err(|_| HardwareError::Bus)?;
        Ok(buf[0])
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), HardwareError> {
        self.i2c
            .write(ADDRESS, &[COMMAND | reg, value])
            .map_err(|_| HardwareError::Bus)
    }
}

impl<I2C: I2c, D: DelayNs> ColorSensor for Tcs34725<I2C, D> {
    /// Poll AVALID until set or the timeout elapses
    ///
    /// A timeout is not an error: the following read reports no valid sample.
    fn wait_ready(&mut self) -> Result<(), HardwareError> {
        let mut waited = 0;
        while !self.data_ready()? {
            if waited >= self.config.ready_timeout_ms {
                break;
            }
            self.delay.delay_ms(READY_POLL_MS);
            waited += READY_POLL_MS;
        }
        Ok(())
    }

    fn read_rgb(&mut self) -> Result<Option<Rgb>, HardwareError> {
        if !self.data_ready()? {
            return Ok(None);
        }

        let counts = self.read_counts()?;
        if counts.clear >= self.config.saturation_count() {
            return Ok(None);
        }
        Ok(Some(counts.to_rgb()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDelay, MockI2c};

    fn sensor(id: u8) -> Tcs34725<MockI2c, MockDelay> {
        let mut i2c = MockI2c::new(ADDRESS);
        i2c.registers[reg::ID as usize] = id;
        Tcs34725::new(i2c, MockDelay::default(), Tcs34725Config::default())
    }

    fn load_counts(sensor: &mut Tcs34725<MockI2c, MockDelay>, counts: RawCounts) {
        let i2c = &mut sensor.i2c;
        i2c.set_u16(reg::CDATAL, counts.clear);
        i2c.set_u16(reg::CDATAL + 2, counts.red);
        i2c.set_u16(reg::CDATAL + 4, counts.green);
        i2c.set_u16(reg::CDATAL + 6, counts.blue);
        i2c.registers[reg::STATUS as usize] = STATUS_AVALID;
    }

    #[test]
    fn test_init_sequence() {
        let mut sensor = sensor(0x44);
        sensor.init().unwrap();

        let (i2c, delay) = sensor.release();
        assert_eq!(
            i2c.writes,
            vec![
                (reg::ATIME, 214),
                (reg::CONTROL, Gain::X4 as u8),
                (reg::ENABLE, ENABLE_PON),
                (reg::ENABLE, ENABLE_PON | ENABLE_AEN),
            ]
        );
        assert_eq!(delay.total_ns, 3_000_000);
    }

    #[test]
    fn test_init_rejects_unknown_id() {
        let mut sensor = sensor(0x10);
        assert_eq!(sensor.init(), Err(HardwareError::NotResponding));
    }

    #[test]
    fn test_absent_device_is_bus_fault() {
        let i2c = MockI2c::new(0x30);
        let mut sensor = Tcs34725::new(i2c, MockDelay::default(), Tcs34725Config::default());
        assert_eq!(sensor.init(), Err(HardwareError::Bus));
        assert_eq!(sensor.read_rgb(), Err(HardwareError::Bus));
    }

    #[test]
    fn test_read_scales_to_clear() {
        let mut sensor = sensor(0x4D);
        load_counts(
            &mut sensor,
            RawCounts {
                clear: 1000,
                red: 500,
                green: 250,
                blue: 1200,
            },
        );

        // Channels above clear clamp at 255
        assert_eq!(sensor.read_rgb(), Ok(Some(Rgb::new(127, 63, 255))));
    }

    #[test]
    fn test_dark_reading_is_black() {
        let mut sensor = sensor(0x44);
        load_counts(&mut sensor, RawCounts::default());
        assert_eq!(sensor.read_rgb(), Ok(Some(Rgb::new(0, 0, 0))));
    }

    #[test]
    fn test_not_ready_is_missing_sample() {
        let mut sensor = sensor(0x44);
        assert_eq!(sensor.read_rgb(), Ok(None));
    }

    #[test]
    fn test_saturated_is_missing_sample() {
        let mut sensor = sensor(0x44);
        let saturation = sensor.config().saturation_count();
        load_counts(
            &mut sensor,
            RawCounts {
                clear: saturation,
                red: 100,
                green: 100,
                blue: 100,
            },
        );
        assert_eq!(sensor.read_rgb(), Ok(None));
    }

    #[test]
    fn test_wait_ready_times_out_quietly() {
        let mut sensor = sensor(0x44);
        assert_eq!(sensor.wait_ready(), Ok(()));

        let (_, delay) = sensor.release();
        assert_eq!(delay.total_ns, 150 * 1_000_000);
    }

    #[test]
    fn test_wait_ready_returns_immediately_when_valid() {
        let mut sensor = sensor(0x44);
        load_counts(&mut sensor, RawCounts::default());
        assert_eq!(sensor.wait_ready(), Ok(()));

        let (_, delay) = sensor.release();
        assert_eq!(delay.total_ns, 0);
    }

    #[test]
    fn test_bus_failure() {
        let mut sensor = sensor(0x44);
        sensor.i2c.fail = true;
        assert_eq!(sensor.read_rgb(), Err(HardwareError::Bus));
        assert_eq!(sensor.wait_ready(), Err(HardwareError::Bus));
    }

    #[test]
    fn test_config_registers() {
        let config = Tcs34725Config {
            integration_cycles: 256,
            ..Tcs34725Config::default()
        };
        assert_eq!(config.atime(), 0);
        assert_eq!(config.saturation_count(), u16::MAX);

        let config = Tcs34725Config {
            integration_cycles: 1,
            ..Tcs34725Config::default()
        };
        assert_eq!(config.atime(), 255);
        assert_eq!(config.saturation_count(), 1024);
    }
}
