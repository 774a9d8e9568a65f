//! Batch collection and aggregation of color readings

use embedded_hal::delay::DelayNs;

use super::color::{NormalizedColor, ZeroMagnitude};
use crate::config::SamplingConfig;
use crate::traits::{ColorSensor, HardwareError, Rgb};

/// Running sum of one batch of readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AggregatedReading {
    sum: [u32; 3],
    valid: u16,
    polled: u16,
}

impl AggregatedReading {
    /// Empty aggregate
    pub const fn new() -> Self {
        Self {
            sum: [0; 3],
            valid: 0,
            polled: 0,
        }
    }

    /// Add one poll result; `None` counts as a polled fault
    pub fn add(&mut self, sample: Option<Rgb>) {
        self.polled = self.polled.saturating_add(1);

        if let Some(rgb) = sample {
            self.sum[0] += u32::from(rgb.r);
            self.sum[1] += u32::from(rgb.g);
            self.sum[2] += u32::from(rgb.b);
            self.valid = self.valid.saturating_add(1);
        }
    }

    /// Per-channel sums of valid samples
    pub fn sum(&self) -> [u32; 3] {
        self.sum
    }

    /// Number of valid samples
    pub fn valid_count(&self) -> u16 {
        self.valid
    }

    /// Number of polls made
    pub fn polled_count(&self) -> u16 {
        self.polled
    }

    /// Number of polls that returned no reading
    pub fn fault_count(&self) -> u16 {
        self.polled - self.valid
    }

    /// Normalize the sum to a unit color vector
    pub fn normalize(&self) -> Result<NormalizedColor, ZeroMagnitude> {
        NormalizedColor::from_sum([
            self.sum[0] as f32,
            self.sum[1] as f32,
            self.sum[2] as f32,
        ])
    }
}

/// Collects fixed-size batches from a color sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleAggregator {
    batch_size: u16,
    sample_delay_ms: u32,
}

impl SampleAggregator {
    pub const fn new(batch_size: u16, sample_delay_ms: u32) -> Self {
        Self {
            batch_size,
            sample_delay_ms,
        }
    }

    pub fn from_config(config: &SamplingConfig) -> Self {
        Self::new(config.batch_size, config.sample_delay_ms)
    }

    pub fn batch_size(&self) -> u16 {
        self.batch_size
    }

    /// Poll the sensor `batch_size` times
    ///
    /// Each poll waits for the sensor to be ready, waits the per-sample
    /// delay, then reads. Absent readings are skipped without retry. A
    /// transport failure aborts the batch.
    pub fn collect<S, D>(&self, sensor: &mut S, delay: &mut D) -> Result<AggregatedReading, HardwareError>
    where
        S: ColorSensor,
        D: DelayNs,
    {
        let mut reading = AggregatedReading::new();

        for _ in 0..self.batch_size {
            sensor.wait_ready()?;
            delay.delay_ms(self.sample_delay_ms);
            reading.add(sensor.read_rgb()?);
        }

        Ok(reading)
    }
}
