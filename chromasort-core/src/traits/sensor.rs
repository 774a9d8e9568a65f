//! Operator input and sensor traits

use super::HardwareError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One raw color reading, each channel in 0-255
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Create a reading from its three channels
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Binary trigger (touch sensor) that starts a routing cycle
pub trait TriggerSensor {
    /// Check if the trigger is currently pressed
    fn is_pressed(&mut self) -> Result<bool, HardwareError>;
}

/// Color sensor producing raw RGB readings
pub trait ColorSensor {
    /// Read one RGB sample
    ///
    /// Returns `Ok(None)` when the sensor answered but had no valid reading
    /// (a single-reading fault). Returns `Err` only when the read command
    /// itself could not be issued.
    fn read_rgb(&mut self) -> Result<Option<Rgb>, HardwareError>;

    /// Block until the sensor is ready to be read
    ///
    /// Sensors without a readiness handshake keep the default no-op.
    fn wait_ready(&mut self) -> Result<(), HardwareError> {
        Ok(())
    }
}

/// External termination request, checked only while idle
pub trait StopSignal {
    /// Check if the loop should stop
    fn stop_requested(&mut self) -> bool;
}

impl<F: FnMut() -> bool> StopSignal for F {
    fn stop_requested(&mut self) -> bool {
        self()
    }
}
