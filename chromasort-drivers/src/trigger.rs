//! Touch sensor trigger on a GPIO input
//!
//! The rig uses a momentary touch sensor. Boards wire it either to pull the
//! line high when pressed or to short it to ground against a pull-up, so the
//! active level is configurable.

use chromasort_core::traits::{HardwareError, TriggerSensor};
use embedded_hal::digital::InputPin;

/// Touch sensor read from a single input pin
pub struct TouchSensor<P> {
    pin: P,
    active_low: bool,
}

impl<P: InputPin> TouchSensor<P> {
    /// Sensor that reads pressed when the line is high
    pub fn active_high(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    /// Sensor that reads pressed when the line is pulled low
    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }

    /// Release the underlying pin
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin> TriggerSensor for TouchSensor<P> {
    fn is_pressed(&mut self) -> Result<bool, HardwareError> {
        let high = self.pin.is_high().map_err(|_| HardwareError::Bus)?;
        Ok(high != self.active_low)
    }
}
