//! Motor channel trait
//!
//! Motors are position-controlled in degrees. The rig has no motion-complete
//! feedback: a command returns once it has been issued and the caller waits
//! a fixed settle delay.
//!
//! Moves that must run together (the two tray motors) are started with
//! `start_*` and then advanced pulse by pulse through [`MotorChannel::step`],
//! so the caller can interleave several channels.

use super::HardwareError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a motor in the configured motor table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotorId(pub u8);

impl MotorId {
    /// Table index for this motor
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Position-controlled motor channel
pub trait MotorChannel {
    /// Move to an absolute position in degrees from the encoder zero
    fn set_absolute_position(&mut self, degrees: i32) -> Result<(), HardwareError>;

    /// Move by a relative amount in degrees from the current position
    fn set_relative_position(&mut self, delta_degrees: i32) -> Result<(), HardwareError>;

    /// Set the speed limit in degrees per second
    ///
    /// A value of 0 removes the limit.
    fn set_speed_limit(&mut self, degrees_per_second: u16) -> Result<(), HardwareError>;

    /// Declare the current position as the encoder zero
    fn reset_encoder(&mut self) -> Result<(), HardwareError>;

    /// Start a move to an absolute position without waiting for it
    ///
    /// Channels with their own motion controller keep the default, which
    /// issues the move and reports it complete on the first `step`.
    fn start_absolute(&mut self, degrees: i32) -> Result<(), HardwareError> {
        self.set_absolute_position(degrees)
    }

    /// Start a relative move without waiting for it
    fn start_relative(&mut self, delta_degrees: i32) -> Result<(), HardwareError> {
        self.set_relative_position(delta_degrees)
    }

    /// Advance a started move by one pulse
    ///
    /// Returns the microseconds until the next pulse is due, or `None` once
    /// the move is complete.
    fn step(&mut self) -> Result<Option<u32>, HardwareError> {
        Ok(None)
    }
}
