//! Configuration type definitions
//!
//! Loop timing, sampling, log and fault-handling settings. Motor and
//! actuation scheme tables live in [`super::hardware`].

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum motor name length
pub const MAX_NAME_LEN: usize = 16;

/// Maximum readings log path length
pub const MAX_PATH_LEN: usize = 64;

/// Batch sampling settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SamplingConfig {
    /// Polls per trigger press
    pub batch_size: u16,
    /// Wait before each poll (ms)
    pub sample_delay_ms: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            batch_size: 9,
            sample_delay_ms: 100,
        }
    }
}

/// Request loop delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimingConfig {
    /// Wait between trigger polls while idle (ms)
    pub idle_poll_ms: u32,
    /// Wait after logging an accepted cycle (ms)
    pub post_cycle_delay_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            idle_poll_ms: 10,
            post_cycle_delay_ms: 1000,
        }
    }
}

/// Readings log settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LogConfig {
    /// Destination path, used by hosts that write the log to a file
    pub path: String<MAX_PATH_LEN>,
    /// Append `" --> <L>"` to every line
    pub include_label: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        let mut path = String::new();
        // Fits MAX_PATH_LEN
        let _ = path.push_str("readings.log");
        Self {
            path,
            include_label: false,
        }
    }
}

/// Reaction to a hardware command fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FaultPolicy {
    /// Stop the loop and return the fault
    #[default]
    Halt,
    /// Log the fault and go back to idle
    Resume,
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Batch size is zero
    EmptyBatch,
    /// Motor table is empty
    NoMotors,
    /// Two motors share a name
    DuplicateMotor,
    /// A scheme entry references a motor index outside the table
    UnknownMotor(u8),
    /// Dedicated pistons or tray roles share a motor
    SharedMotor(u8),
    /// Tray scheme has no slot offsets
    NoSlots,
    /// Motor table is larger than the channels provided
    ChannelCount { configured: u8, provided: u8 },
}
