//! Collaborator failure kinds

/// Errors reported by a hardware collaborator when a command cannot be issued
///
/// This covers transport and device failures only. A color sensor that
/// answers but has no valid reading reports `Ok(None)` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareError {
    /// Bus or pin transfer failed (I2C, UART, GPIO)
    Bus,
    /// Device did not answer or identified as something else
    NotResponding,
    /// Device reported it is disconnected or unpowered
    Disconnected,
    /// Device refused the command (value out of range, driver disabled)
    Rejected,
}
