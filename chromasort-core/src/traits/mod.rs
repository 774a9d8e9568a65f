//! Hardware collaborator traits
//!
//! These traits define the interface between the sorting logic and
//! hardware-specific implementations. Drivers live in `chromasort-drivers`;
//! the firmware wires them to board pins.

pub mod error;
pub mod log;
pub mod motor;
pub mod sensor;

pub use error::HardwareError;
pub use log::{LineLog, LogError, LogRecord, ReadingLog};
pub use motor::{MotorChannel, MotorId};
pub use sensor::{ColorSensor, Rgb, StopSignal, TriggerSensor};
