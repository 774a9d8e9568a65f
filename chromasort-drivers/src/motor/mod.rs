//! Motor channel implementations
//!
//! - Step/dir stepper driver (A4988, DRV8825, TMC2209 in standalone mode)
//!   with position tracking in degrees

pub mod step_dir;

pub use step_dir::{StepDirConfig, StepDirMotor};
