//! Actuation planning and sequencing
//!
//! The planner maps a classified label to an ordered list of motor steps.
//! The sequencer issues those steps against the motor channels, blocking for
//! each settle delay.

pub mod counter;
pub mod plan;
pub mod planner;
pub mod sequencer;

pub use counter::CubeCounter;
pub use plan::{ActuationPlan, ActuationStep, MotorCommand, StepPhase, Target, MAX_PLAN_STEPS};
pub use planner::ActuationPlanner;
pub use sequencer::{MotionSequencer, MotorFault, SequenceError};
