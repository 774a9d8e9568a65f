//! Actuation plans produced for one cube

use heapless::Vec;

use crate::traits::MotorId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum steps in one plan
pub const MAX_PLAN_STEPS: usize = 3;

/// Maximum motor commands grouped into one step
pub const MAX_STEP_COMMANDS: usize = 3;

/// Position target in degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Target {
    /// Absolute position from the encoder zero
    Absolute(i32),
    /// Offset from the current position
    Relative(i32),
}

/// One motor command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotorCommand {
    pub motor: MotorId,
    pub target: Target,
}

impl MotorCommand {
    pub const fn absolute(motor: MotorId, degrees: i32) -> Self {
        Self {
            motor,
            target: Target::Absolute(degrees),
        }
    }

    pub const fn relative(motor: MotorId, delta_degrees: i32) -> Self {
        Self {
            motor,
            target: Target::Relative(delta_degrees),
        }
    }
}

/// What a step does for the cube
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StepPhase {
    /// Move the tray to the label's channel
    Position,
    /// Push the cube out
    Eject,
    /// Return actuators to rest
    Rest,
}

/// Commands issued back-to-back, followed by one settle delay
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActuationStep {
    pub phase: StepPhase,
    pub commands: Vec<MotorCommand, MAX_STEP_COMMANDS>,
    pub settle_ms: u32,
}

impl ActuationStep {
    /// Step with a single command
    pub fn single(phase: StepPhase, command: MotorCommand, settle_ms: u32) -> Self {
        let mut commands = Vec::new();
        // Capacity is at least one
        let _ = commands.push(command);
        Self {
            phase,
            commands,
            settle_ms,
        }
    }

    /// Step with grouped commands; extra commands beyond capacity are dropped
    pub fn grouped(phase: StepPhase, group: &[MotorCommand], settle_ms: u32) -> Self {
        let mut commands = Vec::new();
        for command in group.iter().take(MAX_STEP_COMMANDS) {
            let _ = commands.push(*command);
        }
        Self {
            phase,
            commands,
            settle_ms,
        }
    }
}

/// Ordered steps for one cube
///
/// A non-empty plan always ends with a step that returns every motor it
/// touched to rest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActuationPlan {
    steps: Vec<ActuationStep, MAX_PLAN_STEPS>,
}

impl ActuationPlan {
    /// Plan that leaves the cube in place
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, step: ActuationStep) {
        // Planner never builds more than MAX_PLAN_STEPS steps
        let _ = self.steps.push(step);
    }

    pub fn steps(&self) -> &[ActuationStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sum of all settle delays (ms)
    pub fn total_settle_ms(&self) -> u32 {
        self.steps.iter().map(|s| s.settle_ms).sum()
    }
}
