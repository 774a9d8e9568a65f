//! State machine definition
//!
//! Hardware access in the request loop is a function of the current state:
//! the trigger is polled only in `Idle`, the color sensor only in
//! `Sampling`, motors only in `Actuating`.

use super::events::Event;
use crate::traits::MotorId;

/// Request loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Waiting for a trigger press
    Idle,
    /// Collecting a batch of color readings
    Sampling,
    /// Normalizing the aggregate
    Normalizing,
    /// Matching against the centroid table
    Classifying,
    /// Building the actuation plan
    Planning,
    /// Executing the plan
    Actuating,
    /// Appending to the readings log
    Logging,
    /// Collaborator fault; waiting for the fault policy
    Fault(FaultSource),
    /// Loop has stopped
    Terminated,
}

/// Collaborator that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultSource {
    /// Trigger sensor poll failed
    Trigger,
    /// Color sensor transport failed
    ColorSensor,
    /// Motor command could not be issued
    Motor(MotorId),
    /// Readings log could not be written
    ReadingLog,
}

impl State {
    /// Check if this state allows motor commands
    pub fn motor_allowed(&self) -> bool {
        matches!(self, State::Actuating)
    }

    /// Check if a cycle is in progress
    pub fn in_cycle(&self) -> bool {
        matches!(
            self,
            State::Sampling
                | State::Normalizing
                | State::Classifying
                | State::Planning
                | State::Actuating
                | State::Logging
        )
    }

    /// Check if this is a fault state
    pub fn is_fault(&self) -> bool {
        matches!(self, State::Fault(_))
    }

    /// Check if the loop has stopped
    pub fn is_terminated(&self) -> bool {
        matches!(self, State::Terminated)
    }

    /// Process an event and return the next state
    ///
    /// This is the core state transition logic.
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use State::*;

        match (self, event) {
            // Idle transitions
            (Idle, TriggerPressed) => Sampling,
            (Idle, StopRequested) => Terminated,

            // Cycle transitions
            (Sampling, BatchCollected) => Normalizing,
            (Normalizing, Normalized) => Classifying,
            (Normalizing, Rejected) => Idle,
            (Classifying, Classified) => Planning,
            (Planning, Planned) => Actuating,
            (Actuating, ActuationDone) => Logging,
            (Logging, Logged) => Idle,

            // Faults from any live state
            (Terminated, FaultDetected(_)) => Terminated,
            (_, FaultDetected(source)) => Fault(source),

            // Fault policy
            (Fault(_), Resume) => Idle,
            (Fault(_), Halt) => Terminated,

            // Default: stay in current state
            _ => self,
        }
    }
}
