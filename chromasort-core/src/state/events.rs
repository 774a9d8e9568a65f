//! Events that trigger state transitions

use super::machine::FaultSource;

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Operator events
    /// Trigger sensor reported a press
    TriggerPressed,
    /// Termination signal observed while idle
    StopRequested,

    // Cycle progress events
    /// Sampling batch finished (possibly with zero valid samples)
    BatchCollected,
    /// Aggregate normalized to a unit vector
    Normalized,
    /// Aggregate had zero magnitude; cycle dropped
    Rejected,
    /// Label chosen
    Classified,
    /// Actuation plan built
    Planned,
    /// Every plan step issued and settled
    ActuationDone,
    /// Record appended and post-cycle delay elapsed
    Logged,

    // Fault events
    /// A collaborator command could not be issued
    FaultDetected(FaultSource),
    /// Fault policy says go back to idle
    Resume,
    /// Fault policy says stop
    Halt,
}
