//! Actuation planner
//!
//! Pure mapping from a label (and, for the rotating tray, a slot index) to
//! an [`ActuationPlan`]. No hardware is touched here.

use super::plan::{ActuationPlan, ActuationStep, MotorCommand, StepPhase};
use crate::classify::ColorLabel;
use crate::config::{PistonConfig, SchemeConfig, TrayConfig};

/// Builds plans for the configured actuation scheme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuationPlanner {
    scheme: SchemeConfig,
}

impl ActuationPlanner {
    pub fn new(scheme: SchemeConfig) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> &SchemeConfig {
        &self.scheme
    }

    /// Number of delivery slots; zero when the scheme has no counter
    pub fn slot_count(&self) -> usize {
        match &self.scheme {
            SchemeConfig::DedicatedPiston(_) => 0,
            SchemeConfig::RotatingTray(tray) => tray.slot_count(),
        }
    }

    /// Build the plan for one cube
    ///
    /// `slot` is the clamped cube counter index and is ignored by the
    /// dedicated piston scheme. Labels without a configured route get an
    /// empty plan.
    pub fn plan(&self, label: ColorLabel, slot: usize) -> ActuationPlan {
        match &self.scheme {
            SchemeConfig::DedicatedPiston(pistons) => plan_piston(pistons, label),
            SchemeConfig::RotatingTray(tray) => plan_tray(tray, label, slot),
        }
    }
}

/// Stroke out, settle, stroke back, settle
fn plan_piston(pistons: &PistonConfig, label: ColorLabel) -> ActuationPlan {
    let mut plan = ActuationPlan::empty();
    let Some(route) = pistons.route(label) else {
        return plan;
    };

    plan.push(ActuationStep::single(
        StepPhase::Eject,
        MotorCommand::relative(route.motor, route.stroke_deg),
        pistons.eject_settle_ms,
    ));
    plan.push(ActuationStep::single(
        StepPhase::Rest,
        MotorCommand::relative(route.motor, route.stroke_deg.saturating_neg()),
        pistons.return_settle_ms,
    ));
    plan
}

/// Rotate tray, push by slot offset, return everything to zero
fn plan_tray(tray: &TrayConfig, label: ColorLabel, slot: usize) -> ActuationPlan {
    let mut plan = ActuationPlan::empty();
    let Some(angle) = tray.angle(label) else {
        return plan;
    };

    let last = tray.slot_offsets.len().saturating_sub(1);
    let offset = tray.slot_offsets.get(slot.min(last)).copied().unwrap_or(0);

    plan.push(ActuationStep::grouped(
        StepPhase::Position,
        &[
            MotorCommand::absolute(tray.primary, angle),
            MotorCommand::absolute(tray.mirror, angle.saturating_neg()),
        ],
        tray.tray_settle_ms,
    ));
    plan.push(ActuationStep::single(
        StepPhase::Eject,
        MotorCommand::relative(tray.pusher, offset),
        tray.push_settle_ms,
    ));
    plan.push(ActuationStep::grouped(
        StepPhase::Rest,
        &[
            MotorCommand::absolute(tray.primary, 0),
            MotorCommand::absolute(tray.mirror, 0),
            MotorCommand::absolute(tray.pusher, 0),
        ],
        tray.rest_settle_ms,
    ));
    plan
}
