//! Motion sequencer
//!
//! Owns the motor channels and their logical positions. Steps run strictly
//! in order. The commands of a step are started together and pulsed to
//! completion, then a fixed settle delay follows. There is no
//! motion-complete feedback.

use embedded_hal::delay::DelayNs;

use super::plan::{ActuationPlan, MotorCommand, Target, MAX_STEP_COMMANDS};
use crate::config::SorterConfig;
use crate::traits::{HardwareError, MotorChannel, MotorId};

/// Logical rest position after startup homing (degrees)
pub const REST_POSITION: i32 = 0;

/// A motor command that could not be issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorFault {
    pub motor: MotorId,
    pub error: HardwareError,
}

/// Plan execution stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceError {
    /// Plan referenced a motor the sequencer does not own
    UnknownMotor { step: u8, motor: MotorId },
    /// Motor command failed
    Command { step: u8, fault: MotorFault },
}

impl SequenceError {
    /// Motor the failure is attributed to
    pub fn motor(&self) -> MotorId {
        match self {
            SequenceError::UnknownMotor { motor, .. } => *motor,
            SequenceError::Command { fault, .. } => fault.motor,
        }
    }

    /// Underlying collaborator error
    ///
    /// A plan that names a motor the sequencer does not own is reported as
    /// a rejected command.
    pub fn error(&self) -> HardwareError {
        match self {
            SequenceError::UnknownMotor { .. } => HardwareError::Rejected,
            SequenceError::Command { fault, .. } => fault.error,
        }
    }

    /// Index of the step that failed
    pub fn step(&self) -> u8 {
        match self {
            SequenceError::UnknownMotor { step, .. } | SequenceError::Command { step, .. } => {
                *step
            }
        }
    }
}

/// One owned motor with its tracked state
struct MotorSlot<M> {
    channel: M,
    speed_limit_dps: u16,
    position: i32,
    /// A move was started and has not completed
    moving: bool,
}

/// A started move waiting for its next pulse
#[derive(Debug, Clone, Copy)]
struct Active {
    motor: MotorId,
    target: i32,
    due_us: u64,
}

/// Executes actuation plans against `N` motor channels
///
/// Channel `i` is the motor with [`MotorId`] `i`.
pub struct MotionSequencer<M, const N: usize> {
    motors: [MotorSlot<M>; N],
}

impl<M: MotorChannel, const N: usize> MotionSequencer<M, N> {
    /// Wrap channels with their configured speed limits
    pub fn new(channels: [M; N], speed_limits: [u16; N]) -> Self {
        let mut index = 0;
        let motors = channels.map(|channel| {
            let slot = MotorSlot {
                channel,
                speed_limit_dps: speed_limits[index],
                position: REST_POSITION,
                moving: false,
            };
            index += 1;
            slot
        });
        Self { motors }
    }

    /// Wrap channels, taking speed limits from the motor table
    ///
    /// Channels beyond the motor table get no speed limit.
    pub fn from_config(channels: [M; N], config: &SorterConfig) -> Self {
        let mut limits = [0u16; N];
        for (limit, motor) in limits.iter_mut().zip(config.motors.iter()) {
            *limit = motor.speed_limit_dps;
        }
        Self::new(channels, limits)
    }

    /// Apply speed limits and zero every encoder
    pub fn initialize(&mut self) -> Result<(), MotorFault> {
        for (i, slot) in self.motors.iter_mut().enumerate() {
            let motor = MotorId(i as u8);
            let fault = |error| MotorFault { motor, error };

            slot.channel
                .set_speed_limit(slot.speed_limit_dps)
                .map_err(fault)?;
            slot.channel.reset_encoder().map_err(fault)?;
            slot.position = REST_POSITION;
            slot.moving = false;

            debug!("motor {} ready, limit {} dps", i, slot.speed_limit_dps);
        }
        Ok(())
    }

    /// Execute every step of a plan in order
    ///
    /// The commands of one step are started together and their pulses
    /// interleaved, so grouped motors move as one. The first command that
    /// cannot be issued stops the plan: no later command or settle delay
    /// runs.
    pub fn execute<D: DelayNs>(
        &mut self,
        plan: &ActuationPlan,
        delay: &mut D,
    ) -> Result<(), SequenceError> {
        for (i, step) in plan.steps().iter().enumerate() {
            let step_index = i as u8;

            self.run_step(step_index, &step.commands, delay)?;

            trace!(
                "step {}: {} commands, settle {} ms",
                step_index,
                step.commands.len(),
                step.settle_ms
            );
            delay.delay_ms(step.settle_ms);
        }
        Ok(())
    }

    fn run_step<D: DelayNs>(
        &mut self,
        step: u8,
        commands: &[MotorCommand],
        delay: &mut D,
    ) -> Result<(), SequenceError> {
        if let Some(command) = commands.iter().find(|c| c.motor.index() >= N) {
            return Err(SequenceError::UnknownMotor {
                step,
                motor: command.motor,
            });
        }
        let command_fault = |fault| SequenceError::Command { step, fault };

        let mut active = [None; MAX_STEP_COMMANDS];
        for (entry, command) in active.iter_mut().zip(commands) {
            *entry = Some(self.start(command).map_err(command_fault)?);
        }

        let mut clock = 0;
        self.drive(&mut active, &mut clock, delay)
            .map_err(command_fault)
    }

    /// Start one command; the logical position is updated once it completes
    fn start(&mut self, command: &MotorCommand) -> Result<Active, MotorFault> {
        let slot = &mut self.motors[command.motor.index()];
        let fault = |error| MotorFault {
            motor: command.motor,
            error,
        };

        let target = match command.target {
            Target::Absolute(degrees) => {
                slot.channel.start_absolute(degrees).map_err(fault)?;
                degrees
            }
            Target::Relative(delta) => {
                slot.channel.start_relative(delta).map_err(fault)?;
                slot.position.saturating_add(delta)
            }
        };
        slot.moving = true;

        Ok(Active {
            motor: command.motor,
            target,
            due_us: 0,
        })
    }

    /// Pulse every started move until all are complete
    ///
    /// Always pulses the motor whose next pulse is due first. A failed
    /// motor is dropped from `active` before its fault is returned.
    fn drive<D: DelayNs>(
        &mut self,
        active: &mut [Option<Active>],
        clock: &mut u64,
        delay: &mut D,
    ) -> Result<(), MotorFault> {
        loop {
            let next = active
                .iter()
                .enumerate()
                .filter_map(|(k, entry)| entry.map(|a| (k, a)))
                .min_by_key(|(_, a)| a.due_us);
            let Some((k, pending)) = next else {
                return Ok(());
            };

            if pending.due_us > *clock {
                let wait = pending.due_us - *clock;
                delay.delay_us(u32::try_from(wait).unwrap_or(u32::MAX));
                *clock = pending.due_us;
            }

            let slot = &mut self.motors[pending.motor.index()];
            match slot.channel.step() {
                Ok(Some(wait_us)) => {
                    active[k] = Some(Active {
                        due_us: *clock + u64::from(wait_us),
                        ..pending
                    });
                }
                Ok(None) => {
                    slot.position = pending.target;
                    slot.moving = false;
                    active[k] = None;
                }
                Err(error) => {
                    active[k] = None;
                    return Err(MotorFault {
                        motor: pending.motor,
                        error,
                    });
                }
            }
        }
    }

    /// Drive every motor that is away from rest back to rest
    ///
    /// Best effort: every motor is attempted even if an earlier one fails,
    /// and the motors move together. Returns the first failure.
    pub fn park<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), MotorFault> {
        let mut first_fault = None;
        let mut active = [None; N];

        for (entry, i) in active.iter_mut().zip(0..N) {
            let slot = &self.motors[i];
            if slot.position == REST_POSITION && !slot.moving {
                continue;
            }

            match self.start(&MotorCommand::absolute(MotorId(i as u8), REST_POSITION)) {
                Ok(started) => *entry = Some(started),
                Err(fault) => {
                    warn!("motor {} failed to park", i);
                    first_fault.get_or_insert(fault);
                }
            }
        }

        let mut clock = 0;
        while let Err(fault) = self.drive(&mut active, &mut clock, delay) {
            warn!("motor {} failed to park", fault.motor.0);
            first_fault.get_or_insert(fault);
        }

        match first_fault {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    /// Logical position of a motor
    pub fn position(&self, motor: MotorId) -> Option<i32> {
        self.motors.get(motor.index()).map(|slot| slot.position)
    }

    /// Check if every motor is at rest with no move in progress
    pub fn at_rest(&self) -> bool {
        self.motors
            .iter()
            .all(|slot| slot.position == REST_POSITION && !slot.moving)
    }

    /// Borrow a motor channel
    pub fn channel(&self, motor: MotorId) -> Option<&M> {
        self.motors.get(motor.index()).map(|slot| &slot.channel)
    }

    pub const fn motor_count(&self) -> usize {
        N
    }
}
