//! Request loop
//!
//! Ties sampling, classification, planning and sequencing together behind
//! the state machine. The loop owns every hardware collaborator for its
//! whole lifetime; nothing is shared and nothing is locked.
//!
//! One call to [`RequestLoop::poll`] is one `Idle` iteration: poll the
//! trigger, and on a press run a full cycle through to `Logging`.
//! [`RequestLoop::run`] repeats that until a stop is requested or a fault
//! ends the loop, then parks the motors and closes the readings log.

use embedded_hal::delay::DelayNs;

use crate::classify::{ColorClassifier, ColorLabel};
use crate::config::{ConfigError, FaultPolicy, SorterConfig, TimingConfig};
use crate::motion::{ActuationPlanner, CubeCounter, MotionSequencer, MotorFault};
use crate::sampling::{NormalizedColor, SampleAggregator, ZeroMagnitude};
use crate::state::{Event, FaultSource, State};
use crate::traits::{
    ColorSensor, HardwareError, LogError, LogRecord, MotorChannel, ReadingLog, StopSignal,
    TriggerSensor,
};

/// Collaborator command that could not be issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HardwareFault {
    pub source: FaultSource,
    pub error: HardwareError,
}

impl From<MotorFault> for HardwareFault {
    fn from(fault: MotorFault) -> Self {
        Self {
            source: FaultSource::Motor(fault.motor),
            error: fault.error,
        }
    }
}

/// Errors that end a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopError {
    /// Trigger, color sensor or motor fault
    Hardware(HardwareFault),
    /// Readings log could not be written or flushed
    Log(LogError),
}

/// Result of one triggered cycle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleOutcome {
    /// Color classified, plan executed, record logged
    Accepted {
        label: ColorLabel,
        color: NormalizedColor,
        distance_sq: f32,
        /// Steps in the executed plan (0 when the label has no route)
        steps: u8,
    },
    /// Batch had zero magnitude; nothing moved and nothing was logged
    Rejected { polled: u16, faults: u16 },
}

/// Counters accumulated over the loop lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunSummary {
    /// Cycles logged
    pub accepted: u32,
    /// Cycles dropped for zero magnitude
    pub rejected: u32,
    /// Accepted cycles whose plan moved a cube
    pub routed: u32,
    /// Hardware faults surfaced to the loop
    pub faults: u32,
}

/// Top-level polling controller
pub struct RequestLoop<T, C, M, D, L, const N: usize> {
    trigger: T,
    sensor: C,
    sequencer: MotionSequencer<M, N>,
    delay: D,
    log: L,
    aggregator: SampleAggregator,
    classifier: ColorClassifier,
    planner: ActuationPlanner,
    counter: CubeCounter,
    timing: TimingConfig,
    include_label: bool,
    fault_policy: FaultPolicy,
    state: State,
    summary: RunSummary,
}

impl<T, C, M, D, L, const N: usize> RequestLoop<T, C, M, D, L, N>
where
    T: TriggerSensor,
    C: ColorSensor,
    M: MotorChannel,
    D: DelayNs,
    L: ReadingLog,
{
    /// Build a loop from a configuration and its collaborators
    ///
    /// `motors[i]` drives the motor with id `i`; the motor table must have
    /// exactly `N` entries.
    pub fn new(
        config: &SorterConfig,
        trigger: T,
        sensor: C,
        motors: [M; N],
        delay: D,
        log: L,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.motors.len() != N {
            return Err(ConfigError::ChannelCount {
                configured: config.motors.len() as u8,
                provided: N as u8,
            });
        }

        let planner = ActuationPlanner::new(config.scheme.clone());
        let counter = CubeCounter::new(planner.slot_count());

        Ok(Self {
            trigger,
            sensor,
            sequencer: MotionSequencer::from_config(motors, config),
            delay,
            log,
            aggregator: SampleAggregator::from_config(&config.sampling),
            classifier: ColorClassifier::new(config.centroids),
            planner,
            counter,
            timing: config.timing,
            include_label: config.log.include_label,
            fault_policy: config.fault_policy,
            state: State::Idle,
            summary: RunSummary::default(),
        })
    }

    /// Apply motor speed limits and zero the encoders
    pub fn start(&mut self) -> Result<(), LoopError> {
        self.sequencer
            .initialize()
            .map_err(|fault| self.fault(fault.into()))
    }

    /// Run one `Idle` iteration
    ///
    /// Returns `Ok(None)` when the trigger was not pressed (after waiting the
    /// idle poll interval) or the loop is not idle.
    pub fn poll(&mut self) -> Result<Option<CycleOutcome>, LoopError> {
        if self.state != State::Idle {
            return Ok(None);
        }

        let pressed = self.trigger.is_pressed().map_err(|error| {
            self.fault(HardwareFault {
                source: FaultSource::Trigger,
                error,
            })
        })?;

        if !pressed {
            self.delay.delay_ms(self.timing.idle_poll_ms);
            return Ok(None);
        }

        info!("trigger pressed");
        self.state = self.state.transition(Event::TriggerPressed);
        self.cycle().map(Some)
    }

    /// Sampling through logging for one press
    fn cycle(&mut self) -> Result<CycleOutcome, LoopError> {
        let reading = self
            .aggregator
            .collect(&mut self.sensor, &mut self.delay)
            .map_err(|error| {
                self.fault(HardwareFault {
                    source: FaultSource::ColorSensor,
                    error,
                })
            })?;
        debug!(
            "batch: {} valid of {} polled",
            reading.valid_count(),
            reading.polled_count()
        );
        self.state = self.state.transition(Event::BatchCollected);

        let color = match reading.normalize() {
            Ok(color) => color,
            Err(ZeroMagnitude) => {
                warn!("zero magnitude batch, cycle rejected");
                self.state = self.state.transition(Event::Rejected);
                self.summary.rejected += 1;
                return Ok(CycleOutcome::Rejected {
                    polled: reading.polled_count(),
                    faults: reading.fault_count(),
                });
            }
        };
        self.state = self.state.transition(Event::Normalized);

        let result = self.classifier.classify(&color);
        info!(
            "classified {} (distance {})",
            result.label,
            result.distance_sq
        );
        self.state = self.state.transition(Event::Classified);

        // Counter advances for every planned cube, routed or not
        let slot = self.counter.index();
        let plan = self.planner.plan(result.label, slot);
        self.counter.advance();
        debug!(
            "plan: {} steps, {} ms settle, slot {}",
            plan.len(),
            plan.total_settle_ms(),
            slot
        );
        self.state = self.state.transition(Event::Planned);
        debug_assert!(self.state.motor_allowed());

        self.sequencer
            .execute(&plan, &mut self.delay)
            .map_err(|err| {
                self.fault(HardwareFault {
                    source: FaultSource::Motor(err.motor()),
                    error: err.error(),
                })
            })?;
        if !plan.is_empty() {
            self.summary.routed += 1;
        }
        self.state = self.state.transition(Event::ActuationDone);

        let record = LogRecord {
            color,
            label: self.include_label.then_some(result.label),
        };
        if let Err(err) = self.log.append(&record) {
            error!("readings log write failed: {}", err);
            self.state = self
                .state
                .transition(Event::FaultDetected(FaultSource::ReadingLog));
            return Err(LoopError::Log(err));
        }
        self.delay.delay_ms(self.timing.post_cycle_delay_ms);
        self.state = self.state.transition(Event::Logged);
        self.summary.accepted += 1;

        Ok(CycleOutcome::Accepted {
            label: result.label,
            color,
            distance_sq: result.distance_sq,
            steps: plan.len() as u8,
        })
    }

    fn fault(&mut self, fault: HardwareFault) -> LoopError {
        error!("hardware fault: {}", fault);
        if self.state.in_cycle() {
            warn!("cycle abandoned in {}", self.state);
        }
        self.summary.faults += 1;
        self.state = self.state.transition(Event::FaultDetected(fault.source));
        LoopError::Hardware(fault)
    }

    /// Run until a stop is requested or a fault ends the loop
    ///
    /// The stop signal is checked only between `Idle` iterations. Under
    /// [`FaultPolicy::Resume`] the motors are parked before returning to
    /// `Idle`; a park failure ends the loop. On every exit path the motors
    /// are parked (best effort) and the readings log is closed.
    pub fn run<S: StopSignal>(&mut self, stop: &mut S) -> Result<RunSummary, LoopError> {
        if self.state.is_terminated() {
            return Ok(self.summary);
        }

        let result = self.start().and_then(|()| self.serve(stop));
        let closed = self.shutdown();

        info!(
            "loop stopped: {} accepted, {} rejected, {} faults",
            self.summary.accepted,
            self.summary.rejected,
            self.summary.faults
        );

        result?;
        closed.map_err(LoopError::Log)?;
        Ok(self.summary)
    }

    fn serve<S: StopSignal>(&mut self, stop: &mut S) -> Result<(), LoopError> {
        loop {
            if stop.stop_requested() {
                info!("stop requested");
                self.state = self.state.transition(Event::StopRequested);
                return Ok(());
            }

            match self.poll() {
                Ok(_) => {}
                Err(LoopError::Hardware(_))
                    if self.fault_policy == FaultPolicy::Resume && self.state.is_fault() =>
                {
                    // A plan cut short can leave motors away from rest
                    if let Err(fault) = self.sequencer.park(&mut self.delay) {
                        return Err(self.fault(fault.into()));
                    }
                    warn!("resuming after fault");
                    self.state = self.state.transition(Event::Resume);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Park motors, close the log and enter `Terminated`
    fn shutdown(&mut self) -> Result<(), LogError> {
        if let Err(fault) = self.sequencer.park(&mut self.delay) {
            warn!("park failed: {}", fault);
        }

        let closed = self.log.close();
        if let Err(err) = closed {
            error!("readings log close failed: {}", err);
        }

        // Stop and fault paths both end in Terminated
        self.state = self.state.transition(Event::Halt);
        closed
    }

    /// Current state machine state
    pub fn state(&self) -> State {
        self.state
    }

    /// Counters so far
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn counter(&self) -> &CubeCounter {
        &self.counter
    }

    pub fn sequencer(&self) -> &MotionSequencer<M, N> {
        &self.sequencer
    }

    pub fn sensor(&self) -> &C {
        &self.sensor
    }

    pub fn log(&self) -> &L {
        &self.log
    }
}
