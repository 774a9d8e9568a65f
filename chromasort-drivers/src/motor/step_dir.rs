//! Step/dir stepper channel
//!
//! Drives a stepper through a STEP and DIR pin pair and tracks position in
//! microsteps from the encoder zero. `set_*` moves block until the last
//! pulse, paced by the speed limit. `start_*` only sets the target and
//! direction; the caller then emits pulses with `step` and owns the pacing,
//! which lets several channels run one grouped move.
//!
//! ```ignore
//! let mut motor = StepDirMotor::new(step, dir, Delay, StepDirConfig::default());
//! motor.set_speed_limit(1500)?;
//! motor.reset_encoder()?;
//! motor.set_absolute_position(-60)?;
//! ```

use chromasort_core::config::MotorConfig;
use chromasort_core::traits::{HardwareError, MotorChannel};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// Shortest step period the driver accepts
const MIN_STEP_PERIOD_US: u32 = 4;

/// Step period used when no speed limit is set
const UNLIMITED_STEP_PERIOD_US: u32 = 50;

/// STEP high time
const STEP_PULSE_US: u32 = 2;

/// Step/dir channel configuration
#[derive(Debug, Clone)]
pub struct StepDirConfig {
    /// Microsteps per output shaft revolution
    pub steps_per_rev: u32,
    /// Invert the DIR pin so positive degrees step with DIR low
    pub invert_dir: bool,
}

impl Default for StepDirConfig {
    fn default() -> Self {
        Self {
            steps_per_rev: 200 * 16,
            invert_dir: false,
        }
    }
}

impl StepDirConfig {
    /// Channel configuration for a configured motor
    pub fn from_motor(motor: &MotorConfig) -> Self {
        Self {
            steps_per_rev: motor.steps_per_rev,
            ..Self::default()
        }
    }

    /// Convert degrees to microsteps, rounding to nearest
    pub fn degrees_to_steps(&self, degrees: i32) -> i64 {
        let scaled = i64::from(degrees) * i64::from(self.steps_per_rev);
        let half = if scaled < 0 { -180 } else { 180 };
        (scaled + half) / 360
    }

    /// Convert microsteps to whole degrees, rounding toward zero
    pub fn steps_to_degrees(&self, steps: i64) -> i32 {
        if self.steps_per_rev == 0 {
            return 0;
        }
        (steps * 360 / i64::from(self.steps_per_rev)) as i32
    }

    /// Step period in microseconds for a speed limit in degrees per second
    pub fn step_period_us(&self, degrees_per_second: u16) -> u32 {
        if degrees_per_second == 0 {
            return UNLIMITED_STEP_PERIOD_US;
        }
        let steps_per_second =
            u64::from(degrees_per_second) * u64::from(self.steps_per_rev) / 360;
        if steps_per_second == 0 {
            return u32::MAX;
        }
        let period = (1_000_000 / steps_per_second).min(u64::from(u32::MAX)) as u32;
        period.max(MIN_STEP_PERIOD_US)
    }
}

/// Stepper channel on a STEP/DIR pin pair
pub struct StepDirMotor<STEP, DIR, D> {
    step: STEP,
    dir: DIR,
    delay: D,
    config: StepDirConfig,
    /// Position in microsteps from the encoder zero
    position: i64,
    /// Target of the move in progress
    target: i64,
    /// Microseconds per step at the current speed limit
    step_period_us: u32,
}

impl<STEP: OutputPin, DIR: OutputPin, D: DelayNs> StepDirMotor<STEP, DIR, D> {
    pub fn new(step: STEP, dir: DIR, delay: D, config: StepDirConfig) -> Self {
        Self {
            step,
            dir,
            delay,
            step_period_us: config.step_period_us(0),
            config,
            position: 0,
            target: 0,
        }
    }

    /// Position in microsteps
    pub fn position_steps(&self) -> i64 {
        self.position
    }

    /// Position in whole degrees
    pub fn position_degrees(&self) -> i32 {
        self.config.steps_to_degrees(self.position)
    }

    pub fn step_period_us(&self) -> u32 {
        self.step_period_us
    }

    pub fn config(&self) -> &StepDirConfig {
        &self.config
    }

    /// Check if a started move still has pulses to emit
    pub fn is_moving(&self) -> bool {
        self.position != self.target
    }

    fn start_to_step(&mut self, target: i64) -> Result<(), HardwareError> {
        if self.config.steps_per_rev == 0 {
            return Err(HardwareError::Rejected);
        }

        self.target = target;
        let delta = target - self.position;
        if delta == 0 {
            return Ok(());
        }

        let forward = (delta > 0) != self.config.invert_dir;
        let dir = if forward {
            self.dir.set_high()
        } else {
            self.dir.set_low()
        };
        dir.map_err(|_| HardwareError::Bus)
    }

    /// Emit one pulse toward the target
    fn pulse(&mut self) -> Result<Option<u32>, HardwareError> {
        let remaining = self.target - self.position;
        if remaining == 0 {
            return Ok(None);
        }

        self.step.set_high().map_err(|_| HardwareError::Bus)?;
        self.delay.delay_us(STEP_PULSE_US);
        self.step.set_low().map_err(|_| HardwareError::Bus)?;
        self.position += remaining.signum();

        if self.position == self.target {
            Ok(None)
        } else {
            Ok(Some(self.step_period_us.saturating_sub(STEP_PULSE_US)))
        }
    }

    fn move_to_step(&mut self, target: i64) -> Result<(), HardwareError> {
        self.start_to_step(target)?;
        while let Some(wait_us) = self.pulse()? {
            self.delay.delay_us(wait_us);
        }
        Ok(())
    }
}

impl<STEP: OutputPin, DIR: OutputPin, D: DelayNs> MotorChannel for StepDirMotor<STEP, DIR, D> {
    fn set_absolute_position(&mut self, degrees: i32) -> Result<(), HardwareError> {
        let target = self.config.degrees_to_steps(degrees);
        self.move_to_step(target)
    }

    fn set_relative_position(&mut self, delta_degrees: i32) -> Result<(), HardwareError> {
        let target = self.position + self.config.degrees_to_steps(delta_degrees);
        self.move_to_step(target)
    }

    fn set_speed_limit(&mut self, degrees_per_second: u16) -> Result<(), HardwareError> {
        if self.config.steps_per_rev == 0 {
            return Err(HardwareError::Rejected);
        }
        self.step_period_us = self.config.step_period_us(degrees_per_second);
        Ok(())
    }

    fn reset_encoder(&mut self) -> Result<(), HardwareError> {
        self.position = 0;
        self.target = 0;
        Ok(())
    }

    fn start_absolute(&mut self, degrees: i32) -> Result<(), HardwareError> {
        let target = self.config.degrees_to_steps(degrees);
        self.start_to_step(target)
    }

    fn start_relative(&mut self, delta_degrees: i32) -> Result<(), HardwareError> {
        let target = self.position + self.config.degrees_to_steps(delta_degrees);
        self.start_to_step(target)
    }

    fn step(&mut self) -> Result<Option<u32>, HardwareError> {
        self.pulse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDelay, MockPin};

    fn motor(steps_per_rev: u32) -> StepDirMotor<MockPin, MockPin, MockDelay> {
        StepDirMotor::new(
            MockPin::default(),
            MockPin::default(),
            MockDelay::default(),
            StepDirConfig {
                steps_per_rev,
                invert_dir: false,
            },
        )
    }

    #[test]
    fn test_degree_conversion() {
        let config = StepDirConfig::default();
        assert_eq!(config.degrees_to_steps(90), 800);
        assert_eq!(config.degrees_to_steps(-360), -3200);
        assert_eq!(config.steps_to_degrees(-1600), -180);

        // 200 steps/rev gives 1.8 degrees per step
        let coarse = StepDirConfig {
            steps_per_rev: 200,
            invert_dir: false,
        };
        assert_eq!(coarse.degrees_to_steps(1), 1);
        assert_eq!(coarse.degrees_to_steps(-1), -1);
    }

    #[test]
    fn test_step_period() {
        let config = StepDirConfig::default();
        // 1500 dps at 3200 steps/rev is 13333 steps/s
        assert_eq!(config.step_period_us(1500), 75);
        assert_eq!(config.step_period_us(0), UNLIMITED_STEP_PERIOD_US);
        assert_eq!(config.step_period_us(u16::MAX), MIN_STEP_PERIOD_US);
    }

    #[test]
    fn test_absolute_move() {
        let mut motor = motor(360);
        motor.set_absolute_position(30).unwrap();

        assert_eq!(motor.position_steps(), 30);
        assert_eq!(motor.step.rising_edges, 30);
        assert!(motor.dir.high);

        motor.set_absolute_position(-10).unwrap();
        assert_eq!(motor.position_degrees(), -10);
        assert_eq!(motor.step.rising_edges, 70);
        assert!(!motor.dir.high);
    }

    #[test]
    fn test_relative_move_accumulates() {
        let mut motor = motor(360);
        motor.set_relative_position(60).unwrap();
        motor.set_relative_position(-60).unwrap();
        assert_eq!(motor.position_degrees(), 0);
        assert_eq!(motor.step.rising_edges, 120);
    }

    #[test]
    fn test_reset_encoder_sets_zero() {
        let mut motor = motor(360);
        motor.set_relative_position(45).unwrap();
        motor.reset_encoder().unwrap();
        assert_eq!(motor.position_degrees(), 0);

        motor.set_absolute_position(0).unwrap();
        assert_eq!(motor.step.rising_edges, 45);
    }

    #[test]
    fn test_speed_limit_paces_steps() {
        let mut motor = motor(360);
        motor.set_speed_limit(500).unwrap();
        assert_eq!(motor.step_period_us(), 2000);

        motor.set_relative_position(10).unwrap();
        // Ten pulses, nine gaps; the gap after the last pulse is skipped
        let expected_us = 10 * STEP_PULSE_US + 9 * (2000 - STEP_PULSE_US);
        assert_eq!(motor.delay.total_ns, u64::from(expected_us) * 1000);
    }

    #[test]
    fn test_started_move_pulses_on_demand() {
        let mut motor = motor(360);
        motor.set_speed_limit(500).unwrap();
        motor.start_absolute(-3).unwrap();

        assert!(!motor.dir.high);
        assert_eq!(motor.step.rising_edges, 0);
        assert!(motor.is_moving());

        assert_eq!(motor.step(), Ok(Some(2000 - STEP_PULSE_US)));
        assert_eq!(motor.step(), Ok(Some(2000 - STEP_PULSE_US)));
        assert_eq!(motor.step(), Ok(None));
        assert_eq!(motor.step(), Ok(None));

        assert_eq!(motor.step.rising_edges, 3);
        assert_eq!(motor.position_degrees(), -3);
        assert!(!motor.is_moving());
        // Pacing between pulses is left to the caller
        assert_eq!(motor.delay.total_ns, u64::from(3 * STEP_PULSE_US) * 1000);
    }

    #[test]
    fn test_two_channels_interleave() {
        let mut first = motor(360);
        let mut second = motor(360);
        first.start_absolute(2).unwrap();
        second.start_absolute(-2).unwrap();

        let mut edges = Vec::new();
        while first.is_moving() || second.is_moving() {
            first.step().unwrap();
            second.step().unwrap();
            edges.push((first.step.rising_edges, second.step.rising_edges));
        }

        assert_eq!(edges, vec![(1, 1), (2, 2)]);
        assert_eq!(first.position_degrees(), 2);
        assert_eq!(second.position_degrees(), -2);
    }

    #[test]
    fn test_inverted_direction() {
        let mut motor = motor(360);
        motor.config.invert_dir = true;
        motor.dir.high = true;
        motor.set_relative_position(5).unwrap();
        assert!(!motor.dir.high);
    }

    #[test]
    fn test_zero_steps_per_rev_rejected() {
        let mut motor = motor(0);
        assert_eq!(motor.set_relative_position(10), Err(HardwareError::Rejected));
        assert_eq!(motor.set_speed_limit(100), Err(HardwareError::Rejected));
    }

    #[test]
    fn test_pin_failure_is_bus_fault() {
        let mut motor = motor(360);
        motor.step.fail = true;
        assert_eq!(motor.set_absolute_position(10), Err(HardwareError::Bus));
        assert_eq!(motor.position_steps(), 0);
    }

    #[test]
    fn test_from_motor_config() {
        let motor = MotorConfig::new("tray_c", 1500);
        let config = StepDirConfig::from_motor(&motor);
        assert_eq!(config.steps_per_rev, motor.steps_per_rev);
    }
}
