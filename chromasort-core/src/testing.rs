//! Test doubles for the hardware collaborator traits
//!
//! Motors and the delay share one journal so tests can assert on the exact
//! interleaving of commands and settle delays.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;

use crate::traits::{ColorSensor, HardwareError, MotorChannel, Rgb, TriggerSensor};

/// One observable hardware interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Absolute(u8, i32),
    Relative(u8, i32),
    SpeedLimit(u8, u16),
    ResetEncoder(u8),
    Pulse(u8),
    Delay(u32),
}

pub type Journal = Rc<RefCell<Vec<Call>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

/// Motor that journals every command and can fail after N commands
pub struct MockMotor {
    id: u8,
    pub position: i32,
    pub speed_limit: u16,
    journal: Journal,
    fail_after: Option<u32>,
    fail_at: Option<u32>,
    issued: u32,
    attempts: u32,
    pulses_per_move: u32,
    pulses_left: u32,
}

impl MockMotor {
    pub fn new(id: u8, journal: &Journal) -> Self {
        Self {
            id,
            position: 0,
            speed_limit: 0,
            journal: journal.clone(),
            fail_after: None,
            fail_at: None,
            issued: 0,
            attempts: 0,
            pulses_per_move: 0,
            pulses_left: 0,
        }
    }

    /// Accept `n` commands, then fail every command after that
    pub fn failing_after(mut self, n: u32) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Emit `n` journaled pulses, 100 us apart, for every started move
    pub fn with_pulses(mut self, n: u32) -> Self {
        self.pulses_per_move = n;
        self
    }

    /// Fail only the `n`th command (1-based); every other command succeeds
    pub fn failing_at(mut self, n: u32) -> Self {
        self.fail_at = Some(n);
        self
    }

    fn issue(&mut self, call: Call) -> Result<(), HardwareError> {
        self.attempts += 1;
        if self.fail_at == Some(self.attempts) {
            return Err(HardwareError::Bus);
        }
        if let Some(limit) = self.fail_after {
            if self.issued >= limit {
                return Err(HardwareError::Bus);
            }
        }
        self.issued += 1;
        self.journal.borrow_mut().push(call);
        Ok(())
    }
}

impl MotorChannel for MockMotor {
    fn set_absolute_position(&mut self, degrees: i32) -> Result<(), HardwareError> {
        self.issue(Call::Absolute(self.id, degrees))?;
        self.position = degrees;
        Ok(())
    }

    fn set_relative_position(&mut self, delta_degrees: i32) -> Result<(), HardwareError> {
        self.issue(Call::Relative(self.id, delta_degrees))?;
        self.position += delta_degrees;
        Ok(())
    }

    fn set_speed_limit(&mut self, degrees_per_second: u16) -> Result<(), HardwareError> {
        self.issue(Call::SpeedLimit(self.id, degrees_per_second))?;
        self.speed_limit = degrees_per_second;
        Ok(())
    }

    fn reset_encoder(&mut self) -> Result<(), HardwareError> {
        self.issue(Call::ResetEncoder(self.id))?;
        self.position = 0;
        Ok(())
    }

    fn start_absolute(&mut self, degrees: i32) -> Result<(), HardwareError> {
        self.set_absolute_position(degrees)?;
        self.pulses_left = self.pulses_per_move;
        Ok(())
    }

    fn start_relative(&mut self, delta_degrees: i32) -> Result<(), HardwareError> {
        self.set_relative_position(delta_degrees)?;
        self.pulses_left = self.pulses_per_move;
        Ok(())
    }

    fn step(&mut self) -> Result<Option<u32>, HardwareError> {
        if self.pulses_left == 0 {
            return Ok(None);
        }
        self.pulses_left -= 1;
        self.journal.borrow_mut().push(Call::Pulse(self.id));
        Ok(Some(100))
    }
}

/// Delay that journals every millisecond wait
pub struct RecordingDelay {
    journal: Journal,
}

impl RecordingDelay {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
        }
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.journal.borrow_mut().push(Call::Delay(ms));
    }
}

/// Color sensor replaying a script, then repeating a fallback reading
pub struct ScriptedSensor {
    script: VecDeque<Result<Option<Rgb>, HardwareError>>,
    fallback: Option<Rgb>,
    pub reads: u32,
    pub ready_waits: u32,
}

impl ScriptedSensor {
    pub fn new(script: Vec<Result<Option<Rgb>, HardwareError>>) -> Self {
        Self {
            script: script.into(),
            fallback: None,
            reads: 0,
            ready_waits: 0,
        }
    }

    /// Sensor that always returns the same reading
    pub fn constant(reading: Rgb) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: Some(reading),
            reads: 0,
            ready_waits: 0,
        }
    }
}

impl ColorSensor for ScriptedSensor {
    fn read_rgb(&mut self) -> Result<Option<Rgb>, HardwareError> {
        self.reads += 1;
        self.script.pop_front().unwrap_or(Ok(self.fallback))
    }

    fn wait_ready(&mut self) -> Result<(), HardwareError> {
        self.ready_waits += 1;
        Ok(())
    }
}

/// Trigger replaying a script of presses, then reporting released
pub struct ScriptedTrigger {
    script: VecDeque<Result<bool, HardwareError>>,
    pub polls: u32,
}

impl ScriptedTrigger {
    pub fn new(script: Vec<Result<bool, HardwareError>>) -> Self {
        Self {
            script: script.into(),
            polls: 0,
        }
    }
}

impl TriggerSensor for ScriptedTrigger {
    fn is_pressed(&mut self) -> Result<bool, HardwareError> {
        self.polls += 1;
        self.script.pop_front().unwrap_or(Ok(false))
    }
}

/// In-memory `embedded_io` writer
#[derive(Default)]
pub struct MemSink {
    pub data: Vec<u8>,
    pub flushes: u32,
    pub fail: bool,
}

impl MemSink {
    pub fn text(&self) -> &str {
        core::str::from_utf8(&self.data).unwrap()
    }

    pub fn lines(&self) -> Vec<&str> {
        self.text().lines().collect()
    }
}

impl embedded_io::ErrorType for MemSink {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::Write for MemSink {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.fail {
            return Err(embedded_io::ErrorKind::Other);
        }
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }
}
