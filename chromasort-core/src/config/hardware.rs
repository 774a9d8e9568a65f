//! Motor table and actuation scheme configuration
//!
//! Motors are referenced by their index in [`SorterConfig::motors`]. The TOML
//! loader resolves motor names to indices.

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::types::{
    ConfigError, FaultPolicy, LogConfig, SamplingConfig, TimingConfig, MAX_NAME_LEN,
};
use crate::classify::{centroid::LABEL_COUNT, CentroidTable, ColorLabel};
use crate::traits::MotorId;

/// Maximum motors per config
pub const MAX_MOTORS: usize = 4;

/// Maximum delivery slots for the rotating tray
pub const MAX_SLOTS: usize = 8;

/// One position-controlled motor
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotorConfig {
    /// Motor name (e.g., "piston_r", "tray", "pusher")
    pub name: String<MAX_NAME_LEN>,
    /// Speed limit applied at startup (degrees/s, 0 = unlimited)
    pub speed_limit_dps: u16,
    /// Microsteps per output shaft revolution (step/dir drivers only)
    pub steps_per_rev: u32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            speed_limit_dps: 0,
            steps_per_rev: 200 * 16,
        }
    }
}

impl MotorConfig {
    /// Create a motor entry; names longer than the limit are truncated
    pub fn new(name: &str, speed_limit_dps: u16) -> Self {
        let mut config = Self {
            speed_limit_dps,
            ..Self::default()
        };
        for c in name.chars() {
            if config.name.push(c).is_err() {
                break;
            }
        }
        config
    }
}

/// Piston assigned to one label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PistonRoute {
    pub motor: MotorId,
    /// Relative stroke out and back (degrees)
    pub stroke_deg: i32,
}

/// Dedicated piston scheme: one piston per routed label
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PistonConfig {
    /// Route per label in R, G, B, Y order
    pub routes: [Option<PistonRoute>; LABEL_COUNT],
    /// Settle after the outward stroke (ms)
    pub eject_settle_ms: u32,
    /// Settle after the return stroke (ms)
    pub return_settle_ms: u32,
}

impl Default for PistonConfig {
    fn default() -> Self {
        Self {
            routes: [None; LABEL_COUNT],
            eject_settle_ms: 1000,
            return_settle_ms: 1000,
        }
    }
}

impl PistonConfig {
    pub fn route(&self, label: ColorLabel) -> Option<PistonRoute> {
        self.routes[label.index()]
    }
}

/// Rotating tray scheme: two mirrored tray motors and an indexed pusher
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrayConfig {
    /// Tray motor driven to `+angle`
    pub primary: MotorId,
    /// Tray motor driven to `-angle`
    pub mirror: MotorId,
    /// Pusher advancing by the slot offset
    pub pusher: MotorId,
    /// Absolute tray angle per label in R, G, B, Y order
    pub angles: [Option<i32>; LABEL_COUNT],
    /// Relative pusher travel per cube index (degrees)
    pub slot_offsets: Vec<i32, MAX_SLOTS>,
    /// Settle after the tray rotation (ms)
    pub tray_settle_ms: u32,
    /// Settle after the push (ms)
    pub push_settle_ms: u32,
    /// Settle after returning to rest (ms)
    pub rest_settle_ms: u32,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            primary: MotorId(0),
            mirror: MotorId(1),
            pusher: MotorId(2),
            angles: [None; LABEL_COUNT],
            slot_offsets: Vec::new(),
            tray_settle_ms: 2000,
            push_settle_ms: 2000,
            rest_settle_ms: 0,
        }
    }
}

impl TrayConfig {
    pub fn angle(&self, label: ColorLabel) -> Option<i32> {
        self.angles[label.index()]
    }

    pub fn slot_count(&self) -> usize {
        self.slot_offsets.len()
    }
}

/// Actuation scheme selector
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SchemeConfig {
    DedicatedPiston(PistonConfig),
    RotatingTray(TrayConfig),
}

impl Default for SchemeConfig {
    fn default() -> Self {
        SchemeConfig::DedicatedPiston(PistonConfig::default())
    }
}

/// Complete sorter configuration
///
/// This is the top-level configuration structure handed to the request
/// loop at startup. It is read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SorterConfig {
    /// Configuration version for compatibility checks
    pub version: u8,
    pub sampling: SamplingConfig,
    pub timing: TimingConfig,
    pub log: LogConfig,
    pub fault_policy: FaultPolicy,
    /// Reference vectors for classification
    pub centroids: CentroidTable,
    /// Motor table, indexed by [`MotorId`]
    pub motors: Vec<MotorConfig, MAX_MOTORS>,
    pub scheme: SchemeConfig,
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            sampling: SamplingConfig::default(),
            timing: TimingConfig::default(),
            log: LogConfig::default(),
            fault_policy: FaultPolicy::default(),
            centroids: CentroidTable::default(),
            motors: Vec::new(),
            scheme: SchemeConfig::default(),
        }
    }
}

impl SorterConfig {
    /// Create a new configuration with an empty motor table
    pub fn new() -> Self {
        Self::default()
    }

    /// Three dedicated pistons for red, green and blue
    pub fn piston_rig() -> Self {
        let mut config = Self::new();
        for (name, dps) in [("piston_r", 5500), ("piston_g", 5500), ("piston_b", 6500)] {
            let _ = config.motors.push(MotorConfig::new(name, dps));
        }

        let mut pistons = PistonConfig::default();
        pistons.routes[ColorLabel::Red.index()] = Some(PistonRoute {
            motor: MotorId(0),
            stroke_deg: 60,
        });
        pistons.routes[ColorLabel::Green.index()] = Some(PistonRoute {
            motor: MotorId(1),
            stroke_deg: 80,
        });
        pistons.routes[ColorLabel::Blue.index()] = Some(PistonRoute {
            motor: MotorId(2),
            stroke_deg: 90,
        });
        config.scheme = SchemeConfig::DedicatedPiston(pistons);
        config
    }

    /// Mirrored tray motors with a six-slot pusher
    pub fn tray_rig() -> Self {
        let mut config = Self::new();
        for (name, dps) in [("tray_c", 1500), ("tray_b", 1500), ("pusher", 500)] {
            let _ = config.motors.push(MotorConfig::new(name, dps));
        }

        let mut tray = TrayConfig::default();
        tray.angles[ColorLabel::Red.index()] = Some(0);
        tray.angles[ColorLabel::Green.index()] = Some(-60);
        tray.angles[ColorLabel::Blue.index()] = Some(50);
        for offset in [-90, -130, -180, -250, -280, -360] {
            let _ = tray.slot_offsets.push(offset);
        }
        config.scheme = SchemeConfig::RotatingTray(tray);
        config
    }

    /// Find a motor by name
    pub fn find_motor(&self, name: &str) -> Option<MotorId> {
        self.motors
            .iter()
            .position(|m| m.name.as_str() == name)
            .map(|i| MotorId(i as u8))
    }

    /// Motor entry for an id
    pub fn motor(&self, id: MotorId) -> Option<&MotorConfig> {
        self.motors.get(id.index())
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling.batch_size == 0 {
            return Err(ConfigError::EmptyBatch);
        }
        if self.motors.is_empty() {
            return Err(ConfigError::NoMotors);
        }

        for (i, motor) in self.motors.iter().enumerate() {
            if self.motors[..i].iter().any(|m| m.name == motor.name) {
                return Err(ConfigError::DuplicateMotor);
            }
        }

        match &self.scheme {
            SchemeConfig::DedicatedPiston(pistons) => {
                let mut seen: Vec<MotorId, LABEL_COUNT> = Vec::new();
                for route in pistons.routes.iter().flatten() {
                    self.check_motor(route.motor)?;
                    if seen.contains(&route.motor) {
                        return Err(ConfigError::SharedMotor(route.motor.0));
                    }
                    let _ = seen.push(route.motor);
                }
            }
            SchemeConfig::RotatingTray(tray) => {
                let roles = [tray.primary, tray.mirror, tray.pusher];
                for (i, motor) in roles.iter().enumerate() {
                    self.check_motor(*motor)?;
                    if roles[..i].contains(motor) {
                        return Err(ConfigError::SharedMotor(motor.0));
                    }
                }
                if tray.slot_offsets.is_empty() {
                    return Err(ConfigError::NoSlots);
                }
            }
        }

        Ok(())
    }

    fn check_motor(&self, id: MotorId) -> Result<(), ConfigError> {
        if id.index() < self.motors.len() {
            Ok(())
        } else {
            Err(ConfigError::UnknownMotor(id.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let config = SorterConfig::new();
        assert!(config.motors.is_empty());
        assert_eq!(config.validate(), Err(ConfigError::NoMotors));
    }

    #[test]
    fn test_rig_presets_valid() {
        assert_eq!(SorterConfig::piston_rig().validate(), Ok(()));
        assert_eq!(SorterConfig::tray_rig().validate(), Ok(()));
    }

    #[test]
    fn test_find_motor() {
        let config = SorterConfig::tray_rig();
        assert_eq!(config.find_motor("pusher"), Some(MotorId(2)));
        assert_eq!(config.find_motor("lift"), None);
        assert_eq!(config.motor(MotorId(0)).map(|m| m.speed_limit_dps), Some(1500));
    }

    #[test]
    fn test_zero_batch_rejected() {
        let mut config = SorterConfig::piston_rig();
        config.sampling.batch_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::EmptyBatch));
    }

    #[test]
    fn test_duplicate_motor_name() {
        let mut config = SorterConfig::piston_rig();
        config.motors[2] = MotorConfig::new("piston_r", 100);
        assert_eq!(config.validate(), Err(ConfigError::DuplicateMotor));
    }

    #[test]
    fn test_piston_shared_motor() {
        let mut config = SorterConfig::piston_rig();
        if let SchemeConfig::DedicatedPiston(pistons) = &mut config.scheme {
            pistons.routes[ColorLabel::Yellow.index()] = Some(PistonRoute {
                motor: MotorId(0),
                stroke_deg: 45,
            });
        }
        assert_eq!(config.validate(), Err(ConfigError::SharedMotor(0)));
    }

    #[test]
    fn test_piston_unknown_motor() {
        let mut config = SorterConfig::piston_rig();
        if let SchemeConfig::DedicatedPiston(pistons) = &mut config.scheme {
            pistons.routes[ColorLabel::Yellow.index()] = Some(PistonRoute {
                motor: MotorId(3),
                stroke_deg: 45,
            });
        }
        assert_eq!(config.validate(), Err(ConfigError::UnknownMotor(3)));
    }

    #[test]
    fn test_tray_requires_slots_and_distinct_roles() {
        let mut config = SorterConfig::tray_rig();
        if let SchemeConfig::RotatingTray(tray) = &mut config.scheme {
            tray.slot_offsets.clear();
        }
        assert_eq!(config.validate(), Err(ConfigError::NoSlots));

        let mut config = SorterConfig::tray_rig();
        if let SchemeConfig::RotatingTray(tray) = &mut config.scheme {
            tray.mirror = tray.primary;
        }
        assert_eq!(config.validate(), Err(ConfigError::SharedMotor(0)));
    }

    #[test]
    fn test_long_motor_name_truncated() {
        let motor = MotorConfig::new("a_very_long_motor_name", 10);
        assert_eq!(motor.name.len(), MAX_NAME_LEN);
    }
}
