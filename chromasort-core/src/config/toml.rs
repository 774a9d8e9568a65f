//! Simple TOML parser for sorter configuration
//!
//! This is a minimal line-based parser that handles only the subset needed
//! for the sorter configuration. It does NOT support the full TOML grammar and
//! needs no allocator.
//!
//! Supported features:
//! - Key = value pairs (string, integer, float, boolean)
//! - Integer arrays on one line: `slot_offsets = [-90, -130]`
//! - [section] and [section.name] headers
//! - Comments (# ...), whole-line or trailing
//!
//! Motors are referenced by name and resolved to indices once the whole
//! file has been read, so `[motor.*]` sections may appear anywhere.
//!
//! ```toml
//! [sampling]
//! batch_size = 9
//! sample_delay_ms = 100
//!
//! [motor.tray_c]
//! speed_limit_dps = 1500
//!
//! [scheme]
//! type = "rotating_tray"
//! primary = "tray_c"
//!
//! [route.G]
//! tray_deg = -60
//! ```

use heapless::{String, Vec};

use super::hardware::{
    MotorConfig, PistonConfig, PistonRoute, SchemeConfig, SorterConfig, TrayConfig, MAX_SLOTS,
};
use super::types::{FaultPolicy, MAX_NAME_LEN};
use crate::classify::{centroid::LABEL_COUNT, ColorLabel};
use crate::traits::MotorId;

type Name = String<MAX_NAME_LEN>;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid section header
    InvalidSection,
    /// Invalid value type
    InvalidValue,
    /// Too many items (exceeded heapless capacity)
    TooManyItems,
    /// A motor name does not match any `[motor.*]` section
    UnknownMotor,
    /// A key required by the selected scheme is missing
    MissingKey,
}

/// Current parsing context
#[derive(Debug, Clone)]
enum Section {
    Root,
    Sampling,
    Timing,
    Log,
    Fault,
    Scheme,
    Centroid(ColorLabel),
    Motor,
    Route(ColorLabel),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemeKind {
    DedicatedPiston,
    RotatingTray,
}

/// Route keys as written, before motor names are resolved
#[derive(Debug, Clone, Default)]
struct RouteDraft {
    motor: Option<Name>,
    stroke_deg: Option<i32>,
    tray_deg: Option<i32>,
}

/// Everything read so far
struct Draft {
    config: SorterConfig,
    kind: SchemeKind,
    pistons: PistonConfig,
    tray: TrayConfig,
    primary: Option<Name>,
    mirror: Option<Name>,
    pusher: Option<Name>,
    routes: [RouteDraft; LABEL_COUNT],
    current_motor: Option<MotorConfig>,
}

/// Parse TOML configuration into a [`SorterConfig`]
///
/// Unknown keys are ignored. The result is not validated; call
/// [`SorterConfig::validate`] before use.
pub fn parse_config(input: &str) -> Result<SorterConfig, ParseError> {
    let mut draft = Draft {
        config: SorterConfig::new(),
        kind: SchemeKind::DedicatedPiston,
        pistons: PistonConfig::default(),
        tray: TrayConfig::default(),
        primary: None,
        mirror: None,
        pusher: None,
        routes: Default::default(),
        current_motor: None,
    };
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            save_motor(&mut draft)?;
            section = parse_section_header(&line[1..line.len() - 1])?;

            if let Section::Motor = section {
                let name = motor_name(&line[1..line.len() - 1])?;
                draft.current_motor = Some(MotorConfig::new(name, 0));
            }
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(&section, key, value, &mut draft)?;
        }
    }

    save_motor(&mut draft)?;
    finish(draft)
}

/// Parse section header like "sampling", "motor.tray_c" or "route.G"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    let header = header.trim();

    if let Some((kind, name)) = header.split_once('.') {
        let name = name.trim();
        return match kind.trim() {
            "motor" if !name.is_empty() => Ok(Section::Motor),
            "centroid" => ColorLabel::parse(name)
                .map(Section::Centroid)
                .ok_or(ParseError::InvalidSection),
            "route" => ColorLabel::parse(name)
                .map(Section::Route)
                .ok_or(ParseError::InvalidSection),
            _ => Err(ParseError::InvalidSection),
        };
    }

    match header {
        "sampling" => Ok(Section::Sampling),
        "timing" => Ok(Section::Timing),
        "log" => Ok(Section::Log),
        "fault" => Ok(Section::Fault),
        "scheme" => Ok(Section::Scheme),
        _ => Err(ParseError::InvalidSection),
    }
}

fn motor_name(header: &str) -> Result<&str, ParseError> {
    let (_, name) = header.split_once('.').ok_or(ParseError::InvalidSection)?;
    let name = name.trim();
    if name.len() > MAX_NAME_LEN {
        return Err(ParseError::InvalidSection);
    }
    Ok(name)
}

/// Cut a line at the first `#` outside a quoted string
fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    for (pos, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '#' if !quoted => return &line[..pos],
            _ => {}
        }
    }
    line
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let line = strip_comment(line);
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

fn parse_name(value: &str) -> Result<Name, ParseError> {
    Name::try_from(parse_string(value)).map_err(|_| ParseError::InvalidValue)
}

/// Parse an integer or float value
fn parse_num<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_fault_policy(value: &str) -> Result<FaultPolicy, ParseError> {
    match parse_string(value) {
        "halt" | "Halt" => Ok(FaultPolicy::Halt),
        "resume" | "Resume" => Ok(FaultPolicy::Resume),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_scheme_kind(value: &str) -> Result<SchemeKind, ParseError> {
    match parse_string(value) {
        "dedicated_piston" | "piston" => Ok(SchemeKind::DedicatedPiston),
        "rotating_tray" | "tray" => Ok(SchemeKind::RotatingTray),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse a one-line integer array like "[-90, -130, -180]"
fn parse_int_array(value: &str) -> Result<Vec<i32, MAX_SLOTS>, ParseError> {
    let value = value.trim();
    if !value.starts_with('[') || !value.ends_with(']') {
        return Err(ParseError::InvalidValue);
    }

    let mut items = Vec::new();
    for item in value[1..value.len() - 1].split(',') {
        let item = item.trim();
        // Trailing comma
        if item.is_empty() {
            continue;
        }
        items
            .push(parse_num(item)?)
            .map_err(|_| ParseError::TooManyItems)?;
    }
    Ok(items)
}

/// Apply a parsed value to the appropriate config field
fn apply_value(
    section: &Section,
    key: &str,
    value: &str,
    draft: &mut Draft,
) -> Result<(), ParseError> {
    let config = &mut draft.config;

    match section {
        Section::Root => {
            if key == "version" {
                config.version = parse_num(value)?;
            }
        }
        Section::Sampling => match key {
            "batch_size" => config.sampling.batch_size = parse_num(value)?,
            "sample_delay_ms" => config.sampling.sample_delay_ms = parse_num(value)?,
            _ => {}
        },
        Section::Timing => match key {
            "idle_poll_ms" => config.timing.idle_poll_ms = parse_num(value)?,
            "post_cycle_delay_ms" => config.timing.post_cycle_delay_ms = parse_num(value)?,
            _ => {}
        },
        Section::Log => match key {
            "path" => {
                config.log.path =
                    String::try_from(parse_string(value)).map_err(|_| ParseError::InvalidValue)?;
            }
            "include_label" => config.log.include_label = parse_bool(value)?,
            _ => {}
        },
        Section::Fault => {
            if key == "policy" {
                config.fault_policy = parse_fault_policy(value)?;
            }
        }
        Section::Centroid(label) => {
            let mut vector = config.centroids.vector(*label);
            match key {
                "r" => vector[0] = parse_num(value)?,
                "g" => vector[1] = parse_num(value)?,
                "b" => vector[2] = parse_num(value)?,
                _ => {}
            }
            config.centroids.set(*label, vector);
        }
        Section::Motor => {
            let m = draft
                .current_motor
                .as_mut()
                .ok_or(ParseError::InvalidSection)?;
            match key {
                "speed_limit_dps" => m.speed_limit_dps = parse_num(value)?,
                "steps_per_rev" => m.steps_per_rev = parse_num(value)?,
                _ => {}
            }
        }
        Section::Scheme => match key {
            "type" => draft.kind = parse_scheme_kind(value)?,
            "eject_settle_ms" => draft.pistons.eject_settle_ms = parse_num(value)?,
            "return_settle_ms" => draft.pistons.return_settle_ms = parse_num(value)?,
            "tray_settle_ms" => draft.tray.tray_settle_ms = parse_num(value)?,
            "push_settle_ms" => draft.tray.push_settle_ms = parse_num(value)?,
            "rest_settle_ms" => draft.tray.rest_settle_ms = parse_num(value)?,
            "primary" => draft.primary = Some(parse_name(value)?),
            "mirror" => draft.mirror = Some(parse_name(value)?),
            "pusher" => draft.pusher = Some(parse_name(value)?),
            "slot_offsets" => draft.tray.slot_offsets = parse_int_array(value)?,
            _ => {}
        },
        Section::Route(label) => {
            let route = &mut draft.routes[label.index()];
            match key {
                "motor" => route.motor = Some(parse_name(value)?),
                "stroke_deg" => route.stroke_deg = Some(parse_num(value)?),
                "tray_deg" => route.tray_deg = Some(parse_num(value)?),
                _ => {}
            }
        }
    }

    Ok(())
}

/// Save the motor section being built
fn save_motor(draft: &mut Draft) -> Result<(), ParseError> {
    if let Some(motor) = draft.current_motor.take() {
        draft
            .config
            .motors
            .push(motor)
            .map_err(|_| ParseError::TooManyItems)?;
    }
    Ok(())
}

fn resolve(config: &SorterConfig, name: Option<&Name>) -> Result<MotorId, ParseError> {
    let name = name.ok_or(ParseError::MissingKey)?;
    config
        .find_motor(name.as_str())
        .ok_or(ParseError::UnknownMotor)
}

/// Resolve motor names and build the scheme
fn finish(mut draft: Draft) -> Result<SorterConfig, ParseError> {
    let mut config = draft.config;

    config.scheme = match draft.kind {
        SchemeKind::DedicatedPiston => {
            for label in ColorLabel::ALL {
                let route = &draft.routes[label.index()];
                if route.motor.is_none() {
                    // A stroke with no piston to drive it is a broken route
                    if route.stroke_deg.is_some() {
                        return Err(ParseError::MissingKey);
                    }
                    continue;
                }
                draft.pistons.routes[label.index()] = Some(PistonRoute {
                    motor: resolve(&config, route.motor.as_ref())?,
                    stroke_deg: route.stroke_deg.ok_or(ParseError::MissingKey)?,
                });
            }
            SchemeConfig::DedicatedPiston(draft.pistons)
        }
        SchemeKind::RotatingTray => {
            draft.tray.primary = resolve(&config, draft.primary.as_ref())?;
            draft.tray.mirror = resolve(&config, draft.mirror.as_ref())?;
            draft.tray.pusher = resolve(&config, draft.pusher.as_ref())?;
            for label in ColorLabel::ALL {
                draft.tray.angles[label.index()] = draft.routes[label.index()].tray_deg;
            }
            SchemeConfig::RotatingTray(draft.tray)
        }
    };

    Ok(config)
}
