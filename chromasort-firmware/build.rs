//! Build script for chromasort-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates sorter.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const LABELS: [&str; 8] = ["R", "G", "B", "Y", "red", "green", "blue", "yellow"];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate sorter.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=sorter.toml");

    let config_path = Path::new("sorter.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: sorter.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds sorter.toml as its rig configuration.       ║\n\
            ║  Please create one in the chromasort-firmware directory.         ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read sorter.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in sorter.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    validate_sampling(&config);
    validate_centroids(&config);
    let motors = validate_motors(&config);
    validate_scheme(&config, &motors);

    println!("cargo:warning=sorter.toml validated successfully");
}

/// Abort the build with a boxed list of errors
fn fail(title: &str, errors: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| {
                let truncated = if e.len() > 62 {
                    format!("{}...", &e[..59])
                } else {
                    e.clone()
                };
                format!("║  • {:<62} ║", truncated)
            })
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn check(title: &str, errors: Vec<String>) {
    if !errors.is_empty() {
        fail(title, &errors);
    }
}

fn validate_sampling(config: &toml::Value) {
    let mut errors = Vec::new();

    if let Some(batch) = config.get("sampling").and_then(|s| s.get("batch_size")) {
        match batch.as_integer() {
            Some(n) if n > 0 && n <= i64::from(u16::MAX) => {}
            _ => errors.push("[sampling] batch_size must be 1-65535".to_string()),
        }
    }

    if let Some(policy) = config.get("fault").and_then(|f| f.get("policy")) {
        if !matches!(policy.as_str(), Some("halt") | Some("resume")) {
            errors.push("[fault] policy must be 'halt' or 'resume'".to_string());
        }
    }

    check("Invalid sampling configuration", errors);
}

fn validate_centroids(config: &toml::Value) {
    let centroids = match config.get("centroid") {
        Some(toml::Value::Table(t)) => t,
        _ => return,
    };

    let mut errors = Vec::new();
    for (label, centroid) in centroids {
        if !LABELS.contains(&label.as_str()) {
            errors.push(format!("[centroid.{}] unknown color label", label));
            continue;
        }
        for key in ["r", "g", "b"] {
            let valid = centroid
                .get(key)
                .map(|v| v.is_float() || v.is_integer())
                .unwrap_or(true);
            if !valid {
                errors.push(format!("[centroid.{}] '{}' must be a number", label, key));
            }
        }
    }

    check("Invalid centroid configuration", errors);
}

/// Returns the configured motor names
fn validate_motors(config: &toml::Value) -> Vec<String> {
    let motors = match config.get("motor") {
        Some(toml::Value::Table(t)) if !t.is_empty() => t,
        _ => fail(
            "Missing motors in sorter.toml",
            &["At least one [motor.*] section is required".to_string()],
        ),
    };

    let mut errors = Vec::new();
    for (name, motor) in motors {
        if name.len() > 16 {
            errors.push(format!("[motor.{}] name longer than 16 characters", name));
        }
        match motor.get("speed_limit_dps").map(toml::Value::as_integer) {
            Some(Some(dps)) if (0..=i64::from(u16::MAX)).contains(&dps) => {}
            Some(_) => errors.push(format!("[motor.{}] speed_limit_dps must be 0-65535", name)),
            None => {}
        }
    }

    check("Invalid motor configuration", errors);
    motors.keys().cloned().collect()
}

fn validate_scheme(config: &toml::Value, motors: &[String]) {
    let scheme = match config.get("scheme") {
        Some(toml::Value::Table(t)) => t,
        _ => fail(
            "Missing [scheme] section in sorter.toml",
            &["Set type = \"dedicated_piston\" or \"rotating_tray\"".to_string()],
        ),
    };
    let routes = config.get("route").and_then(|r| r.as_table());

    let mut errors = Vec::new();
    let known_motor = |errors: &mut Vec<String>, context: &str, value: Option<&toml::Value>| {
        match value.and_then(toml::Value::as_str) {
            Some(name) if motors.iter().any(|m| m == name) => {}
            Some(name) => errors.push(format!("{} references unknown motor '{}'", context, name)),
            None => errors.push(format!("{} missing motor name", context)),
        }
    };

    match scheme.get("type").and_then(toml::Value::as_str) {
        Some("dedicated_piston") | Some("piston") => {
            for (label, route) in routes.into_iter().flatten() {
                let context = format!("[route.{}]", label);
                known_motor(&mut errors, &context, route.get("motor"));
                if route.get("stroke_deg").and_then(toml::Value::as_integer).is_none() {
                    errors.push(format!("{} missing 'stroke_deg'", context));
                }
            }
        }
        Some("rotating_tray") | Some("tray") => {
            for role in ["primary", "mirror", "pusher"] {
                known_motor(&mut errors, &format!("[scheme] {}", role), scheme.get(role));
            }
            match scheme.get("slot_offsets").and_then(toml::Value::as_array) {
                Some(slots) if !slots.is_empty() && slots.len() <= 8 => {}
                _ => errors.push("[scheme] slot_offsets must list 1-8 offsets".to_string()),
            }
            for (label, route) in routes.into_iter().flatten() {
                if route.get("tray_deg").and_then(toml::Value::as_integer).is_none() {
                    errors.push(format!("[route.{}] missing 'tray_deg'", label));
                }
            }
        }
        _ => errors.push("[scheme] type must be 'dedicated_piston' or 'rotating_tray'".to_string()),
    }

    for label in routes.into_iter().flat_map(|r| r.keys()) {
        if !LABELS.contains(&label.as_str()) {
            errors.push(format!("[route.{}] unknown color label", label));
        }
    }

    check("Invalid scheme configuration", errors);
}
