//! Build script for emotive-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates companion.toml at compile time
//! - Embeds every enabled expression pack via a generated table

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Must match `emotive_core::frame::PACK_MAGIC`
const PACK_MAGIC: &[u8; 4] = b"EPK1";

/// Must match `emotive_core::config::MAX_NAME_LEN` / `MAX_EXPRESSIONS`
const MAX_NAME_LEN: usize = 16;
const MAX_EXPRESSIONS: usize = 16;

fn main() {
    setup_linker();
    let config = validate_config();
    generate_expression_table(&config);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate companion.toml configuration at compile time
fn validate_config() -> toml::Value {
    println!("cargo:rerun-if-changed=companion.toml");

    let config_path = Path::new("companion.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: companion.toml not found!                                ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a companion.toml configuration file.      ║\n\
            ║  Please create one in the emotive-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read companion.toml                            ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in companion.toml                    ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    validate_settings(&config);
    validate_expressions(&config);

    println!("cargo:warning=companion.toml validated successfully");
    config
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Panic with a boxed list of errors, if any
fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
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
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Validate [playback], [display] and [status]
fn validate_settings(config: &toml::Value) {
    let mut errors = Vec::new();

    let int_in = |section: &str, key: &str, min: i64, max: i64, errors: &mut Vec<String>| {
        match config.get(section).and_then(|s| s.get(key)) {
            Some(toml::Value::Integer(v)) if (min..=max).contains(v) => {}
            Some(toml::Value::Integer(_)) => {
                errors.push(format!("[{}] {} must be {}-{}", section, key, min, max))
            }
            Some(_) => errors.push(format!("[{}] {} must be an integer", section, key)),
            None => {}
        }
    };

    int_in("playback", "default_delay_ms", 1, u16::MAX as i64, &mut errors);
    int_in("playback", "pause_ms", 0, u32::MAX as i64, &mut errors);
    int_in("display", "address", 0x08, 0x77, &mut errors);
    int_in("display", "contrast", 0, 255, &mut errors);
    int_in("status", "heartbeat_ms", 1, u32::MAX as i64, &mut errors);
    int_in("status", "fault_heartbeat_ms", 1, u32::MAX as i64, &mut errors);

    if let Some(selection) = config.get("playback").and_then(|p| p.get("selection")) {
        match selection.as_str() {
            Some("random") | Some("sequential") => {}
            _ => errors.push("[playback] selection must be 'random' or 'sequential'".to_string()),
        }
    }

    if let Some(flip) = config.get("display").and_then(|d| d.get("flip")) {
        if !flip.is_bool() {
            errors.push("[display] flip must be true or false".to_string());
        }
    }

    report("Invalid settings in companion.toml", &errors);
}

/// Validate [expression.*] sections and their pack files
fn validate_expressions(config: &toml::Value) {
    let expressions = match config.get("expression") {
        Some(toml::Value::Table(t)) if !t.is_empty() => t,
        _ => {
            report(
                "Missing sections in companion.toml",
                &["Missing [expression.*] - at least one expression is required".to_string()],
            );
            return;
        }
    };

    let mut errors = Vec::new();
    let mut enabled = Vec::new();

    if expressions.len() > MAX_EXPRESSIONS {
        errors.push(format!("at most {} expressions are supported", MAX_EXPRESSIONS));
    }

    for (name, expr) in expressions {
        let expr = match expr {
            toml::Value::Table(t) => t,
            _ => {
                errors.push(format!("[expression.{}] must be a table", name));
                continue;
            }
        };

        if name.len() > MAX_NAME_LEN {
            errors.push(format!("[expression.{}] name longer than {}", name, MAX_NAME_LEN));
        }

        if let Some(delay) = expr.get("delay_ms") {
            match delay.as_integer() {
                Some(d) if (1..=u16::MAX as i64).contains(&d) => {}
                _ => errors.push(format!("[expression.{}] delay_ms must be 1-65535", name)),
            }
        }

        let is_enabled = match expr.get("enabled") {
            None => true,
            Some(toml::Value::Boolean(b)) => *b,
            Some(_) => {
                errors.push(format!("[expression.{}] enabled must be true or false", name));
                false
            }
        };

        let file = match expr.get("file") {
            Some(toml::Value::String(f)) => f,
            _ => {
                errors.push(format!("[expression.{}] missing 'file'", name));
                continue;
            }
        };

        println!("cargo:rerun-if-changed={}", file);
        match fs::read(file) {
            Ok(bytes) if bytes.starts_with(PACK_MAGIC) => {}
            Ok(_) => errors.push(format!("[expression.{}] {} is not a delta pack", name, file)),
            Err(_) => errors.push(format!("[expression.{}] cannot read {}", name, file)),
        }

        if is_enabled {
            enabled.push(name.clone());
        }
    }

    if enabled.is_empty() {
        errors.push("no enabled expression".to_string());
    }

    if let Some(startup) = config.get("playback").and_then(|p| p.get("startup")) {
        match startup.as_str() {
            Some(s) if enabled.iter().any(|n| n == s) => {}
            _ => errors.push("[playback] startup must name an enabled expression".to_string()),
        }
    }

    report("Invalid expression configuration", &errors);
}

/// Write `expressions.rs` with one `include_bytes!` per enabled expression
fn generate_expression_table(config: &toml::Value) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());

    let mut source = String::from(
        "/// Expression packs from companion.toml, in file order\n\
         pub static EXPRESSIONS: &[(&str, &[u8])] = &[\n",
    );

    if let Some(toml::Value::Table(expressions)) = config.get("expression") {
        for (name, expr) in expressions {
            let enabled = expr.get("enabled").and_then(|e| e.as_bool()).unwrap_or(true);
            let file = expr.get("file").and_then(|f| f.as_str());
            if let (true, Some(file)) = (enabled, file) {
                let path = manifest_dir.join(file);
                source.push_str(&format!(
                    "    ({:?}, include_bytes!({:?})),\n",
                    name,
                    path.display().to_string()
                ));
            }
        }
    }

    source.push_str("];\n");

    let mut f = File::create(out_dir.join("expressions.rs")).unwrap();
    f.write_all(source.as_bytes()).unwrap();
}
