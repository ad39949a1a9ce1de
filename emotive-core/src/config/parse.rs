//! Minimal TOML parser for `companion.toml`
//!
//! Handles only the subset the companion needs and never allocates.
//! It does NOT support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, decimal or `0x` integer, boolean)
//! - [section] headers
//! - [expression.name] headers
//! - Comments (# ...)
//!
//! NOT supported:
//! - Arrays and inline tables
//! - Multi-line strings
//! - Dotted keys outside section headers

use heapless::String as HString;

use super::types::{CompanionConfig, ExpressionConfig, SelectionMode, MAX_NAME_LEN};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid or unknown section header
    InvalidSection,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Line is neither a header, a comment nor `key = value`
    InvalidLine,
    /// Too many items (exceeded heapless capacity)
    TooManyItems,
    /// String longer than its fixed capacity
    TooLong,
}

/// Current parsing context
#[derive(Debug, Clone)]
enum Section {
    Root,
    Playback,
    Display,
    Status,
    Expression(HString<MAX_NAME_LEN>),
}

/// Parse TOML text into a [`CompanionConfig`]
///
/// Missing sections and keys keep their defaults; unknown keys are
/// ignored. The result is not validated, call
/// [`CompanionConfig::validate`] afterwards.
pub fn parse_config(input: &str) -> Result<CompanionConfig, ParseError> {
    let mut config = CompanionConfig::new();
    let mut section = Section::Root;
    let mut current_expression: Option<ExpressionConfig> = None;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            let header = strip_comment(line);
            if !header.ends_with(']') {
                return Err(ParseError::InvalidSection);
            }

            save_section(&mut config, &mut current_expression)?;
            section = parse_section_header(&header[1..header.len() - 1])?;

            if let Section::Expression(name) = &section {
                current_expression = Some(ExpressionConfig {
                    name: name.clone(),
                    ..Default::default()
                });
            }
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine)?;
        apply_value(&section, key, value, &mut config, &mut current_expression)?;
    }

    save_section(&mut config, &mut current_expression)?;

    Ok(config)
}

/// Parse section header like "playback" or "expression.happy"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    let header = header.trim();

    if let Some((kind, name)) = header.split_once('.') {
        if kind.trim() != "expression" {
            return Err(ParseError::InvalidSection);
        }
        let name = parse_string(name.trim());
        if name.is_empty() || name.contains('.') {
            return Err(ParseError::InvalidSection);
        }
        let name = HString::try_from(name).map_err(|_| ParseError::TooLong)?;
        return Ok(Section::Expression(name));
    }

    match header {
        "playback" => Ok(Section::Playback),
        "display" => Ok(Section::Display),
        "status" => Ok(Section::Status),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Remove a trailing comment that is not inside a string
fn strip_comment(text: &str) -> &str {
    let mut in_string = false;
    for (i, c) in text.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return text[..i].trim(),
            _ => {}
        }
    }
    text.trim()
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = strip_comment(value);

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

/// Parse a decimal or `0x`-prefixed integer, `_` separators allowed
fn parse_int<T: TryFrom<u64>>(value: &str) -> Result<T, ParseError> {
    let digits = strip_separators(value)?;
    let raw = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => digits.parse::<u64>(),
    }
    .map_err(|_| ParseError::InvalidValue)?;
    T::try_from(raw).map_err(|_| ParseError::InvalidValue)
}

fn strip_separators(value: &str) -> Result<HString<24>, ParseError> {
    let mut out = HString::new();
    for c in value.chars().filter(|&c| c != '_') {
        out.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    Ok(out)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse a selection mode
fn parse_selection(value: &str) -> Result<SelectionMode, ParseError> {
    match parse_string(value) {
        "random" => Ok(SelectionMode::Random),
        "sequential" => Ok(SelectionMode::Sequential),
        _ => Err(ParseError::InvalidValue),
    }
}

fn apply_value(
    section: &Section,
    key: &str,
    value: &str,
    config: &mut CompanionConfig,
    current_expression: &mut Option<ExpressionConfig>,
) -> Result<(), ParseError> {
    match section {
        Section::Playback => match key {
            "default_delay_ms" => config.playback.default_delay_ms = parse_int(value)?,
            "selection" => config.playback.selection = parse_selection(value)?,
            "pause_ms" => config.playback.pause_ms = parse_int(value)?,
            "startup" => {
                let name = HString::try_from(parse_string(value)).map_err(|_| ParseError::TooLong)?;
                config.playback.startup = Some(name);
            }
            _ => {} // Ignore unknown keys
        },
        Section::Display => match key {
            "address" => config.display.address = parse_int(value)?,
            "contrast" => config.display.contrast = parse_int(value)?,
            "flip" => config.display.flip = parse_bool(value)?,
            _ => {}
        },
        Section::Status => match key {
            "heartbeat_ms" => config.status.heartbeat_ms = parse_int(value)?,
            "fault_heartbeat_ms" => config.status.fault_heartbeat_ms = parse_int(value)?,
            _ => {}
        },
        Section::Expression(_) => {
            let e = current_expression
                .as_mut()
                .ok_or(ParseError::InvalidSection)?;
            match key {
                "file" => {
                    e.file = HString::try_from(parse_string(value)).map_err(|_| ParseError::TooLong)?
                }
                "delay_ms" => e.delay_ms = Some(parse_int(value)?),
                "enabled" => e.enabled = parse_bool(value)?,
                _ => {}
            }
        }
        Section::Root => {
            // No root-level keys
        }
    }

    Ok(())
}

/// Save the expression being built, if any
fn save_section(
    config: &mut CompanionConfig,
    current_expression: &mut Option<ExpressionConfig>,
) -> Result<(), ParseError> {
    if let Some(e) = current_expression.take() {
        config
            .expressions
            .push(e)
            .map_err(|_| ParseError::TooManyItems)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_EXPRESSIONS;

    const FULL: &str = r#"
# Companion configuration
[playback]
default_delay_ms = 80
selection = "sequential"   # cycle in order
pause_ms = 1_000
startup = "happy"

[display]
address = 0x3D
contrast = 200
flip = true

[status]
heartbeat_ms = 250
fault_heartbeat_ms = 60

[expression.happy]
file = "assets/happy.epk"
delay_ms = 90

[expression.sleepy]
file = "assets/sleepy#1.epk"
enabled = false
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(FULL).unwrap();
        assert_eq!(config.playback.default_delay_ms, 80);
        assert_eq!(config.playback.selection, SelectionMode::Sequential);
        assert_eq!(config.playback.pause_ms, 1000);
        assert_eq!(config.playback.startup.as_deref(), Some("happy"));
        assert_eq!(config.display.address, 0x3D);
        assert_eq!(config.display.contrast, 200);
        assert!(config.display.flip);
        assert_eq!(config.status.heartbeat_ms, 250);
        assert_eq!(config.status.fault_heartbeat_ms, 60);

        assert_eq!(config.expressions.len(), 2);
        let happy = &config.expressions[0];
        assert_eq!(happy.name.as_str(), "happy");
        assert_eq!(happy.file.as_str(), "assets/happy.epk");
        assert_eq!(happy.delay_ms, Some(90));
        assert!(happy.enabled);

        let sleepy = &config.expressions[1];
        assert_eq!(sleepy.file.as_str(), "assets/sleepy#1.epk");
        assert_eq!(sleepy.delay_ms, None);
        assert!(!sleepy.enabled);

        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_missing_sections_keep_defaults() {
        let config = parse_config("[expression.blink]\nfile = \"b.epk\"\n").unwrap();
        assert_eq!(config.playback.default_delay_ms, 100);
        assert_eq!(config.display.address, 0x3C);
        assert_eq!(config.expressions.len(), 1);
    }

    #[test]
    fn test_parse_section_header() {
        match parse_section_header("expression.happy").unwrap() {
            Section::Expression(name) => assert_eq!(name.as_str(), "happy"),
            _ => panic!("Wrong section type"),
        }

        match parse_section_header(" display ").unwrap() {
            Section::Display => {}
            _ => panic!("Wrong section type"),
        }

        assert_eq!(
            parse_section_header("motor.x").unwrap_err(),
            ParseError::InvalidSection
        );
        assert_eq!(
            parse_section_header("expression.").unwrap_err(),
            ParseError::InvalidSection
        );
    }

    #[test]
    fn test_parse_int_forms() {
        assert_eq!(parse_int::<u8>("0x3C"), Ok(0x3C));
        assert_eq!(parse_int::<u16>("100"), Ok(100));
        assert_eq!(parse_int::<u32>("10_000"), Ok(10_000));
        assert_eq!(parse_int::<u8>("256"), Err(ParseError::InvalidValue));
        assert_eq!(parse_int::<u8>("-1"), Err(ParseError::InvalidValue));
        assert_eq!(parse_int::<u8>("abc"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert_eq!(
            parse_config("[playback\n").unwrap_err(),
            ParseError::InvalidSection
        );
        assert_eq!(
            parse_config("[playback]\njust words\n").unwrap_err(),
            ParseError::InvalidLine
        );
        assert_eq!(
            parse_config("[display]\nflip = maybe\n").unwrap_err(),
            ParseError::InvalidValue
        );
        assert_eq!(
            parse_config("[playback]\nselection = \"shuffle\"\n").unwrap_err(),
            ParseError::InvalidValue
        );
    }

    #[test]
    fn test_too_many_expressions() {
        let mut text: heapless::String<1024> = heapless::String::new();
        for i in 0..=MAX_EXPRESSIONS {
            use core::fmt::Write;
            write!(text, "[expression.e{}]\nfile = \"e.epk\"\n", i).unwrap();
        }
        assert_eq!(parse_config(&text).unwrap_err(), ParseError::TooManyItems);
    }

    #[test]
    fn test_name_too_long() {
        let text = "[expression.a_really_long_expression_name]\n";
        assert_eq!(parse_config(text).unwrap_err(), ParseError::TooLong);
    }
}
