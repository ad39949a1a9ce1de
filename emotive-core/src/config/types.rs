//! Configuration type definitions
//!
//! These types represent the companion's configuration as read from
//! `companion.toml`.

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::playback::DEFAULT_FRAME_DELAY_MS;

/// Maximum expression name length
pub const MAX_NAME_LEN: usize = 16;

/// Maximum pack file path length
pub const MAX_PATH_LEN: usize = 48;

/// Maximum expressions per config (and per catalog)
pub const MAX_EXPRESSIONS: usize = 16;

/// How the next expression is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SelectionMode {
    /// Uniform random pick each time
    #[default]
    Random,
    /// Catalog order, wrapping around
    Sequential,
}

impl SelectionMode {
    /// The other mode
    pub fn toggled(self) -> Self {
        match self {
            SelectionMode::Random => SelectionMode::Sequential,
            SelectionMode::Sequential => SelectionMode::Random,
        }
    }
}

/// Playback configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaybackConfig {
    /// Per-frame delay for packs without a delay table (ms)
    pub default_delay_ms: u16,
    /// Selection mode at boot
    pub selection: SelectionMode,
    /// Idle time between two animations (ms)
    pub pause_ms: u32,
    /// Expression played first after boot
    pub startup: Option<String<MAX_NAME_LEN>>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_delay_ms: DEFAULT_FRAME_DELAY_MS,
            selection: SelectionMode::Random,
            pause_ms: 400,
            startup: None,
        }
    }
}

/// OLED panel configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayConfig {
    /// 7-bit I2C address
    pub address: u8,
    /// Contrast (0-255)
    pub contrast: u8,
    /// Rotate the picture by 180 degrees
    pub flip: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            address: 0x3C,
            contrast: 0xCF,
            flip: false,
        }
    }
}

/// Status LED configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusConfig {
    /// LED toggle period (ms)
    pub heartbeat_ms: u32,
    /// LED toggle period while the panel is not responding (ms)
    pub fault_heartbeat_ms: u32,
}

impl StatusConfig {
    /// Toggle period for the current panel state
    pub fn period_ms(&self, panel_fault: bool) -> u32 {
        if panel_fault {
            self.fault_heartbeat_ms
        } else {
            self.heartbeat_ms
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            heartbeat_ms: 500,
            fault_heartbeat_ms: 100,
        }
    }
}

/// One expression (animation) entry
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExpressionConfig {
    /// Expression name, e.g. "happy"
    pub name: String<MAX_NAME_LEN>,
    /// Pack file, relative to the firmware crate
    pub file: String<MAX_PATH_LEN>,
    /// Fallback per-frame delay for this expression (ms)
    pub delay_ms: Option<u16>,
    /// Include in selection
    pub enabled: bool,
}

impl Default for ExpressionConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            file: String::new(),
            delay_ms: None,
            enabled: true,
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// No enabled `[expression.*]` section
    NoExpressions,
    /// Two expressions share a name
    DuplicateExpression,
    /// A delay or period of zero
    ZeroDelay,
    /// I2C address outside 0x08..=0x77
    InvalidAddress,
    /// `startup` names no enabled expression
    UnknownStartup,
}

/// Complete companion configuration
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompanionConfig {
    pub playback: PlaybackConfig,
    pub display: DisplayConfig,
    pub status: StatusConfig,
    pub expressions: Vec<ExpressionConfig, MAX_EXPRESSIONS>,
}

impl CompanionConfig {
    /// Create a config with defaults and no expressions
    pub fn new() -> Self {
        Self::default()
    }

    /// Expressions that take part in selection
    pub fn enabled_expressions(&self) -> impl Iterator<Item = &ExpressionConfig> {
        self.expressions.iter().filter(|e| e.enabled)
    }

    /// Find an expression by name
    pub fn expression(&self, name: &str) -> Option<&ExpressionConfig> {
        self.expressions.iter().find(|e| e.name.as_str() == name)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled_expressions().next().is_none() {
            return Err(ConfigError::NoExpressions);
        }

        for (i, expr) in self.expressions.iter().enumerate() {
            if self.expressions[..i].iter().any(|e| e.name == expr.name) {
                return Err(ConfigError::DuplicateExpression);
            }
            if expr.delay_ms == Some(0) {
                return Err(ConfigError::ZeroDelay);
            }
        }

        if self.playback.default_delay_ms == 0
            || self.status.heartbeat_ms == 0
            || self.status.fault_heartbeat_ms == 0
        {
            return Err(ConfigError::ZeroDelay);
        }

        if !(0x08..=0x77).contains(&self.display.address) {
            return Err(ConfigError::InvalidAddress);
        }

        if let Some(startup) = &self.playback.startup {
            if !self.enabled_expressions().any(|e| e.name == *startup) {
                return Err(ConfigError::UnknownStartup);
            }
        }

        Ok(())
    }
}
