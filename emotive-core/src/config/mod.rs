//! Companion configuration
//!
//! Types plus an allocation-free parser for the embedded `companion.toml`.

pub mod parse;
pub mod types;

pub use parse::{parse_config, ParseError};
pub use types::*;
