//! Configuration loading
//!
//! Parses the embedded companion.toml and turns the compiled-in packs
//! into the expression catalog.

pub mod loader;

pub use loader::{build_catalog, load_config};
