//! Expression packs embedded at build time
//!
//! `EXPRESSIONS` is generated by build.rs from the enabled
//! `[expression.*]` sections of companion.toml.

include!(concat!(env!("OUT_DIR"), "/expressions.rs"));
