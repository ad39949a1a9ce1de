//! Config and catalog loading
//!
//! build.rs has already validated companion.toml, so a parse failure here
//! means the parser and the build check disagree. The firmware then keeps
//! running on built-in defaults rather than showing nothing.

use defmt::*;

use emotive_core::catalog::{Catalog, CatalogEntry};
use emotive_core::config::{parse_config, CompanionConfig};
use emotive_core::frame::FrameStore;
use emotive_core::traits::SeededRandom;
use emotive_display::FRAME_BYTES;

use crate::assets::EXPRESSIONS;

/// Embedded configuration (compiled into firmware)
/// Edit companion.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../../companion.toml");

/// Parse and validate the embedded configuration
pub fn load_config() -> CompanionConfig {
    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            error!("Using built-in defaults");
            return CompanionConfig::default();
        }
    };

    if let Err(e) = config.validate() {
        error!("Embedded config is invalid: {:?}", e);
        error!("Using built-in defaults");
        return CompanionConfig::default();
    }

    info!(
        "Config: {} expressions, selection {}, pause {} ms",
        config.expressions.len(),
        config.playback.selection,
        config.playback.pause_ms
    );
    config
}

/// Validate every embedded pack and collect the usable ones
///
/// Packs that fail to parse or do not match the panel size are skipped
/// with an error; the rest still play.
pub fn build_catalog(config: &CompanionConfig, rng: SeededRandom) -> Catalog<'static, SeededRandom> {
    let mut catalog = Catalog::new(rng);

    for &(name, bytes) in EXPRESSIONS {
        let expression = config.expression(name);
        if expression.is_some_and(|e| !e.enabled) {
            debug!("Expression {} disabled", name);
            continue;
        }

        let store = match FrameStore::from_pack(bytes) {
            Ok(store) => store,
            Err(e) => {
                error!("Skipping expression {}: {:?}", name, e);
                continue;
            }
        };

        if store.byte_len() != FRAME_BYTES {
            let (w, h) = store.dimensions();
            error!("Skipping expression {}: {}x{} does not fit the panel", name, w, h);
            continue;
        }

        let store = match expression.and_then(|e| e.delay_ms) {
            Some(delay) => store.with_fallback_delay(delay),
            None => store,
        };

        info!(
            "Expression {}: {} frames, {} deltas, {}/{} bytes",
            name,
            store.frame_count(),
            store.total_deltas(),
            store.stored_bytes(),
            store.full_bytes()
        );

        if catalog.push(CatalogEntry::new(name, store)).is_err() {
            warn!("Catalog full, ignoring {} and later expressions", name);
            break;
        }
    }

    if catalog.count() == 0 {
        error!("No playable expressions");
    }

    catalog
}
