//! Load a card catalog from JSON. Graceful fallback to the built-in roster when the
//! configured file is missing or unusable.

use std::fs;
use std::path::Path;

use log::warn;
use serde::Deserialize;

use crate::catalog::{CardCatalog, CardDefinition, CatalogError};
use crate::config::TimingConfig;

pub const DEFAULT_CATALOG_PATH: &str = "data/cards.json";

/// On-disk catalog: `{ "cards": [...], "timing": {...} }`. `timing` is optional and
/// overrides the default resolution timings for every match built from this file.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogFile {
    pub cards: Vec<CardDefinition>,
    #[serde(default)]
    pub timing: Option<TimingConfig>,
}

pub fn parse_catalog_json(raw: &str) -> Result<(CardCatalog, Option<TimingConfig>), CatalogError> {
    let file: CatalogFile = serde_json::from_str(raw)?;
    if let Some(timing) = &file.timing {
        timing.validate()?;
    }
    let catalog = CardCatalog::new(file.cards)?;
    Ok((catalog, file.timing))
}

pub fn load_catalog_file(
    path: impl AsRef<Path>,
) -> Result<(CardCatalog, Option<TimingConfig>), CatalogError> {
    let raw = fs::read_to_string(path)?;
    parse_catalog_json(&raw)
}

/// Catalog for an optional configured path. `None` or any load failure yields the
/// built-in roster and default timing.
pub fn catalog_from_path(path: Option<&Path>) -> (CardCatalog, TimingConfig) {
    let Some(path) = path else {
        return (CardCatalog::builtin(), TimingConfig::default());
    };
    match load_catalog_file(path) {
        Ok((catalog, timing)) => (catalog, timing.unwrap_or_default()),
        Err(err) => {
            warn!(
                "catalog '{}' unusable ({err}); using built-in roster",
                path.display()
            );
            (CardCatalog::builtin(), TimingConfig::default())
        }
    }
}
