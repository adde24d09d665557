// src/ingest/loader.rs

use std::fs;
use std::path::Path;

use crate::errors::Result;
use crate::ingest::model::{ImportPlan, RawImport};

/// Read an import document without validating it.
///
/// Files ending in `.json` are parsed as JSON; anything else as TOML.
pub fn load_import_from_path(path: impl AsRef<Path>) -> Result<RawImport> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let raw: RawImport = if is_json {
        serde_json::from_str(&contents)?
    } else {
        toml::from_str(&contents)?
    };

    Ok(raw)
}

/// Read and validate an import document.
pub fn load_import(path: impl AsRef<Path>) -> Result<ImportPlan> {
    let raw = load_import_from_path(path)?;
    ImportPlan::try_from(raw)
}
