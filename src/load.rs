//! Contract document loading: JSON or YAML text in, parsed contract out.
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

use crate::contract::{parse_contract, Contract};
use crate::pointer::JsonPointer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

/// Picks the wire format from the file extension; anything that is not
/// `.yaml`/`.yml` is treated as JSON.
pub fn detect_format(path: &Path) -> SourceFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => SourceFormat::Yaml,
        _ => SourceFormat::Json,
    }
}

/// Deserialize with JSON-path context in error messages.
fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

pub fn parse_document(text: &str, format: SourceFormat) -> anyhow::Result<Contract> {
    let value: serde_json::Value = match format {
        SourceFormat::Json => {
            from_str_with_path(text).map_err(|e| anyhow::anyhow!("invalid JSON: {e}"))?
        }
        SourceFormat::Yaml => serde_yaml::from_str(text).context("invalid YAML")?,
    };
    Ok(parse_contract(&JsonPointer::root(), &value)?)
}

pub fn load_document(path: &Path) -> anyhow::Result<Contract> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read contract file {}", path.display()))?;
    parse_document(&text, detect_format(path))
        .with_context(|| format!("failed to parse {}", path.display()))
}

// ------------------------------- Tests ------------------------------------ //
