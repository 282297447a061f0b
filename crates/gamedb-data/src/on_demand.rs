//! On-demand JSON resource: `name -> { key: value }`, read fresh every run.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{LoadError, io_error};

pub type OnDemandData = BTreeMap<String, Map<String, Value>>;

/// Parse an on-demand document. Top-level entries that are not objects are
/// dropped.
pub fn parse_on_demand(content: &str) -> Result<OnDemandData, serde_json::Error> {
    let root: Map<String, Value> = serde_json::from_str(content)?;
    Ok(root
        .into_iter()
        .filter_map(|(name, value)| match value {
            Value::Object(entries) => Some((name, entries)),
            _ => None,
        })
        .collect())
}

pub fn load_on_demand(path: &Path) -> Result<OnDemandData, LoadError> {
    let content = std::fs::read_to_string(path).map_err(io_error(path))?;
    parse_on_demand(&content).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}
