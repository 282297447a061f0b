//! Loader configuration.
//!
//! Every field has a default matching the standard table layout, so a
//! config file only needs the keys it overrides.

use std::path::{Path, PathBuf};

use gamedb_core::schema::SheetLayout;
use serde::Deserialize;

use crate::error::{LoadError, io_error};

/// File name looked up next to the tables when no config path is given.
pub const CONFIG_FILE: &str = "gamedb.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// 0-based row holding the column names.
    pub header_row: u32,
    /// 0-based column where data starts.
    pub first_column: u32,
    /// Snapshot cache file, relative to the base directory.
    pub cache_file: String,
    /// Directory holding the source workbooks, relative to the base directory.
    pub tables_dir: String,
    /// On-demand JSON resource, relative to the base directory.
    pub on_demand_file: String,
    /// Grid descriptor path; `{id}` is replaced with the map id.
    pub scene_map_template: String,
    /// Raw units per grid cell, horizontally.
    pub cell_width: f64,
    /// Raw units per grid cell, vertically.
    pub cell_height: f64,
    /// Succeed (reusing cached tables) when no source file changed.
    pub allow_unchanged: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            header_row: 2,
            first_column: 1,
            cache_file: "gamedb.dat".to_string(),
            tables_dir: "excels".to_string(),
            on_demand_file: "onDemandData.json".to_string(),
            scene_map_template: "scenes/map_{id}.json".to_string(),
            cell_width: 72.0,
            cell_height: 48.0,
            allow_unchanged: false,
        }
    }
}

impl LoaderConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Read a TOML config file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(io_error(path))?;
        Self::from_toml_str(&content).map_err(|e| LoadError::Config {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    /// Use `gamedb.toml` beside the tables if present, otherwise defaults.
    ///
    /// `base` is either the base directory or the cache file; for a file the
    /// lookup happens in its parent directory.
    pub fn discover(base: &Path) -> Result<Self, LoadError> {
        let dir = if base.is_dir() {
            base
        } else {
            base.parent().unwrap_or(Path::new("."))
        };
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn layout(&self) -> SheetLayout {
        SheetLayout {
            header_row: self.header_row,
            first_column: self.first_column,
        }
    }

    pub fn scene_map_path(&self, dir: &Path, id: i32) -> PathBuf {
        dir.join(self.scene_map_template.replace("{id}", &id.to_string()))
    }
}
