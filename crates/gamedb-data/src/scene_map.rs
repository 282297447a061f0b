//! Grid resources: walkability grids built from sparse JSON descriptors.
//!
//! A descriptor stores walkable cells as `"RRRCCC": flag` entries, where the
//! key divided by 1000 is the row and the remainder is the column. Loading
//! packs each coordinate into `row << 16 | col` and keeps only the low bit of
//! the flag.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::Deserialize;

use crate::config::LoaderConfig;
use crate::error::LoadError;

/// Loaded grids keyed by their resolved id.
pub type SceneMaps = BTreeMap<i32, SceneMap>;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failure loading one grid descriptor.
#[derive(Debug, thiserror::Error)]
pub enum SceneMapError {
    #[error("scene map {id} ({path}): {source}")]
    Io {
        id: i32,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("scene map {id} ({path}): invalid JSON: {source}")]
    Json {
        id: i32,
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("scene map {id} ({path}): config has no roadFlags")]
    NoRoadFlags { id: i32, path: PathBuf },
}

// ---------------------------------------------------------------------------
// Descriptor and grid
// ---------------------------------------------------------------------------

/// On-disk descriptor. Width and height are in raw units.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SceneMapData {
    #[serde(alias = "Id")]
    pub id: i32,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Width")]
    pub width: i32,
    #[serde(alias = "Height")]
    pub height: i32,
    #[serde(rename = "roadFlags", alias = "RoadFlags")]
    pub road_flags: HashMap<i32, i8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneMap {
    pub id: i32,
    pub name: String,
    /// Width in cells.
    pub width: i32,
    /// Height in cells.
    pub height: i32,
    walkable: HashMap<i32, bool>,
}

pub fn pack_coord(row: i32, col: i32) -> i32 {
    (row << 16) | col
}

/// Split a sparse descriptor key into `(row, col)`.
pub fn decode_sparse_key(key: i32) -> (i32, i32) {
    (key / 1000, key % 1000)
}

/// Raw units to cells, rounding up.
pub fn cells(raw: i32, cell_size: f64) -> i32 {
    (f64::from(raw) / cell_size).ceil() as i32
}

impl SceneMap {
    /// Build the packed grid from a descriptor, consuming its sparse form.
    ///
    /// `assigned_id` fills in a missing (non-positive) id; a missing name
    /// becomes `scene_<id>`.
    pub fn from_data(data: SceneMapData, assigned_id: i32, cell_width: f64, cell_height: f64) -> Self {
        let walkable = data
            .road_flags
            .into_iter()
            .map(|(key, flag)| {
                let (row, col) = decode_sparse_key(key);
                (pack_coord(row, col), flag & 1 == 1)
            })
            .collect();

        let id = if data.id < 1 { assigned_id } else { data.id };
        let name = if data.name.is_empty() {
            format!("scene_{id}")
        } else {
            data.name
        };

        Self {
            id,
            name,
            width: cells(data.width, cell_width),
            height: cells(data.height, cell_height),
            walkable,
        }
    }

    /// Whether the cell is marked walkable. Cells absent from the
    /// descriptor are not.
    pub fn is_walkable(&self, row: i32, col: i32) -> bool {
        self.walkable
            .get(&pack_coord(row, col))
            .copied()
            .unwrap_or(false)
    }

    pub fn walkable_count(&self) -> usize {
        self.walkable.values().filter(|&&walkable| walkable).count()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load one grid descriptor.
pub fn load_scene_map(
    path: &Path,
    id: i32,
    cell_width: f64,
    cell_height: f64,
) -> Result<SceneMap, SceneMapError> {
    let content = std::fs::read_to_string(path).map_err(|source| SceneMapError::Io {
        id,
        path: path.to_path_buf(),
        source,
    })?;
    let data: SceneMapData =
        serde_json::from_str(&content).map_err(|source| SceneMapError::Json {
            id,
            path: path.to_path_buf(),
            source,
        })?;
    if data.road_flags.is_empty() {
        return Err(SceneMapError::NoRoadFlags {
            id,
            path: path.to_path_buf(),
        });
    }
    Ok(SceneMap::from_data(data, id, cell_width, cell_height))
}

/// Load every grid in `ids` concurrently, one worker per id.
///
/// All tasks run to completion before results are inspected. If any task
/// failed, every failure is reported and no grid is returned.
pub fn load_scene_maps(
    ids: &[i32],
    dir: &Path,
    config: &LoaderConfig,
) -> Result<SceneMaps, LoadError> {
    let started = Instant::now();
    let load_all = || -> Vec<Result<SceneMap, SceneMapError>> {
        ids.par_iter()
            .map(|&id| {
                load_scene_map(
                    &config.scene_map_path(dir, id),
                    id,
                    config.cell_width,
                    config.cell_height,
                )
            })
            .collect()
    };

    // One worker per grid so no descriptor waits on another.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(ids.len().max(1))
        .thread_name(|index| format!("scene-map-{index}"))
        .build();
    let results = match pool {
        Ok(pool) => pool.install(load_all),
        Err(err) => {
            tracing::warn!(error = %err, "scene map pool unavailable, using the global pool");
            load_all()
        }
    };

    let mut maps = SceneMaps::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(map) => {
                maps.insert(map.id, map);
            }
            Err(err) => failures.push(err),
        }
    }

    if !failures.is_empty() {
        tracing::warn!(failed = failures.len(), total = ids.len(), "scene maps failed to load");
        return Err(LoadError::SceneMaps { failures });
    }

    tracing::info!(
        count = maps.len(),
        walkable = maps.values().map(SceneMap::walkable_count).sum::<usize>(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scene maps loaded"
    );
    Ok(maps)
}
