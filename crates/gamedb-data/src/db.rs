//! The in-memory game database snapshot.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::on_demand::OnDemandData;
use crate::records::{Item, OtherData, PlayerLevel, Scene};

/// Every table decoded from the source workbooks, plus the modification
/// times of the files they came from.
///
/// `on_demand` is reloaded from JSON on every run and is never part of the
/// cached snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameDb {
    pub items: BTreeMap<i32, Item>,
    pub scenes: BTreeMap<i32, Scene>,
    pub other_datas: Vec<OtherData>,
    pub player_levels: Vec<PlayerLevel>,
    /// Source file name -> last-seen modification time (ns since epoch).
    pub file_mod_times: BTreeMap<String, i64>,
    #[serde(skip)]
    pub on_demand: OnDemandData,
}

impl GameDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded modification time of a source file.
    pub fn file_mod_time(&self, file: &str) -> Option<i64> {
        self.file_mod_times.get(file).copied()
    }

    /// Distinct grid map ids referenced by scenes, ascending.
    pub fn scene_map_ids(&self) -> Vec<i32> {
        self.scenes
            .values()
            .map(|scene| scene.map_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Structural cross-reference check run before the snapshot is used.
    pub fn check(&self) -> Result<(), LoadError> {
        for item in self.items.values() {
            if let Some(missing) = item
                .sell_get
                .0
                .iter()
                .find(|info| !self.items.contains_key(&info.id))
            {
                return Err(LoadError::CrossReference {
                    table: "items",
                    key: item.id,
                    detail: format!("sellGet references unknown item {}", missing.id),
                });
            }
        }

        for scene in self.scenes.values() {
            if scene.map_id <= 0 {
                return Err(LoadError::CrossReference {
                    table: "scenes",
                    key: scene.id,
                    detail: format!("mapId must be positive, got {}", scene.map_id),
                });
            }
        }

        Ok(())
    }
}
