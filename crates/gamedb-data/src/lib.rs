//! Game configuration database: record shapes, the source-file registry,
//! the snapshot cache and the load pipeline.
//!
//! [`load_game_data`] is the entry point. It returns an owned [`GameData`]
//! holding the checked snapshot and its grid resources.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod loader;
pub mod on_demand;
pub mod records;
pub mod scene_map;
pub mod tables;

pub use config::LoaderConfig;
pub use db::GameDb;
pub use error::LoadError;
pub use loader::{CacheStatus, GameData, GameDbLoader, LoadReport, load_game_data};
pub use scene_map::{SceneMap, SceneMaps};
