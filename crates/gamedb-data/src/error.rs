use std::path::PathBuf;

use gamedb_core::SheetError;

use crate::cache::CacheError;
use crate::scene_map::SceneMapError;

/// Errors that abort a load. Only cache decode failures on the directory
/// path are recovered from; everything else surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A file or directory could not be read.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A workbook could not be opened or a sheet could not be extracted.
    #[error("cannot read workbook {path}: {detail}")]
    Workbook { path: PathBuf, detail: String },

    /// A declared sheet is absent from its workbook.
    #[error("workbook {file} has no sheet '{sheet}'")]
    MissingSheet { file: String, sheet: String },

    /// A sheet failed to resolve, decode, or install.
    #[error("{file}: {source}")]
    Sheet { file: String, source: SheetError },

    /// Every source file was unchanged, so nothing was parsed.
    #[error("no tables loaded: every source file is unchanged")]
    NoTablesLoaded,

    /// The snapshot cache could not be used.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A JSON resource is malformed.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The loader configuration file is malformed.
    #[error("config error in {path}: {detail}")]
    Config { path: PathBuf, detail: String },

    /// The post-load structural check failed.
    #[error("table {table} key {key}: {detail}")]
    CrossReference {
        table: &'static str,
        key: i32,
        detail: String,
    },

    /// One or more grid resources failed to load.
    #[error("{}", join_failures(.failures))]
    SceneMaps { failures: Vec<SceneMapError> },
}

fn join_failures(failures: &[SceneMapError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",\n")
}

pub(crate) fn io_error(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> LoadError {
    let path = path.into();
    move |source| LoadError::Io { path, source }
}
