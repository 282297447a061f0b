//! Load orchestration: cache, freshness check, parallel reparse, then
//! auxiliary resources.
//!
//! A directory base runs the full pipeline. A file base is treated as a
//! cache file and loaded without touching any workbook.

use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use calamine::{Reader, open_workbook_auto};
use gamedb_core::schema::SheetLayout;
use rayon::prelude::*;

use crate::cache::{read_cache, write_cache};
use crate::config::LoaderConfig;
use crate::db::GameDb;
use crate::error::{LoadError, io_error};
use crate::on_demand::{OnDemandData, load_on_demand};
use crate::scene_map::{SceneMaps, load_scene_maps};
use crate::tables::{SourceFile, default_sources};

// ===========================================================================
// Results
// ===========================================================================

/// What happened to the snapshot cache during a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    /// No cache file existed.
    Missing,
    /// The cache decoded and seeded the snapshot.
    Loaded,
    /// The cache failed to decode and was ignored.
    Discarded(String),
    /// The base path was the cache file itself.
    CacheOnly,
}

/// Instrumentation of one load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub cache: CacheStatus,
    /// Source files parsed this run, in registry order.
    pub reparsed: Vec<String>,
    /// Source files whose cached tables were kept.
    pub unchanged: Vec<String>,
    pub cache_written: bool,
}

impl LoadReport {
    fn new(cache: CacheStatus) -> Self {
        Self {
            cache,
            reparsed: Vec::new(),
            unchanged: Vec::new(),
            cache_written: false,
        }
    }
}

/// A ready-to-use database and its grid resources.
#[derive(Debug)]
pub struct GameData {
    pub db: GameDb,
    pub scene_maps: SceneMaps,
    pub report: LoadReport,
}

// ===========================================================================
// Loader
// ===========================================================================

/// Load with the standard source registry.
pub fn load_game_data(base: &Path, config: &LoaderConfig) -> Result<GameData, LoadError> {
    GameDbLoader::new(config.clone()).load(base)
}

pub struct GameDbLoader {
    config: LoaderConfig,
    sources: Vec<SourceFile>,
}

/// A source file that changed since the cached snapshot was written.
struct StaleSource<'a> {
    source: &'a SourceFile,
    path: PathBuf,
    mod_time: i64,
}

impl GameDbLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self::with_sources(config, default_sources())
    }

    pub fn with_sources(config: LoaderConfig, sources: Vec<SourceFile>) -> Self {
        Self { config, sources }
    }

    pub fn load(&self, base: &Path) -> Result<GameData, LoadError> {
        let started = Instant::now();
        let metadata = std::fs::metadata(base).map_err(io_error(base))?;
        let data = if metadata.is_dir() {
            self.load_dir(base)?
        } else {
            self.load_cache_only(base)?
        };
        tracing::info!(
            base = %base.display(),
            items = data.db.items.len(),
            scenes = data.db.scenes.len(),
            scene_maps = data.scene_maps.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "game data loaded"
        );
        Ok(data)
    }

    fn load_dir(&self, base: &Path) -> Result<GameData, LoadError> {
        let cache_path = base.join(&self.config.cache_file);
        let (mut db, cache) = load_cache(&cache_path);
        let mut report = LoadReport::new(cache);

        self.refresh_tables(&mut db, &base.join(&self.config.tables_dir), &mut report)?;

        if report.reparsed.is_empty() {
            if !self.config.allow_unchanged {
                return Err(LoadError::NoTablesLoaded);
            }
            tracing::info!("no source file changed, reusing cached tables");
        } else {
            match write_cache(&db, &cache_path) {
                Ok(()) => report.cache_written = true,
                Err(err) => tracing::warn!(error = %err, "failed to write cache"),
            }
        }

        self.finish(db, base, report)
    }

    fn load_cache_only(&self, cache_path: &Path) -> Result<GameData, LoadError> {
        let db = read_cache(cache_path)?;
        let dir = cache_path.parent().unwrap_or(Path::new("."));
        self.finish(db, dir, LoadReport::new(CacheStatus::CacheOnly))
    }

    /// Reparse every source file whose modification time differs from the
    /// one recorded in `db`, then install the results.
    ///
    /// Files are parsed in parallel into private staging databases. Nothing
    /// reaches `db` unless every file succeeds.
    fn refresh_tables(
        &self,
        db: &mut GameDb,
        tables_dir: &Path,
        report: &mut LoadReport,
    ) -> Result<(), LoadError> {
        let started = Instant::now();
        let layout = self.config.layout();

        let mut stale = Vec::new();
        for source in &self.sources {
            let path = tables_dir.join(source.file_name);
            let mod_time = modified_nanos(&path)?;
            if db.file_mod_time(source.file_name) == Some(mod_time) {
                tracing::debug!(file = source.file_name, "source file not modified");
                report.unchanged.push(source.file_name.to_string());
                continue;
            }
            stale.push(StaleSource {
                source,
                path,
                mod_time,
            });
        }

        let results: Vec<Result<GameDb, LoadError>> = stale
            .par_iter()
            .map(|stale| load_source(stale.source, &stale.path, &layout))
            .collect();

        let mut staged = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (stale, result) in stale.iter().zip(results) {
            match result {
                Ok(staging) => staged.push(staging),
                Err(err) => {
                    tracing::error!(file = stale.source.file_name, error = %err, "source file failed");
                    first_error.get_or_insert(err);
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        for (stale, mut staging) in stale.iter().zip(staged) {
            for sheet in &stale.source.sheets {
                sheet.commit(&mut staging, db);
            }
            db.file_mod_times
                .insert(stale.source.file_name.to_string(), stale.mod_time);
            report.reparsed.push(stale.source.file_name.to_string());
        }

        if !report.reparsed.is_empty() {
            tracing::info!(
                reparsed = report.reparsed.len(),
                unchanged = report.unchanged.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "source files loaded"
            );
        }
        Ok(())
    }

    /// Check the snapshot, then attach the resources that are never cached.
    fn finish(&self, mut db: GameDb, dir: &Path, report: LoadReport) -> Result<GameData, LoadError> {
        db.check()?;

        let on_demand_path = dir.join(&self.config.on_demand_file);
        db.on_demand = match load_on_demand(&on_demand_path) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(error = %err, "on-demand data unavailable");
                OnDemandData::new()
            }
        };

        let scene_maps = load_scene_maps(&db.scene_map_ids(), dir, &self.config)?;
        Ok(GameData {
            db,
            scene_maps,
            report,
        })
    }
}

/// Seed a snapshot from the cache. An unreadable cache is not an error.
fn load_cache(path: &Path) -> (GameDb, CacheStatus) {
    if !path.is_file() {
        tracing::info!(path = %path.display(), "no cache file, parsing every source file");
        return (GameDb::default(), CacheStatus::Missing);
    }
    match read_cache(path) {
        Ok(db) => (db, CacheStatus::Loaded),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "discarding unreadable cache");
            (GameDb::default(), CacheStatus::Discarded(err.to_string()))
        }
    }
}

/// Parse one workbook, sheet by sheet, into a fresh staging database.
fn load_source(
    source: &SourceFile,
    path: &Path,
    layout: &SheetLayout,
) -> Result<GameDb, LoadError> {
    let started = Instant::now();
    let workbook_error = |detail: String| LoadError::Workbook {
        path: path.to_path_buf(),
        detail,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(e.to_string()))?;
    let sheet_names = workbook.sheet_names();
    let mut staging = GameDb::default();

    for sheet in &source.sheets {
        let name = sheet.sheet_name();
        if !sheet_names.iter().any(|candidate| candidate == name) {
            return Err(LoadError::MissingSheet {
                file: source.file_name.to_string(),
                sheet: name.to_string(),
            });
        }
        let range = workbook
            .worksheet_range(name)
            .map_err(|e| workbook_error(format!("sheet '{name}': {e}")))?;
        let rows = sheet
            .load(&range, layout, &mut staging)
            .map_err(|source_err| LoadError::Sheet {
                file: source.file_name.to_string(),
                source: source_err,
            })?;
        tracing::debug!(file = source.file_name, sheet = name, rows, "sheet loaded");
    }

    tracing::info!(
        file = source.file_name,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "source file parsed"
    );
    Ok(staging)
}

/// Modification time in nanoseconds since the Unix epoch.
fn modified_nanos(path: &Path) -> Result<i64, LoadError> {
    let modified: SystemTime = std::fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .map_err(io_error(path))?;
    Ok(match modified.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_nanos() as i64,
        Err(before) => -(before.duration().as_nanos() as i64),
    })
}
