use std::path::PathBuf;

use clap::Parser;
use gamedb_data::{LoaderConfig, load_game_data};

#[derive(Parser)]
#[command(name = "gamedb-server", about = "Load and verify the game configuration database")]
struct Cli {
    /// Base directory holding the tables, or a cache file for a cache-only load.
    #[arg(default_value = ".", env = "GAMEDB_BASE")]
    base: PathBuf,

    /// Path to a TOML loader configuration. Defaults to `gamedb.toml` beside
    /// the tables when present.
    #[arg(long, env = "GAMEDB_CONFIG")]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LoaderConfig::load(path),
        None => LoaderConfig::discover(&cli.base),
    };
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    tracing::info!(base = %cli.base.display(), "loading game data");
    let data = match load_game_data(&cli.base, &config) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(error = %e, "failed to load game data");
            std::process::exit(1);
        }
    };

    tracing::info!(
        cache = ?data.report.cache,
        reparsed = ?data.report.reparsed,
        unchanged = data.report.unchanged.len(),
        cache_written = data.report.cache_written,
        items = data.db.items.len(),
        scenes = data.db.scenes.len(),
        player_levels = data.db.player_levels.len(),
        on_demand = data.db.on_demand.len(),
        scene_maps = data.scene_maps.len(),
        "game data ready"
    );
}
