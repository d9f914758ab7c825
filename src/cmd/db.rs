//! Database bootstrap command: `flowsync init-db`.

use anyhow::Result;
use std::path::{Path, PathBuf};

use flowsync::config::{CliOverrides, SyncConfig};
use flowsync::webhook::server::open_database;

pub fn cmd_init_db(config_path: Option<&Path>, db_path: Option<PathBuf>) -> Result<()> {
    let config = SyncConfig::load(
        config_path,
        &CliOverrides {
            addr: None,
            db_path,
        },
    )?;
    open_database(&config)?;
    println!("Database initialized at {}", config.database.path.display());
    Ok(())
}
