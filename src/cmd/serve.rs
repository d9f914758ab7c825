//! Webhook server command: `flowsync serve`.

use anyhow::Result;
use std::path::{Path, PathBuf};

use flowsync::config::{CliOverrides, SyncConfig};

pub async fn cmd_serve(
    config_path: Option<&Path>,
    addr: Option<String>,
    db_path: Option<PathBuf>,
) -> Result<()> {
    let config = SyncConfig::load(config_path, &CliOverrides { addr, db_path })?;
    flowsync::webhook::server::start_server(config).await
}
