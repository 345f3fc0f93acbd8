//! Board API server command: `taskboard serve`.

use std::sync::Arc;

use anyhow::Result;

use taskboard::board::identity::StaticIdentityProvider;
use taskboard::board::server::{ServerConfig, start_server};
use taskboard::config::TaskboardToml;

pub async fn cmd_serve(
    project_dir: &std::path::Path,
    config: TaskboardToml,
    port: Option<u16>,
    dev: bool,
    auto_login: bool,
) -> Result<()> {
    let store = config.build_record_store(project_dir)?;
    let identity = Arc::new(StaticIdentityProvider::new(config.identity()));

    start_server(
        ServerConfig {
            port: port.unwrap_or(config.server.port),
            dev_mode: dev || config.server.dev,
            auto_login,
        },
        store,
        identity,
    )
    .await
}
