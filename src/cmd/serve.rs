//! `draftsmith serve`.

use anyhow::Result;

use draftsmith::api;
use draftsmith::config::Config;

pub async fn cmd_serve(config: Config, port: u16) -> Result<()> {
    let orchestrator = super::orchestrator(&config);
    api::serve(orchestrator, port).await
}
