//! CLI session builder
//!
//! Connects a session for one node against the simulated collaborators.

use super::config::AppConfig;
use anyhow::{anyhow, Result};
use organon_core::{format_error_for_cli, SessionOrchestrator};

/// Build a Ready session for `node`, printing a readable error on failure.
pub async fn build_session_for_cli(
    config: &AppConfig,
    node: &str,
    model: &str,
) -> Result<SessionOrchestrator> {
    let bundle = config.sim.build();

    SessionOrchestrator::connect(
        node,
        model,
        bundle.collaborators,
        config.orchestrator.clone(),
    )
    .await
    .map_err(|e| {
        eprintln!("{}", format_error_for_cli(&e));
        anyhow!(e).context(format!("Failed to open session for node {}", node))
    })
}
