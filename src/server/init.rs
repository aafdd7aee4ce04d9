//! Serve loop
//!
//! Reads one JSON request per stdin line and writes one JSON result per
//! stdout line. Stops on EOF or a shutdown signal, then shuts the session
//! down. A request in progress always finishes before the loop exits.

use super::cli::build_session_for_cli;
use super::loader::load_config;
use super::signal::wait_for_shutdown_signal;
use anyhow::{Context, Result};
use organon_core::{Request, SessionOrchestrator, ThinkResult};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

/// Run the serve loop for `node`
pub async fn run(node: &str, model: &str) -> Result<()> {
    info!("Starting Organon v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config().context("Failed to load configuration")?;
    info!(
        ceiling = config.orchestrator.load_ceiling,
        "Configuration loaded"
    );

    let session = build_session_for_cli(&config, node, model).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let shutdown = wait_for_shutdown_signal();
    tokio::pin!(shutdown);

    let mut served = 0usize;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read request")? else {
                    info!("Input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                let result = handle_line(&session, &line).await?;
                let mut out = serde_json::to_string(&result)?;
                out.push('\n');
                stdout.write_all(out.as_bytes()).await?;
                stdout.flush().await?;
                served += 1;
            }
        }
    }

    info!(served, "Shutting down session");
    session.shutdown().await?;
    Ok(())
}

/// Parse and answer one request line.
///
/// Unparseable lines are answered with a failed result rather than ending
/// the loop.
async fn handle_line(session: &SessionOrchestrator, line: &str) -> Result<ThinkResult> {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Invalid request line");
            return Ok(ThinkResult::failed(format!("invalid request: {}", e)));
        }
    };
    Ok(session.think(request).await?)
}
