//! `organon config` - print the effective configuration

use anyhow::{Context, Result};

use crate::server::load_config;

/// Print the merged configuration as JSON
pub fn run() -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
