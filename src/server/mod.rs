//! Server module for Organon
//!
//! # Module Structure
//!
//! - `config`: Application configuration
//! - `loader`: Configuration loading from files and environment
//! - `cli`: Session builder shared by CLI commands
//! - `signal`: Ctrl+C / SIGTERM handling
//! - `init`: The stdin serve loop

mod cli;
pub mod config;
mod init;
mod loader;
mod signal;

pub use cli::build_session_for_cli;
pub use init::run;
pub use loader::load_config;
