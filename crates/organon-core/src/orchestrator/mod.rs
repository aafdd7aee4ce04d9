//! Session orchestrator - gated request pipeline for one node
//!
//! # Module Structure
//!
//! - `types`: Result and state types (ThinkResult, SessionState, StageKind)
//! - `config`: Configuration types (OrchestratorConfig, ThinkOptions)
//! - `core`: SessionOrchestrator struct, builder and construction
//! - `process`: The `think` pipeline
//! - `lifecycle`: Shutdown and drop handling
//! - `helpers`: Event emission and failure translation

mod config;
mod core;
mod helpers;
mod lifecycle;
mod process;
mod types;


pub use config::{OrchestratorConfig, ThinkOptions};
pub use core::{SessionBuilder, SessionOrchestrator};
pub use process::{NODE_OVERLOADED, POLICY_VIOLATION, STIMULATE_CANCELLED};
pub use types::{ResponseMetadata, SessionState, StageKind, ThinkResult};
