//! Organon Sim - simulated collaborators
//!
//! In-process stand-ins for every collaborator contract, with failure
//! injection. Used by the `organon` binary and the integration tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod actuation;
pub mod config;
pub mod encoder;
pub mod health;
pub mod model;
pub mod policy;

pub use actuation::{ActuationStats, SimActuation, SimConnection};
pub use config::{SimBundle, SimConfig};
pub use encoder::FeatureEncoder;
pub use health::ScriptedHealth;
pub use model::{FeedbackRecord, SimModel, SimModelStore};
pub use policy::KeywordPolicy;
