//! # infinder-core
//!
//! Core library for Infinder providing:
//! - A bounded-retry async loader for deferred resources
//! - Runtime configuration types and the layered config loader
//! - Error types shared by the CLI

pub mod config;
pub mod error;
pub mod loader;
pub mod types;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use loader::{LoadSnapshot, Phase, ProducerFailure, RetryLoader};
pub use types::{LoadPolicy, RuntimeConfig};
