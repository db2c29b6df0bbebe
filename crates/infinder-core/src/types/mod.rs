//! Type definitions for Infinder

mod runtime_config;

pub use runtime_config::{LoadPolicy, LoaderConfig, NetworkConfig, RuntimeConfig};
