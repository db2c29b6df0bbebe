//! Configuration loading for Infinder

mod hierarchical_loader;

pub use hierarchical_loader::{HierarchicalConfigLoader, CONFIG_FILE_NAME};
