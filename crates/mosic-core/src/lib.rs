//! # mosic-core
//!
//! Core library for Mosic providing:
//! - Runtime configuration types (network, release service, update policy)
//! - Hierarchical configuration loading (embedded defaults, user file, env)
//! - The shared error type

pub mod config;
pub mod error;
pub mod types;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use types::RuntimeConfig;
