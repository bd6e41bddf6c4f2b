//! Type definitions for Mosic configuration

mod runtime_config;

pub use runtime_config::*;
