//! Configuration module for collection indexing
//!
//! This module provides the `IndexConfig` struct and its type-safe builder
//! for configuring an indexing run with validation and sensible defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::{Complete, ConfigError, IndexConfigBuilder, WithInputDir, WithOutputDir};
pub use types::IndexConfig;
