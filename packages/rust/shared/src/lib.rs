//! Shared types, error model, and configuration for Darkmatter.
//!
//! This crate is the foundation depended on by all other Darkmatter crates.
//! It provides:
//! - [`DarkmatterError`] — the unified error type
//! - Domain types ([`Lifecycle`], [`BuilderOptions`])
//! - Configuration ([`AppConfig`], [`BuilderEntry`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuilderEntry, DefaultsConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{DarkmatterError, Result};
pub use types::{BuilderOptions, Lifecycle};
