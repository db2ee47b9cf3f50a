//! Shared types, error model, and configuration for the licensee enrichment tools.
//!
//! This crate is the foundation depended on by all other workspace crates.
//! It provides:
//! - [`LicenseeError`]: the unified error type
//! - Input types ([`InputRow`], [`LicenseeInput`])
//! - Configuration ([`AppConfig`], config loading, secret resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BatchConfig, OpenAiConfig, StoreBackend, StoreConfig, TaxonomyConfig, config_dir,
    config_file_path, init_config, init_config_at, load_config, load_config_from, resolve_secret,
};
pub use error::{LicenseeError, Result};
pub use types::{InputRow, LicenseeInput, normalize_website};
