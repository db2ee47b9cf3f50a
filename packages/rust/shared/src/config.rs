//! Application configuration.
//!
//! User config lives at `~/.licensee/licensee.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets are never stored in the file; it names the env vars that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LicenseeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "licensee.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".licensee";

// ---------------------------------------------------------------------------
// Config structs (matching licensee.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language model provider settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Destination store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Batch pacing.
    #[serde(default)]
    pub batch: BatchConfig,

    /// Licensing category taxonomy override.
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    /// API base URL (OpenAI-compatible).
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Chat completion model.
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding model.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Requested embedding dimensionality; omitted from requests when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_dimensions: Option<usize>,

    /// Sampling temperature for the enrichment completion.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on completion output tokens.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_key_env(),
            base_url: default_openai_base_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: None,
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_embedding_model() -> String {
    "text-embedding-ada-002".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_output_tokens() -> u32 {
    500
}
fn default_timeout_secs() -> u64 {
    60
}

/// Which [`StoreConfig`] backend to write records to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Hosted Supabase / PostgREST endpoint.
    Postgrest,
    /// Local libSQL file.
    Local,
}

impl std::str::FromStr for StoreBackend {
    type Err = LicenseeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgrest" | "supabase" => Ok(Self::Postgrest),
            "local" => Ok(Self::Local),
            other => Err(LicenseeError::config(format!(
                "unknown store backend '{other}': expected 'postgrest' or 'local'"
            ))),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend selection.
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// Name of the env var holding the PostgREST project URL.
    #[serde(default = "default_store_url_env")]
    pub url_env: String,

    /// Name of the env var holding the PostgREST service key.
    #[serde(default = "default_store_key_env")]
    pub api_key_env: String,

    /// Destination table.
    #[serde(default = "default_table")]
    pub table: String,

    /// Database file for the local backend.
    #[serde(default = "default_local_path")]
    pub local_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url_env: default_store_url_env(),
            api_key_env: default_store_key_env(),
            table: default_table(),
            local_path: default_local_path(),
        }
    }
}

fn default_backend() -> StoreBackend {
    StoreBackend::Postgrest
}
fn default_store_url_env() -> String {
    "SUPABASE_URL".into()
}
fn default_store_key_env() -> String {
    "SUPABASE_KEY".into()
}
fn default_table() -> String {
    "licensees".into()
}
fn default_local_path() -> String {
    "var/licensees.db".into()
}

/// `[batch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Pause between enriched rows, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_delay_ms() -> u64 {
    500
}

/// `[taxonomy]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    /// Category list used for re-scoring. Empty means the built-in list.
    #[serde(default)]
    pub categories: Vec<String>,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.licensee/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LicenseeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.licensee/licensee.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LicenseeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        LicenseeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the default config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    init_config_at(&config_file_path()?)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<PathBuf> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| LicenseeError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LicenseeError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| LicenseeError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path.to_path_buf())
}

/// Read a secret from the env var named `var_name`.
pub fn resolve_secret(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(LicenseeError::config(format!(
            "{var_name} is not set. Export it or point the config at another variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("OPENAI_API_KEY"));
        assert!(toml_str.contains("SUPABASE_URL"));
        assert!(toml_str.contains("licensees"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.openai.max_output_tokens, 500);
        assert_eq!(parsed.batch.delay_ms, 500);
        assert_eq!(parsed.store.backend, StoreBackend::Postgrest);
        assert!(parsed.taxonomy.categories.is_empty());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[store]
backend = "local"
local_path = "/tmp/licensees.db"

[taxonomy]
categories = ["Bags", "Hats"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.store.backend, StoreBackend::Local);
        assert_eq!(config.store.table, "licensees");
        assert_eq!(config.taxonomy.categories, vec!["Bags", "Hats"]);
        assert_eq!(config.openai.model, "gpt-4o");
        assert!((config.openai.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn backend_from_str() {
        assert_eq!("local".parse::<StoreBackend>().unwrap(), StoreBackend::Local);
        assert_eq!(
            "Supabase".parse::<StoreBackend>().unwrap(),
            StoreBackend::Postgrest
        );
        assert!("mongo".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn init_config_writes_defaults() {
        let path = std::env::temp_dir()
            .join(format!("licensee_cfg_{}", std::process::id()))
            .join(CONFIG_FILE_NAME);
        let written = init_config_at(&path).expect("init config");
        let loaded = load_config_from(&written).expect("load config");
        assert_eq!(loaded.store.api_key_env, "SUPABASE_KEY");
    }

    #[test]
    fn missing_secret_names_the_variable() {
        let result = resolve_secret("LICENSEE_TEST_NONEXISTENT_KEY_12345");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("LICENSEE_TEST_NONEXISTENT_KEY_12345")
        );
    }
}
