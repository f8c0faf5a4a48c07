//! Shared configuration for strata tools.
//!
//! Layered loading (defaults, TOML file, `STRATA_` environment), API key
//! resolution, and translation to `strata_core::StoreConfig`. The CLI adds
//! flag-aware overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use strata_core::{DuplicateIds, StoreConfig};

/// Prefix for environment overrides. Nested keys use a double underscore,
/// e.g. `STRATA_STORE__PARENT_FIELD=pid`.
pub const ENV_PREFIX: &str = "STRATA_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// How records are interpreted.
    #[serde(default)]
    pub store: StoreSection,

    /// Where records are loaded from.
    #[serde(default)]
    pub source: SourceSection,

    /// Logging defaults.
    #[serde(default)]
    pub log: LogSection,
}

/// `[store]`: field names and policies handed to the `DataStore`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoreSection {
    #[serde(default = "default_id_field")]
    pub id_field: String,

    #[serde(default = "default_parent_field")]
    pub parent_field: String,

    #[serde(default = "default_children_field")]
    pub children_field: String,

    /// Parent value marking a top-level node, besides null/absent.
    /// TOML has no null, so leaving this unset means `null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_value: Option<Value>,

    #[serde(default)]
    pub duplicate_ids: DuplicateIds,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            id_field: default_id_field(),
            parent_field: default_parent_field(),
            children_field: default_children_field(),
            root_value: None,
            duplicate_ids: DuplicateIds::Allow,
        }
    }
}

fn default_id_field() -> String {
    "id".into()
}
fn default_parent_field() -> String {
    "parentId".into()
}
fn default_children_field() -> String {
    "children".into()
}

/// `[source]`: the record source used by `DataStore::load()`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SourceSection {
    /// HTTP(S) endpoint returning a JSON array or `{"data": [...]}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Local JSON file with the same accepted shapes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Environment variable name containing the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// API key (plaintext, prefer `api_key_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Header that carries the API key (defaults to `X-API-KEY`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_header: Option<String>,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            url: None,
            file: None,
            timeout: default_timeout(),
            api_key_env: None,
            api_key: None,
            api_key_header: None,
            ca_cert: None,
            insecure: false,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// `[log]`: defaults for the tracing subscriber.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LogSection {
    /// Filter directive used when neither `-v` nor `RUST_LOG` is given.
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "warn".into()
}

// ── Translation ─────────────────────────────────────────────────────

impl StoreSection {
    /// Validate and convert into the core store configuration.
    pub fn to_store_config(&self) -> Result<StoreConfig, ConfigError> {
        for (field, value) in [
            ("store.id_field", &self.id_field),
            ("store.parent_field", &self.parent_field),
            ("store.children_field", &self.children_field),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation {
                    field: field.into(),
                    reason: "must not be empty".into(),
                });
            }
        }
        if self.id_field == self.parent_field {
            return Err(ConfigError::Validation {
                field: "store.parent_field".into(),
                reason: format!("must differ from id_field ('{}')", self.id_field),
            });
        }

        Ok(StoreConfig {
            id_field: self.id_field.clone(),
            parent_field: self.parent_field.clone(),
            children_field: self.children_field.clone(),
            root_value: self.root_value.clone().unwrap_or(Value::Null),
            duplicate_ids: self.duplicate_ids,
        })
    }
}

impl SourceSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Parsed `url`, if one is configured.
    pub fn parsed_url(&self) -> Result<Option<url::Url>, ConfigError> {
        self.url
            .as_deref()
            .map(|raw| {
                raw.parse().map_err(|_| ConfigError::Validation {
                    field: "source.url".into(),
                    reason: format!("invalid URL: {raw}"),
                })
            })
            .transpose()
    }

    /// Resolve the API key: `api_key_env` lookup first, then plaintext.
    pub fn resolve_api_key(&self) -> Option<SecretString> {
        if let Some(ref env_name) = self.api_key_env {
            if let Ok(val) = std::env::var(env_name) {
                return Some(SecretString::from(val));
            }
        }
        self.api_key.clone().map(SecretString::from)
    }
}

impl Config {
    /// Shorthand for `self.store.to_store_config()`.
    pub fn to_store_config(&self) -> Result<StoreConfig, ConfigError> {
        self.store.to_store_config()
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "strata", "strata").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("strata");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// The provider stack: defaults, then `path`, then the environment.
///
/// Only nested keys (`STRATA_<SECTION>__<KEY>`) are read from the
/// environment; flat `STRATA_*` names belong to CLI flags.
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed(ENV_PREFIX)
                .filter(|key| key.as_str().contains("__"))
                .split("__"),
        )
}

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment. A missing file is
/// not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

/// Serialize config to TOML and write it to `path`, creating parents.
pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
