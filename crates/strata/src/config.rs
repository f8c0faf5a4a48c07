//! CLI configuration: thin wrapper around `strata_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides (--source,
//! --url, --api-key, --parent-field, etc.). Flags beat the config file,
//! which beats built-in defaults.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use strata_core::StoreConfig;
use strata_proxy::{TlsMode, TransportConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use strata_config::{Config, config_path, load_config_from, save_config_to};

// ── Record sources ──────────────────────────────────────────────────

/// Where `load()` reads from, after flags and config are merged.
#[derive(Debug)]
pub enum Source {
    File(PathBuf),
    Http {
        url: Url,
        transport: Box<TransportConfig>,
    },
}

impl Source {
    /// Human-readable origin, for errors and logs.
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Http { url, .. } => url.to_string(),
        }
    }
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// The config file in effect: `--config`, else the platform path.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the config file in effect, layered with `STRATA_` env overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&config_file(global))?)
}

/// Merge tree-field flags over the `[store]` section.
pub fn resolve_store_config(global: &GlobalOpts, cfg: &Config) -> Result<StoreConfig, CliError> {
    let mut store = cfg.store.clone();
    if let Some(ref field) = global.id_field {
        store.id_field.clone_from(field);
    }
    if let Some(ref field) = global.parent_field {
        store.parent_field.clone_from(field);
    }
    if let Some(ref field) = global.children_field {
        store.children_field.clone_from(field);
    }
    Ok(store.to_store_config()?)
}

/// Pick the record source (flag > config; file > url within each layer).
pub fn resolve_source(global: &GlobalOpts, cfg: &Config) -> Result<Source, CliError> {
    if let Some(ref path) = global.source {
        return Ok(Source::File(path.clone()));
    }
    if let Some(ref raw) = global.url {
        return Ok(Source::Http {
            url: parse_url(raw)?,
            transport: Box::new(resolve_transport(global, cfg)),
        });
    }
    if let Some(ref path) = cfg.source.file {
        return Ok(Source::File(path.clone()));
    }
    if let Some(url) = cfg.source.parsed_url()? {
        return Ok(Source::Http {
            url,
            transport: Box::new(resolve_transport(global, cfg)),
        });
    }
    Err(CliError::NoSource {
        path: config_file(global).display().to_string(),
    })
}

fn parse_url(raw: &str) -> Result<Url, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Translate flags + `[source]` into a `TransportConfig`.
pub fn resolve_transport(global: &GlobalOpts, cfg: &Config) -> TransportConfig {
    let source = &cfg.source;

    // 1. Timeout (flag > config)
    let timeout = global
        .timeout
        .map_or_else(|| source.timeout(), Duration::from_secs);

    // 2. API key (flag > api_key_env > plaintext)
    let api_key = global
        .api_key
        .clone()
        .map(SecretString::from)
        .or_else(|| source.resolve_api_key());

    // 3. TLS verification
    let tls = if global.insecure || source.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = source.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let mut transport = TransportConfig {
        tls,
        timeout,
        api_key,
        ..TransportConfig::default()
    };
    if let Some(ref header) = source.api_key_header {
        transport.api_key_header.clone_from(header);
    }
    transport
}
