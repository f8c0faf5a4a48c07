//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and config failures into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use strata_config::ConfigError;
use strata_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Source ───────────────────────────────────────────────────────
    #[error("No record source configured")]
    #[diagnostic(
        code(strata::no_source),
        help(
            "Pass --source <file> or --url <url>, or set [source] in the config file.\n\
             Expected config at: {path}"
        )
    )]
    NoSource { path: String },

    #[error("Could not load records from {source_desc}")]
    #[diagnostic(
        code(strata::load_failed),
        help("Check that the source is reachable and returns a JSON array of objects.")
    )]
    LoadFailed {
        source_desc: String,
        #[source]
        source: CoreError,
    },

    #[error("Records from {source_desc} are not valid")]
    #[diagnostic(
        code(strata::invalid_data),
        help("Expected a JSON array of objects or a {{\"data\": [...]}} envelope.")
    )]
    InvalidData {
        source_desc: String,
        #[source]
        source: CoreError,
    },

    // ── Records ──────────────────────────────────────────────────────
    #[error("Record '{identifier}' not found")]
    #[diagnostic(
        code(strata::not_found),
        help("Run: strata query --output plain to list record ids")
    )]
    NotFound { identifier: String },

    #[error("{0}")]
    #[diagnostic(code(strata::conflict))]
    Conflict(CoreError),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(strata::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(strata::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(strata::config))]
    Config(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render JSON: {0}")]
    #[diagnostic(code(strata::json))]
    Json(#[from] serde_json::Error),

    #[error("Could not render YAML: {0}")]
    #[diagnostic(code(strata::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Could not render TOML: {0}")]
    #[diagnostic(code(strata::toml))]
    Toml(#[from] toml::ser::Error),

    #[error("{0}")]
    #[diagnostic(code(strata::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::LoadFailed { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict(_) | Self::ConfigExists { .. } => exit_code::CONFLICT,
            Self::NoSource { .. } | Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Wrap a failed `load()`, naming the source it came from.
    pub fn load(source_desc: impl Into<String>, err: CoreError) -> Self {
        let source_desc = source_desc.into();
        match err {
            CoreError::Decode { .. } => Self::InvalidData {
                source_desc,
                source: err,
            },
            other => Self::LoadFailed {
                source_desc,
                source: other,
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DuplicateId { .. } | CoreError::CycleDetected { .. } => Self::Conflict(err),
            CoreError::Config { message } => Self::Config(message),
            CoreError::Proxy { .. } | CoreError::Decode { .. } => Self::load("source", err),
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            ConfigError::Serialization(e) => Self::Toml(e),
            ConfigError::Figment(e) => Self::Config(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_errors_split_by_cause() {
        let err = CliError::load(
            "records.json",
            CoreError::Decode {
                message: "bad".into(),
            },
        );
        assert!(matches!(err, CliError::InvalidData { .. }));
        assert_eq!(err.exit_code(), exit_code::GENERAL);

        let err = CliError::load(
            "https://example.com",
            CoreError::Proxy {
                message: "refused".into(),
            },
        );
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn config_validation_is_a_usage_error() {
        let err = CliError::from(ConfigError::Validation {
            field: "store.id_field".into(),
            reason: "must not be empty".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
