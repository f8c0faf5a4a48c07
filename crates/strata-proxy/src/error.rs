use std::path::PathBuf;

use strata_core::CoreError;
use thiserror::Error;

/// Top-level error type for the `strata-proxy` crate.
///
/// Covers every way a proxy can fail to produce records: building the
/// client, reaching the source, a non-success response, and decoding the
/// payload. Converts into [`CoreError`] at the `DataProxy` boundary.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Building the HTTP client failed (bad CA file, bad header value).
    #[error("Client setup failed: {0}")]
    Client(String),

    /// The source answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    // ── Files ───────────────────────────────────────────────────────
    #[error("Could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// The payload was not a record array or `{"data": [...]}` envelope.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if retrying the same read might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the source does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Status { status: 404, .. } => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<Error> for CoreError {
    fn from(err: Error) -> Self {
        match err {
            Error::Deserialization { message, .. } => Self::Decode { message },
            other => Self::Proxy {
                message: other.to_string(),
            },
        }
    }
}

/// First `max` bytes of `body`, cut on a character boundary.
pub(crate) fn preview(body: &str, max: usize) -> &str {
    if body.len() <= max {
        return body;
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
