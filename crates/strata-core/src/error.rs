// ── Core error types ──
//
// Store-side faults from strata-core. Listener faults never surface here:
// they are caught at the publish site and republished as `error` events
// (see `events::ListenerError`). Not-found conditions are never errors.

use thiserror::Error;

/// Unified error type for the core crate.
///
/// Every variant carries owned strings so the error can be cloned into an
/// `exception` event payload and still be returned to the caller of `load()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Data source errors ───────────────────────────────────────────
    #[error("Data proxy failed: {message}")]
    Proxy { message: String },

    #[error("Could not decode records: {message}")]
    Decode { message: String },

    // ── Mutation errors ──────────────────────────────────────────────
    #[error("A record with id {id} already exists")]
    DuplicateId { id: String },

    #[error("Moving node {node_id} under {new_parent_id} would create a cycle")]
    CycleDetected {
        node_id: String,
        new_parent_id: String,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode {
            message: err.to_string(),
        }
    }
}
