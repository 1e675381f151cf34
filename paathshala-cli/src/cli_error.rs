//! The CLI's own error type, separate from [`paathshala_types::EngineError`]:
//! it wraps engine/store/retrieval failures alongside argument-parsing
//! and I/O mistakes a library crate would never need to represent.

use thiserror::Error;

/// Top-level error returned by any `paathshala` subcommand.
#[derive(Debug, Error)]
pub enum CliError {
    /// A flag was missing, unrecognized, or malformed.
    #[error("{0}")]
    Usage(String),
    /// Required configuration (e.g. an API key) was absent.
    #[error("configuration error: {0}")]
    Config(String),
    /// Reading a file or stdin failed.
    #[error("I/O error: {0}")]
    Io(String),
    /// The engine itself failed (only `Cancelled` ever reaches here;
    /// every other variant is folded into a `Response` with `error: Some`).
    #[error(transparent)]
    Engine(#[from] paathshala_types::EngineError),
    /// The retrieval engine failed.
    #[error(transparent)]
    Retrieval(#[from] paathshala_retrieval::RetrievalError),
    /// A JSON serialization step failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
