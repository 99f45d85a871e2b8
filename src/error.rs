//! Error types for cexpect

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// cexpect errors
///
/// The top-level inference entry point never surfaces these to callers;
/// it converts them into UNCERTAIN results. They exist so that internal
/// failures stay inspectable instead of being silently swallowed.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Expression evaluation error: {0}")]
    Eval(String),

    #[error("Condition match error: {0}")]
    Condition(String),

    #[error("Function tree error: {0}")]
    Tree(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
