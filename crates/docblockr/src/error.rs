//! Configuration errors.
//!
//! Only configuration loading can fail. Matching and rendering report
//! "nothing found" through `Option` and empty results instead.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error variants raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a configuration file.
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON or has the wrong shape.
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    /// A template has mismatched literal/section counts or bad brace syntax.
    #[error("invalid template '{name}': {reason}")]
    Template { name: String, reason: String },

    /// A notation `regex` check does not compile.
    #[error("invalid notation pattern for {type_name} ({pattern}): {source}")]
    Notation {
        type_name: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl Error {
    pub(crate) fn template(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Template {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
