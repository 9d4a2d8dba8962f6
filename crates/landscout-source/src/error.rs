//! Error types for listing sources.

use landscout_browser::BrowserError;
use thiserror::Error;

/// Errors raised by source adapters and the source registry.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Browser failure while scraping
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),

    /// The site returned something the adapter could not handle
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The adapter needs a browser session and none was supplied
    #[error("source '{name}' requires a browser session")]
    SessionRequired {
        /// Source name
        name: String,
    },

    /// The adapter task panicked
    #[error("source '{name}' panicked: {message}")]
    Panicked {
        /// Source name
        name: String,
        /// Panic payload, when it was a string
        message: String,
    },

    /// A source with this name is already registered
    #[error("source '{name}' is already registered")]
    AlreadyRegistered {
        /// Source name
        name: String,
    },

    /// No source with this name is registered
    #[error("source not found: {name}")]
    NotFound {
        /// Source name
        name: String,
    },

    /// Adapter metadata failed validation
    #[error("invalid metadata for source '{name}': {reason}")]
    InvalidMetadata {
        /// Source name
        name: String,
        /// Reason for validation failure
        reason: String,
    },
}

/// Result type for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;
