//! Error types for search runs.
//!
//! Only setup failures and a lost audit record end a run; every other failure
//! is folded into the run's error list. Notification failures are logged by
//! the notifier.

use crate::orchestrator::SearchOutcome;
use landscout_browser::BrowserError;
use landscout_db::DatabaseError;
use thiserror::Error;

/// Errors that end a search run.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The shared browser session could not be launched; no source ran
    #[error("failed to launch shared browser session: {0}")]
    SessionLaunch(#[source] BrowserError),

    /// The run finished but its audit record could not be written
    #[error("search run finished but its audit record was lost: {source}")]
    AuditFailed {
        /// Everything the run produced
        outcome: Box<SearchOutcome>,
        /// Why the write failed
        source: DatabaseError,
    },

    /// Repository query failed outside the run itself
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// A notification provider could not deliver an event
    #[error("notification provider '{provider}' failed: {source}")]
    Notification {
        /// Provider name
        provider: String,
        /// Underlying I/O failure
        source: std::io::Error,
    },
}

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
