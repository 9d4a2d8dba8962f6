//! Landscout Search - Search run orchestration.
//!
//! This crate runs a search profile end to end: it resolves the profile's
//! enabled sources, shares one browser session between them, drains them
//! concurrently, then scores, persists and deduplicates the combined batch
//! and records an audit entry for the run.
//!
//! # Features
//!
//! - Concurrent source fan-out with per-source rate limiting
//! - Per-source failure isolation, including panics
//! - Change detection and duplicate links through the repository
//! - Monitored runs that report new and repriced listings
//! - Console and JSON-lines notifications for monitored runs
//!
//! # Example
//!
//! ```rust,ignore
//! use landscout_search::SearchOrchestrator;
//! use std::sync::Arc;
//!
//! let orchestrator = SearchOrchestrator::new(
//!     Arc::new(registry),
//!     Arc::new(MatcherSet::default()),
//!     Arc::new(ChromiumLauncher::new(options)),
//!     Arc::new(database),
//! );
//!
//! let outcome = orchestrator.run(&profile, &SearchCallbacks::default()).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod monitor;
pub mod notify;
pub mod orchestrator;

// Re-export commonly used types
pub use error::{Result, SearchError};
pub use monitor::{run_monitored_search, ChangeReport, PriceChange};
pub use notify::{
    ConsoleNotifier, EventKind, FileNotifier, ListingSummary, MonitoringEvent,
    NotificationProvider, Notifier, PriceChangeSummary,
};
pub use orchestrator::{SearchOrchestrator, SearchOutcome, NO_SOURCES_MESSAGE};
