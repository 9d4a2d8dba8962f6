//! Landscout Source - the contract between the search pipeline and listing sites.
//!
//! Each listing site is wrapped by an adapter implementing [`PropertySource`].
//! Adapters declare which search filters they can apply and produce a finite
//! stream of normalized [`landscout_core::Property`] records.
//!
//! # Architecture
//!
//! - **Contract** ([`contract`]): metadata, callbacks and the streaming search trait
//! - **Registry** ([`registry`]): explicit set of adapters built at startup
//! - **Filters** ([`filter`]): helpers adapters use to post-filter and parse listings
//! - **Errors** ([`error`]): source-specific error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod contract;
pub mod error;
pub mod filter;
pub mod registry;

pub use contract::{
    PropertySource, PropertyStream, SearchCallbacks, SearchContext, SourceMetadata,
    SupportedFilters,
};
pub use error::{Result, SourceError};
pub use filter::{matches_local_filters, parse_acres, parse_price};
pub use registry::SourceRegistry;
