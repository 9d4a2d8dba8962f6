//! Search orchestrator for running a profile across every enabled source.
//!
//! A run launches one shared browser session, drains every enabled source
//! concurrently, then scores, persists and deduplicates the combined batch
//! before writing one audit record. Per-source, per-record and persistence
//! failures are collected into the outcome's error list; only a failed
//! session launch or a lost audit record end the run with an error.

use crate::error::{Result, SearchError};
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use landscout_browser::{BrowserSession, RateLimiter, SessionLauncher};
use landscout_core::{Profile, Property, SearchCriteria, SourceSettings};
use landscout_db::{Database, SearchRun, UpsertOutcome};
use landscout_dedup::MatcherSet;
use landscout_scoring::score_property;
use landscout_source::{
    PropertySource, SearchCallbacks, SearchContext, SourceError, SourceRegistry,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

/// Error recorded when a profile enables no registered source.
pub const NO_SOURCES_MESSAGE: &str = "No enabled property sources";

/// Default base delay between page actions of one source.
const DEFAULT_RATE_LIMIT_MS: u64 = 2500;

/// Summary of one search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    /// Profile the run searched with
    pub profile_name: String,
    /// Audit record id, once written
    pub run_id: Option<i64>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub completed_at: DateTime<Utc>,
    /// Records yielded across all sources
    pub properties_found: u64,
    /// Records yielded per source
    pub found_by_source: BTreeMap<String, u64>,
    /// Sources attempted, in scheduling order
    pub sources_used: Vec<String>,
    /// Supported filter names per source
    pub filters_applied: BTreeMap<String, Vec<String>>,
    /// Everything that went wrong without ending the run
    pub errors: Vec<String>,
    /// Listings persisted for the first time
    pub inserted: u64,
    /// Listings whose content changed
    pub updated: u64,
    /// Listings seen again without changes
    pub unchanged: u64,
    /// Duplicate links written
    pub duplicates_linked: u64,
}

impl SearchOutcome {
    /// An empty outcome for `profile_name`, started now.
    #[must_use]
    pub fn new(profile_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            profile_name: profile_name.into(),
            run_id: None,
            started_at: now,
            completed_at: now,
            properties_found: 0,
            found_by_source: BTreeMap::new(),
            sources_used: Vec::new(),
            filters_applied: BTreeMap::new(),
            errors: Vec::new(),
            inserted: 0,
            updated: 0,
            unchanged: 0,
            duplicates_linked: 0,
        }
    }

    fn to_run(&self, criteria: &SearchCriteria) -> SearchRun {
        let criteria = serde_json::to_value(criteria).unwrap_or_else(|e| {
            tracing::warn!("failed to snapshot search criteria: {}", e);
            serde_json::Value::Null
        });

        SearchRun {
            id: None,
            profile_name: self.profile_name.clone(),
            started_at: self.started_at,
            completed_at: self.completed_at,
            properties_found: self.properties_found,
            sources_used: self.sources_used.clone(),
            filters_applied: self.filters_applied.clone(),
            criteria,
            errors: self.errors.clone(),
        }
    }
}

/// What one source task produced.
type SourceResult = std::result::Result<Vec<Property>, SourceError>;

/// Orchestrates search runs across the registered sources.
pub struct SearchOrchestrator {
    /// Sources available to profiles
    registry: Arc<SourceRegistry>,
    /// Duplicate matchers run over each batch
    matchers: Arc<MatcherSet>,
    /// Opens the shared browser session
    launcher: Arc<dyn SessionLauncher>,
    /// Repository for listings and run audit
    db: Arc<Database>,
    /// Base delay for each source's rate limiter
    rate_limit: Duration,
}

impl SearchOrchestrator {
    /// Create a new search orchestrator.
    #[must_use]
    pub fn new(
        registry: Arc<SourceRegistry>,
        matchers: Arc<MatcherSet>,
        launcher: Arc<dyn SessionLauncher>,
        db: Arc<Database>,
    ) -> Self {
        Self {
            registry,
            matchers,
            launcher,
            db,
            rate_limit: Duration::from_millis(DEFAULT_RATE_LIMIT_MS),
        }
    }

    /// Set the base delay between page actions of one source.
    #[must_use]
    pub fn with_rate_limit(mut self, delay: Duration) -> Self {
        self.rate_limit = delay;
        self
    }

    /// The repository runs are persisted to.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Run one search for `profile`.
    ///
    /// Returns the outcome even when sources failed; those failures are in
    /// `errors`. Fails only when the shared session cannot be launched or the
    /// audit record cannot be written.
    pub async fn run(
        &self,
        profile: &Profile,
        callbacks: &SearchCallbacks,
    ) -> Result<SearchOutcome> {
        let mut outcome = SearchOutcome::new(profile.name.clone());
        let criteria = &profile.criteria;

        let sources = self.registry.enabled_for(profile);
        if sources.is_empty() {
            tracing::warn!(profile = %profile.name, "{}", NO_SOURCES_MESSAGE);
            callbacks.progress(NO_SOURCES_MESSAGE);
            outcome.errors.push(NO_SOURCES_MESSAGE.to_string());
            return self.finish(outcome, criteria).await;
        }

        tracing::info!(
            profile = %profile.name,
            sources = sources.len(),
            "starting search run"
        );
        callbacks.progress(&format!("Searching {} sources", sources.len()));

        let session = match self.launcher.launch().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(
                    profile = %profile.name,
                    "failed to launch browser session: {}",
                    e
                );
                outcome
                    .errors
                    .push(format!("Failed to launch browser session: {e}"));
                outcome.completed_at = Utc::now();
                if let Err(audit) = self.db.record_run(&outcome.to_run(criteria)).await {
                    tracing::error!("failed to record aborted search run: {}", audit);
                }
                return Err(SearchError::SessionLaunch(e));
            }
        };

        for (source, _) in &sources {
            let name = source.name().to_string();
            outcome
                .filters_applied
                .insert(name.clone(), source.metadata().supported_filters.names());
            outcome.sources_used.push(name);
        }

        let results = self
            .fan_out(&sources, criteria, session.as_ref(), callbacks)
            .await;

        if let Err(e) = session.close().await {
            tracing::warn!("failed to close browser session: {}", e);
            outcome
                .errors
                .push(format!("Failed to close browser session: {e}"));
        }

        let mut properties = Vec::new();
        for (name, result) in results {
            match result {
                Ok(records) => {
                    tracing::info!(source = %name, found = records.len(), "source finished");
                    outcome.found_by_source.insert(name, records.len() as u64);
                    properties.extend(records);
                }
                Err(e) => {
                    tracing::error!(source = %name, "source failed: {}", e);
                    callbacks.error(&e);
                    outcome.found_by_source.insert(name.clone(), 0);
                    outcome.errors.push(format!("Error searching {name}: {e}"));
                }
            }
        }
        outcome.properties_found = properties.len() as u64;

        for property in &mut properties {
            property.score = Some(score_property(property, criteria));
            property.field_completeness = Some(property.field_completeness());
        }

        self.persist(&properties, &mut outcome).await;
        self.link_duplicates(&properties, &mut outcome).await;

        callbacks.progress(&format!(
            "Found {} properties from {} sources",
            outcome.properties_found,
            outcome.sources_used.len()
        ));
        self.finish(outcome, criteria).await
    }

    /// Drain every source concurrently, one page-action limiter each.
    ///
    /// A source that errors or panics yields no records; siblings keep going.
    async fn fan_out(
        &self,
        sources: &[(Arc<dyn PropertySource>, SourceSettings)],
        criteria: &SearchCriteria,
        session: &dyn BrowserSession,
        callbacks: &SearchCallbacks,
    ) -> Vec<(String, SourceResult)> {
        let rate_limit = self.rate_limit;

        let mut tasks: FuturesUnordered<_> = sources
            .iter()
            .map(|(source, _)| async move {
                let name = source.name().to_string();
                let limiter = RateLimiter::new(rate_limit);
                let ctx = SearchContext {
                    callbacks,
                    session: Some(session),
                    rate_limiter: &limiter,
                };

                let result = AssertUnwindSafe(drain(source.as_ref(), criteria, ctx))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        Err(SourceError::Panicked {
                            name: name.clone(),
                            message: panic_message(payload.as_ref()),
                        })
                    });
                (name, result)
            })
            .collect();

        let mut results = Vec::with_capacity(sources.len());
        while let Some(result) = tasks.next().await {
            results.push(result);
        }
        results
    }

    async fn persist(&self, properties: &[Property], outcome: &mut SearchOutcome) {
        for property in properties {
            match self.db.upsert(property).await {
                Ok(UpsertOutcome::Inserted) => outcome.inserted += 1,
                Ok(UpsertOutcome::Updated { .. }) => outcome.updated += 1,
                Ok(UpsertOutcome::Unchanged) => outcome.unchanged += 1,
                Err(e) => {
                    tracing::warn!(property_id = %property.id, "failed to save property: {}", e);
                    outcome
                        .errors
                        .push(format!("Failed to save property {}: {e}", property.id));
                }
            }
        }
    }

    async fn link_duplicates(&self, properties: &[Property], outcome: &mut SearchOutcome) {
        for link in self.matchers.find_links(properties) {
            let written = self
                .db
                .link_duplicates(
                    &link.canonical_id,
                    std::slice::from_ref(&link.duplicate_id),
                    &link.method,
                    link.confidence,
                )
                .await;

            match written {
                Ok(count) => outcome.duplicates_linked += count,
                Err(e) => {
                    tracing::warn!(
                        canonical_id = %link.canonical_id,
                        duplicate_id = %link.duplicate_id,
                        "failed to link duplicates: {}",
                        e
                    );
                    outcome.errors.push(format!(
                        "Failed to link duplicate {} -> {}: {e}",
                        link.duplicate_id, link.canonical_id
                    ));
                }
            }
        }
    }

    async fn finish(
        &self,
        mut outcome: SearchOutcome,
        criteria: &SearchCriteria,
    ) -> Result<SearchOutcome> {
        outcome.completed_at = Utc::now();

        match self.db.record_run(&outcome.to_run(criteria)).await {
            Ok(id) => {
                outcome.run_id = Some(id);
                tracing::info!(
                    run_id = id,
                    found = outcome.properties_found,
                    errors = outcome.errors.len(),
                    "search run complete"
                );
                Ok(outcome)
            }
            Err(source) => {
                tracing::error!("failed to record search run: {}", source);
                Err(SearchError::AuditFailed {
                    outcome: Box::new(outcome),
                    source,
                })
            }
        }
    }
}

/// Pull every record from one source.
///
/// `property_found` fires only once the stream has ended cleanly, so a source
/// that fails part way reports none of the records it is about to lose.
async fn drain(
    source: &dyn PropertySource,
    criteria: &SearchCriteria,
    ctx: SearchContext<'_>,
) -> SourceResult {
    let records = {
        let mut stream = source.search(criteria, ctx);
        let mut records = Vec::new();
        while let Some(item) = stream.next().await {
            records.push(item?);
        }
        records
    };

    for property in &records {
        ctx.callbacks.property_found(property);
    }
    Ok(records)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
