//! Change reports for scheduled searches.
//!
//! A monitored search remembers when the profile last ran, runs it again and
//! reports what appeared or changed price since then, emitting
//! [`MonitoringEvent`]s through a [`Notifier`]. Scheduling itself is left to
//! the caller.

use crate::error::Result;
use crate::notify::{EventKind, ListingSummary, MonitoringEvent, Notifier, PriceChangeSummary};
use crate::orchestrator::{SearchOrchestrator, SearchOutcome};
use chrono::{DateTime, Utc};
use landscout_core::{Profile, Property};
use landscout_source::SearchCallbacks;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A listing whose price moved since the previous run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChange {
    /// The listing as currently stored
    pub property: Property,
    /// Price in the latest snapshot taken before the previous run ended
    pub previous_price: Option<f64>,
    /// Current price
    pub current_price: Option<f64>,
    /// `current - previous`, when both are known
    pub delta: Option<f64>,
}

/// What a monitored search found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReport {
    /// The run itself
    pub outcome: SearchOutcome,
    /// Completion time of the previous run; `None` on the first run
    pub since: Option<DateTime<Utc>>,
    /// Listings first seen after `since`
    pub new_listings: Vec<Property>,
    /// Listings whose price changed after `since`
    pub price_changes: Vec<PriceChange>,
}

impl ChangeReport {
    /// Whether anything new or repriced turned up.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.new_listings.is_empty() || !self.price_changes.is_empty()
    }
}

/// Run `profile` and report changes since its previous run.
///
/// The first run of a profile reports no changes; everything it finds is
/// the baseline. Events go to `notifier`: new listings and price changes
/// when there are any, then search-complete, or search-error when the run
/// fails.
pub async fn run_monitored_search(
    orchestrator: &SearchOrchestrator,
    profile: &Profile,
    callbacks: &SearchCallbacks,
    notifier: &Notifier,
) -> Result<ChangeReport> {
    let started = Instant::now();

    match monitored_run(orchestrator, profile, callbacks).await {
        Ok(report) => {
            if !report.new_listings.is_empty() {
                let properties: Vec<ListingSummary> =
                    report.new_listings.iter().map(ListingSummary::from).collect();
                notifier
                    .notify(&MonitoringEvent::now(
                        &profile.name,
                        EventKind::NewProperties {
                            count: properties.len(),
                            properties,
                        },
                    ))
                    .await;
            }
            if !report.price_changes.is_empty() {
                let changes: Vec<PriceChangeSummary> =
                    report.price_changes.iter().map(PriceChangeSummary::from).collect();
                notifier
                    .notify(&MonitoringEvent::now(
                        &profile.name,
                        EventKind::PriceChanges {
                            count: changes.len(),
                            changes,
                        },
                    ))
                    .await;
            }
            notifier
                .notify(&MonitoringEvent::now(
                    &profile.name,
                    EventKind::SearchComplete {
                        total_properties: report.outcome.properties_found,
                        new_properties: report.new_listings.len(),
                        price_changes: report.price_changes.len(),
                        duration_ms: u64::try_from(started.elapsed().as_millis())
                            .unwrap_or(u64::MAX),
                    },
                ))
                .await;
            Ok(report)
        }
        Err(e) => {
            notifier
                .notify(&MonitoringEvent::now(
                    &profile.name,
                    EventKind::SearchError {
                        error: e.to_string(),
                    },
                ))
                .await;
            Err(e)
        }
    }
}

async fn monitored_run(
    orchestrator: &SearchOrchestrator,
    profile: &Profile,
    callbacks: &SearchCallbacks,
) -> Result<ChangeReport> {
    let db = orchestrator.database();
    let since = db.last_run_timestamp(Some(&profile.name)).await?;

    let outcome = orchestrator.run(profile, callbacks).await?;

    let Some(since) = since else {
        tracing::info!(profile = %profile.name, "first monitored run, recording baseline");
        return Ok(ChangeReport {
            outcome,
            since: None,
            new_listings: Vec::new(),
            price_changes: Vec::new(),
        });
    };

    let new_listings = db.new_since(since).await?;

    let mut price_changes = Vec::new();
    for property in db.changed_since(Some(since)).await? {
        let previous_price = db
            .snapshot_at_or_before(&property.id, since)
            .await?
            .and_then(|snapshot| snapshot.data.price);
        let current_price = property.price;

        price_changes.push(PriceChange {
            delta: current_price.zip(previous_price).map(|(now, before)| now - before),
            previous_price,
            current_price,
            property,
        });
    }

    tracing::info!(
        profile = %profile.name,
        new = new_listings.len(),
        repriced = price_changes.len(),
        "monitored search complete"
    );

    Ok(ChangeReport {
        outcome,
        since: Some(since),
        new_listings,
        price_changes,
    })
}
