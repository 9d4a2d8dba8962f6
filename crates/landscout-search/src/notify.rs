//! Notifications emitted by monitored searches.
//!
//! A [`Notifier`] fans one [`MonitoringEvent`] out to every registered
//! [`NotificationProvider`]. Delivery failures are logged and never fail the
//! search that produced the event.

use crate::error::{Result, SearchError};
use crate::monitor::PriceChange;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use landscout_core::{Property, PropertyId};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Something worth telling the user about a monitored search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringEvent {
    /// When the event was raised
    pub timestamp: DateTime<Utc>,
    /// Profile the search ran with
    #[serde(rename = "profile")]
    pub profile_name: String,
    /// What happened
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Event payloads, tagged by `type` when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventKind {
    /// Listings seen for the first time since the previous run
    #[serde(rename_all = "camelCase")]
    NewProperties {
        /// Number of new listings
        count: usize,
        /// The listings
        properties: Vec<ListingSummary>,
    },
    /// Listings whose price moved since the previous run
    #[serde(rename_all = "camelCase")]
    PriceChanges {
        /// Number of repriced listings
        count: usize,
        /// The changes
        changes: Vec<PriceChangeSummary>,
    },
    /// The search finished
    #[serde(rename_all = "camelCase")]
    SearchComplete {
        /// Records yielded across all sources
        total_properties: u64,
        /// New listings reported
        new_properties: usize,
        /// Price changes reported
        price_changes: usize,
        /// Wall time of the search in milliseconds
        duration_ms: u64,
    },
    /// The search could not run
    #[serde(rename_all = "camelCase")]
    SearchError {
        /// Error message
        error: String,
    },
}

/// The fields of a listing a notification carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummary {
    /// Listing id
    pub id: PropertyId,
    /// Listing title
    pub title: String,
    /// Listing URL
    pub url: String,
    /// Current price
    pub price: Option<f64>,
    /// Parcel size
    pub acres: Option<f64>,
}

impl From<&Property> for ListingSummary {
    fn from(property: &Property) -> Self {
        Self {
            id: property.id.clone(),
            title: property.title.clone(),
            url: property.url.clone(),
            price: property.price,
            acres: property.acres,
        }
    }
}

/// One price change as carried by a notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChangeSummary {
    /// Listing id
    pub property_id: PropertyId,
    /// Listing title
    pub title: String,
    /// Price before the change
    pub old_price: Option<f64>,
    /// Price after the change
    pub new_price: Option<f64>,
    /// `new - old`, when both are known
    pub change: Option<f64>,
}

impl From<&PriceChange> for PriceChangeSummary {
    fn from(change: &PriceChange) -> Self {
        Self {
            property_id: change.property.id.clone(),
            title: change.property.title.clone(),
            old_price: change.previous_price,
            new_price: change.current_price,
            change: change.delta,
        }
    }
}

impl MonitoringEvent {
    /// Event stamped now.
    #[must_use]
    pub fn now(profile_name: impl Into<String>, kind: EventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            profile_name: profile_name.into(),
            kind,
        }
    }

    /// One-line human summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let prefix = format!(
            "[{}] [{}]",
            self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            self.profile_name
        );
        match &self.kind {
            EventKind::NewProperties { count, .. } => {
                format!("{prefix} Found {count} new properties")
            }
            EventKind::PriceChanges { count, .. } => {
                format!("{prefix} Detected {count} price changes")
            }
            EventKind::SearchComplete {
                total_properties,
                new_properties,
                price_changes,
                duration_ms,
            } => {
                #[allow(clippy::cast_precision_loss)]
                let seconds = *duration_ms as f64 / 1000.0;
                format!(
                    "{prefix} Search completed in {seconds:.1}s - {total_properties} total, \
                     {new_properties} new, {price_changes} price changes"
                )
            }
            EventKind::SearchError { error } => format!("{prefix} Search failed: {error}"),
        }
    }
}

/// A destination for monitoring events.
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    /// Provider name used in logs.
    fn name(&self) -> &str;

    /// Deliver one event.
    async fn send(&self, event: &MonitoringEvent) -> Result<()>;
}

/// Writes each event's summary to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

#[async_trait]
impl NotificationProvider for ConsoleNotifier {
    fn name(&self) -> &str {
        "console"
    }

    async fn send(&self, event: &MonitoringEvent) -> Result<()> {
        let message = event.summary();
        match event.kind {
            EventKind::SearchError { .. } => tracing::error!("{}", message),
            _ => tracing::info!("{}", message),
        }
        Ok(())
    }
}

/// Appends each event as one JSON line to a file.
#[derive(Debug, Clone)]
pub struct FileNotifier {
    path: PathBuf,
}

impl FileNotifier {
    /// Default file name inside an output directory.
    pub const DEFAULT_FILE_NAME: &'static str = "monitoring.log";

    /// Append to `path`; parent directories are created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append to [`Self::DEFAULT_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(Self::DEFAULT_FILE_NAME))
    }

    /// The file events are written to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SearchError {
        SearchError::Notification {
            provider: self.name().to_string(),
            source,
        }
    }
}

#[async_trait]
impl NotificationProvider for FileNotifier {
    fn name(&self) -> &str {
        "file"
    }

    async fn send(&self, event: &MonitoringEvent) -> Result<()> {
        let mut line = serde_json::to_string(event).map_err(|e| self.io_error(e.into()))?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

/// The set of providers a monitored search reports to.
#[derive(Clone, Default)]
pub struct Notifier {
    providers: Vec<Arc<dyn NotificationProvider>>,
}

impl Notifier {
    /// Notifier with no providers; events are dropped.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn NotificationProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no provider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Deliver `event` to every provider, logging failures.
    pub async fn notify(&self, event: &MonitoringEvent) {
        let sends = self.providers.iter().map(|provider| async move {
            if let Err(e) = provider.send(event).await {
                tracing::warn!(provider = provider.name(), "failed to deliver notification: {}", e);
            }
        });
        futures::future::join_all(sends).await;
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_noon(kind: EventKind) -> MonitoringEvent {
        MonitoringEvent {
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            profile_name: "montana".to_string(),
            kind,
        }
    }

    fn every_kind() -> Vec<MonitoringEvent> {
        let property = Property {
            price: Some(450_000.0),
            acres: Some(40.0),
            ..Property::new("landwatch", "1", "https://landwatch.test/1", "Timber")
        };
        let change = PriceChange {
            previous_price: Some(480_000.0),
            current_price: Some(450_000.0),
            delta: Some(-30_000.0),
            property: property.clone(),
        };
        vec![
            at_noon(EventKind::NewProperties {
                count: 1,
                properties: vec![ListingSummary::from(&property)],
            }),
            at_noon(EventKind::PriceChanges {
                count: 1,
                changes: vec![PriceChangeSummary::from(&change)],
            }),
            at_noon(EventKind::SearchComplete {
                total_properties: 12,
                new_properties: 1,
                price_changes: 1,
                duration_ms: 4200,
            }),
            at_noon(EventKind::SearchError {
                error: "failed to launch shared browser session".to_string(),
            }),
        ]
    }

    #[test]
    fn test_summaries() {
        let summaries: Vec<String> = every_kind().iter().map(MonitoringEvent::summary).collect();
        let prefix = "[2024-06-01T12:00:00.000Z] [montana]";
        assert_eq!(summaries[0], format!("{prefix} Found 1 new properties"));
        assert_eq!(summaries[1], format!("{prefix} Detected 1 price changes"));
        assert_eq!(
            summaries[2],
            format!("{prefix} Search completed in 4.2s - 12 total, 1 new, 1 price changes")
        );
        assert_eq!(
            summaries[3],
            format!("{prefix} Search failed: failed to launch shared browser session")
        );
    }

    #[test]
    fn test_event_json_shape() {
        let events = every_kind();
        let json = serde_json::to_value(&events[1]).expect("serialize");
        assert_eq!(json["type"], "priceChanges");
        assert_eq!(json["profile"], "montana");
        assert_eq!(json["changes"][0]["oldPrice"], 480_000.0);
        assert_eq!(json["changes"][0]["change"], -30_000.0);

        let json = serde_json::to_value(&events[2]).expect("serialize");
        assert_eq!(json["type"], "searchComplete");
        assert_eq!(json["totalProperties"], 12);
        assert_eq!(json["durationMs"], 4200);
    }

    #[tokio::test]
    async fn test_console_notifier_accepts_every_kind() {
        for event in every_kind() {
            ConsoleNotifier.send(&event).await.expect("log event");
        }
    }

    #[tokio::test]
    async fn test_file_notifier_appends_json_lines() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let notifier = FileNotifier::in_dir(dir.path().join("events"));

        for event in every_kind() {
            notifier.send(&event).await.expect("write event");
        }

        let contents = std::fs::read_to_string(notifier.path()).expect("read log");
        let types: Vec<String> = contents
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).expect("json line");
                value["type"].as_str().unwrap_or_default().to_string()
            })
            .collect();
        assert_eq!(
            types,
            vec!["newProperties", "priceChanges", "searchComplete", "searchError"]
        );
        assert!(contents.contains("https://landwatch.test/1"));
    }

    #[tokio::test]
    async fn test_notifier_survives_failing_provider() {
        let dir = tempfile::tempdir().expect("create temp dir");
        // A directory where the file should be makes every append fail.
        let blocked = dir.path().join("blocked");
        std::fs::create_dir(&blocked).expect("create dir");
        let good = FileNotifier::new(dir.path().join("good.log"));

        let notifier = Notifier::new()
            .with_provider(Arc::new(FileNotifier::new(&blocked)))
            .with_provider(Arc::new(good.clone()));
        assert_eq!(notifier.len(), 2);

        notifier.notify(&every_kind()[3]).await;
        let contents = std::fs::read_to_string(good.path()).expect("read log");
        assert_eq!(contents.lines().count(), 1);
    }
}
