//! Explicit registry of listing sources, built once at startup.

use crate::{
    contract::PropertySource,
    error::{Result, SourceError},
};
use landscout_core::{Profile, SourceSettings};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The set of adapters known to the process.
///
/// Built from an explicit list at startup and then shared read-only with the
/// orchestrator.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    /// Adapters indexed by source name
    sources: BTreeMap<String, Arc<dyn PropertySource>>,
}

impl SourceRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of adapters.
    pub fn with_sources(
        sources: impl IntoIterator<Item = Arc<dyn PropertySource>>,
    ) -> Result<Self> {
        let mut registry = Self::new();
        for source in sources {
            registry.register(source)?;
        }
        info!(count = registry.count(), "registered property sources");
        Ok(registry)
    }

    /// Add an adapter. Names must be unique.
    pub fn register(&mut self, source: Arc<dyn PropertySource>) -> Result<()> {
        source.metadata().validate()?;

        let name = source.name().to_string();
        if self.sources.contains_key(&name) {
            return Err(SourceError::AlreadyRegistered { name });
        }

        debug!(source = %name, "registered source");
        self.sources.insert(name, source);
        Ok(())
    }

    /// Get an adapter by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn PropertySource>> {
        self.sources
            .get(name)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                name: name.to_string(),
            })
    }

    /// Check if a source exists in the registry.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// All registered source names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }

    /// Get the total number of registered sources.
    #[must_use]
    pub fn count(&self) -> usize {
        self.sources.len()
    }

    /// Sources the profile enables, highest priority first.
    ///
    /// Ties are broken by name so scheduling order is stable. Enabled
    /// sources that are not registered are skipped with a warning.
    #[must_use]
    pub fn enabled_for(
        &self,
        profile: &Profile,
    ) -> Vec<(Arc<dyn PropertySource>, SourceSettings)> {
        let mut enabled: Vec<_> = profile
            .sources
            .iter()
            .filter(|(_, settings)| settings.enabled)
            .filter_map(|(name, settings)| match self.sources.get(name) {
                Some(source) => Some((Arc::clone(source), *settings)),
                None => {
                    warn!(
                        source = %name,
                        profile = %profile.name,
                        "enabled source is not registered"
                    );
                    None
                }
            })
            .collect();

        enabled.sort_by(|(a, a_settings), (b, b_settings)| {
            b_settings
                .priority
                .cmp(&a_settings.priority)
                .then_with(|| a.name().cmp(b.name()))
        });
        enabled
    }
}
