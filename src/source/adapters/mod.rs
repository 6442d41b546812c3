//! Source adapter implementations and the registry that selects them

pub mod custom;
pub mod registry_api;
pub mod release_api;
pub mod tag_api;

pub use custom::CustomRegistry;
pub use registry_api::RegistryApiAdapter;
pub use release_api::ReleaseApiAdapter;
pub use tag_api::TagApiAdapter;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::config::Endpoints;
use crate::source::adapter::SourceAdapter;
use crate::source::error::SourceError;
use crate::sync::entry::{SourceKind, SyncConfig};

/// Selects the adapter for a sync entry
///
/// Structural adapters are keyed by [`SourceKind`]. Custom entries are
/// resolved through the [`CustomRegistry`] by entity key, then by locator.
pub struct AdapterRegistry {
    adapters: HashMap<SourceKind, Arc<dyn SourceAdapter>>,
    custom: CustomRegistry,
}

impl AdapterRegistry {
    pub fn new(custom: CustomRegistry) -> Self {
        Self {
            adapters: HashMap::new(),
            custom,
        }
    }

    /// Registry with every built-in adapter pointed at `endpoints`
    pub fn builtin(endpoints: &Endpoints) -> Self {
        Self::new(CustomRegistry::builtin(endpoints))
            .register(Arc::new(RegistryApiAdapter::new(endpoints)))
            .register(Arc::new(ReleaseApiAdapter::new(&endpoints.github)))
            .register(Arc::new(TagApiAdapter::new(&endpoints.github)))
    }

    /// Adds or replaces the adapter for its kind
    pub fn register(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapters.insert(adapter.kind(), adapter);
        self
    }

    pub fn custom(&self) -> &CustomRegistry {
        &self.custom
    }

    pub fn adapter_for(&self, entry: &SyncConfig) -> Option<Arc<dyn SourceAdapter>> {
        match entry.source_kind {
            SourceKind::Custom => self.custom.resolve(entry),
            kind => self.adapters.get(&kind).cloned(),
        }
    }
}

/// Splits an `<owner>/<repo>` locator
pub fn parse_repo(locator: &str) -> Result<(&str, &str), SourceError> {
    match locator.split_once('/') {
        Some((owner, repo))
            if !owner.is_empty()
                && !repo.is_empty()
                && !repo.contains('/')
                && !locator.contains(char::is_whitespace) =>
        {
            Ok((owner, repo))
        }
        _ => Err(SourceError::InvalidLocator(format!(
            "{locator:?} is not <owner>/<repo>"
        ))),
    }
}

/// Midnight UTC of a calendar date
pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
