//! Source adapter trait for fetching an entity's versions from upstream

use std::sync::Arc;

use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;

use crate::catalog::types::VersionKind;
use crate::catalog::upserter::{UpsertOutcome, VersionUpserter};
use crate::source::error::SourceError;
use crate::source::http::HttpClient;
use crate::source::normalizer::LabelNormalizer;
use crate::sync::entry::{SourceKind, SyncConfig};

/// Collaborators shared by every adapter during one run
pub struct SyncContext {
    pub http: Arc<HttpClient>,
    pub upserter: Arc<VersionUpserter>,
    pub normalizer: Arc<LabelNormalizer>,
}

impl SyncContext {
    pub fn new(
        http: Arc<HttpClient>,
        upserter: Arc<VersionUpserter>,
        normalizer: Arc<LabelNormalizer>,
    ) -> Self {
        Self {
            http,
            upserter,
            normalizer,
        }
    }

    /// Normalizes `raw` for `entity_key` and writes it into the `kind` slot
    pub fn set_normalized(
        &self,
        entity_key: &str,
        kind: VersionKind,
        raw: &str,
        release_date: Option<DateTime<Utc>>,
    ) -> Result<UpsertOutcome, SourceError> {
        let label = self.normalizer.normalize(entity_key, raw);
        self.set_version(entity_key, kind, &label, release_date)
    }

    /// Writes `label` as-is into the `kind` slot
    pub fn set_version(
        &self,
        entity_key: &str,
        kind: VersionKind,
        label: &str,
        release_date: Option<DateTime<Utc>>,
    ) -> Result<UpsertOutcome, SourceError> {
        Ok(self
            .upserter
            .set_version(entity_key, kind, label, release_date)?)
    }
}

/// Trait for syncing one entity's versions from its upstream source
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Returns the source kind this adapter handles
    fn kind(&self) -> SourceKind;

    /// Fetches the entity's upstream versions and writes them through the
    /// context's upserter
    ///
    /// # Returns
    /// * `Ok(())` - Fetch succeeded. Slots may still be left untouched when
    ///   the upstream data held no recognizable version (logged as a warning).
    /// * `Err(SourceError)` - Fetch or write failed. Slots written before the
    ///   failure stay written.
    async fn sync(&self, entry: &SyncConfig, ctx: &SyncContext) -> Result<(), SourceError>;
}
