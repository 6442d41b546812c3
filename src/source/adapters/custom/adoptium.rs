//! Adoptium (Eclipse Temurin) available-releases feed

use serde::Deserialize;

use crate::catalog::types::VersionKind;
use crate::source::adapter::{SourceAdapter, SyncContext};
use crate::source::error::SourceError;
use crate::source::http::Auth;
use crate::sync::entry::{SourceKind, SyncConfig};

#[derive(Debug, Deserialize)]
struct AvailableReleases {
    most_recent_feature_release: u32,
    most_recent_lts: u32,
}

/// Writes the newest Java feature release as `Current` and the newest LTS
/// feature release as `Lts`
pub struct AdoptiumSource {
    base_url: String,
}

impl AdoptiumSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for AdoptiumSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Custom
    }

    async fn sync(&self, entry: &SyncConfig, ctx: &SyncContext) -> Result<(), SourceError> {
        let url = format!("{}/v3/info/available_releases", self.base_url);
        let releases: AvailableReleases = ctx.http.get_json(&url, Auth::Anonymous).await?;

        ctx.set_normalized(
            &entry.entity_key,
            VersionKind::Current,
            &releases.most_recent_feature_release.to_string(),
            None,
        )?;

        if entry.wants_lts {
            ctx.set_normalized(
                &entry.entity_key,
                VersionKind::Lts,
                &releases.most_recent_lts.to_string(),
                None,
            )?;
        }

        Ok(())
    }
}
