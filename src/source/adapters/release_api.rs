//! GitHub Releases API adapter

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::catalog::types::VersionKind;
use crate::source::adapter::{SourceAdapter, SyncContext};
use crate::source::adapters::parse_repo;
use crate::source::error::SourceError;
use crate::source::http::Auth;
use crate::sync::entry::{SourceKind, SyncConfig};

/// Response from the latest-release endpoint
#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    published_at: Option<DateTime<Utc>>,
}

/// Writes the latest published release of `<owner>/<repo>` as `Current`
pub struct ReleaseApiAdapter {
    base_url: String,
}

impl ReleaseApiAdapter {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for ReleaseApiAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::ReleaseApi
    }

    async fn sync(&self, entry: &SyncConfig, ctx: &SyncContext) -> Result<(), SourceError> {
        let (owner, repo) = parse_repo(&entry.source_locator)?;
        let url = format!("{}/repos/{}/{}/releases/latest", self.base_url, owner, repo);

        let release: Release = ctx.http.get_json(&url, Auth::SourceHost).await?;

        if release.tag_name.trim().is_empty() {
            warn!(repo = %entry.source_locator, "Latest release has an empty tag name");
            return Ok(());
        }

        ctx.set_normalized(
            &entry.entity_key,
            VersionKind::Current,
            &release.tag_name,
            release.published_at,
        )?;
        Ok(())
    }
}
