//! .NET release metadata index

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

use crate::catalog::types::VersionKind;
use crate::source::adapter::{SourceAdapter, SyncContext};
use crate::source::adapters::start_of_day;
use crate::source::error::SourceError;
use crate::source::http::Auth;
use crate::sync::entry::{SourceKind, SyncConfig};

#[derive(Debug, Deserialize)]
struct ReleasesIndex {
    #[serde(rename = "releases-index")]
    releases: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Channel {
    latest_release: String,
    latest_release_date: Option<NaiveDate>,
    release_type: String,
    support_phase: String,
}

impl Channel {
    /// Previews and end-of-life channels are never written
    fn is_supported(&self) -> bool {
        matches!(self.support_phase.as_str(), "active" | "maintenance")
    }

    fn is_lts(&self) -> bool {
        self.release_type.eq_ignore_ascii_case("lts")
    }
}

/// Writes the newest supported channel as `Current` and the newest supported
/// LTS channel as `Lts`
pub struct DotnetSource {
    base_url: String,
}

impl DotnetSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for DotnetSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Custom
    }

    async fn sync(&self, entry: &SyncConfig, ctx: &SyncContext) -> Result<(), SourceError> {
        let url = format!(
            "{}/dotnet/release-metadata/releases-index.json",
            self.base_url
        );
        let index: ReleasesIndex = ctx.http.get_json(&url, Auth::Anonymous).await?;
        let mut supported = index.releases.iter().filter(|c| c.is_supported());

        match supported.next() {
            Some(current) => {
                ctx.set_normalized(
                    &entry.entity_key,
                    VersionKind::Current,
                    &current.latest_release,
                    current.latest_release_date.map(start_of_day),
                )?;
            }
            None => warn!("No supported .NET channel in releases index"),
        }

        if entry.wants_lts {
            let lts = index
                .releases
                .iter()
                .find(|c| c.is_supported() && c.is_lts());
            match lts {
                Some(lts) => {
                    ctx.set_normalized(
                        &entry.entity_key,
                        VersionKind::Lts,
                        &lts.latest_release,
                        lts.latest_release_date.map(start_of_day),
                    )?;
                }
                None => warn!("No supported .NET LTS channel in releases index"),
            }
        }

        Ok(())
    }
}
