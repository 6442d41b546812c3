//! WHATWG living standards

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, warn};

use crate::catalog::types::VersionKind;
use crate::source::adapter::{SourceAdapter, SyncContext};
use crate::source::adapters::start_of_day;
use crate::source::error::SourceError;
use crate::source::http::Auth;
use crate::sync::entry::{SourceKind, SyncConfig};

pub const LIVING_STANDARD_LABEL: &str = "Living Standard";

static LAST_UPDATED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Last Updated\s*(?:<[^>]*>\s*)*(\d{1,2}\s+[A-Z][a-z]+\s+\d{4})").unwrap()
});

/// Date of the `Last Updated 17 October 2024` banner, if present
fn last_updated(page: &str) -> Option<NaiveDate> {
    let caps = LAST_UPDATED_RE.captures(page)?;
    let text = caps.get(1)?.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDate::parse_from_str(&text, "%d %B %Y").ok()
}

/// Writes `Living Standard` with the page's last-updated date
pub struct WhatwgSource {
    base_url: String,
}

impl WhatwgSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for WhatwgSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Custom
    }

    async fn sync(&self, entry: &SyncConfig, ctx: &SyncContext) -> Result<(), SourceError> {
        let url = format!("{}/multipage/", self.base_url);
        let page = ctx.http.get_text(&url, Auth::Anonymous).await?;

        if !page.contains(LIVING_STANDARD_LABEL) {
            warn!(%url, "Page does not look like a living standard");
            return Ok(());
        }

        let updated = last_updated(&page);
        if updated.is_none() {
            debug!(%url, "No last-updated date on page");
        }

        ctx.set_version(
            &entry.entity_key,
            VersionKind::LivingStandard,
            LIVING_STANDARD_LABEL,
            updated.map(start_of_day),
        )?;
        Ok(())
    }
}
