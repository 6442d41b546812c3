//! C language standard scraped from cppreference

use tracing::warn;

use crate::catalog::types::VersionKind;
use crate::source::adapter::{SourceAdapter, SyncContext};
use crate::source::error::SourceError;
use crate::source::http::Auth;
use crate::source::parsers::{C_STANDARDS, detect_standard_years};
use crate::sync::entry::{SourceKind, SyncConfig};

/// Writes the newest C standard mentioned on the language page as `Standard`
pub struct CStandardSource {
    base_url: String,
}

impl CStandardSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for CStandardSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Custom
    }

    async fn sync(&self, entry: &SyncConfig, ctx: &SyncContext) -> Result<(), SourceError> {
        let url = format!("{}/w/c/language/history", self.base_url);
        let page = ctx.http.get_text(&url, Auth::Anonymous).await?;

        match detect_standard_years(&page, C_STANDARDS).first() {
            Some(standard) => {
                ctx.set_version(&entry.entity_key, VersionKind::Standard, standard, None)?;
            }
            None => warn!(%url, "No known C standard mentioned on page"),
        }
        Ok(())
    }
}
