//! GitHub tags API adapter
//!
//! Tags carry no dates, so every slot written here has no release date.
//! The entity key selects one of three succession profiles:
//!
//! - draft succession (`C++`): working drafts are tagged `nNNNN`; the newest
//!   draft goes to `Standard` and the published standard to `Current`
//! - edition succession (`ECMAScript`, or any entry with `wants_edition`):
//!   `esNNNN` tags become an `ES<year>` edition
//! - everything else: the greatest semver-like tag goes to `Current`, with
//!   pattern-based fallbacks for tag sets that do not coerce

use std::sync::LazyLock;

use futures::future::join_all;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::catalog::types::VersionKind;
use crate::config::{MAX_TAG_PAGES, TAGS_PER_PAGE};
use crate::source::adapter::{SourceAdapter, SyncContext};
use crate::source::adapters::parse_repo;
use crate::source::error::SourceError;
use crate::source::http::Auth;
use crate::source::parsers::{pick_draft_tag, pick_fallback_version, pick_latest_semver, pick_lts_semver};
use crate::sync::entry::{SourceKind, SyncConfig};

/// Latest published C++ standard, written alongside the newest draft
pub const PUBLISHED_CPP_STANDARD: &str = "C++23";

static EDITION_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^es(\d{4})$").unwrap());

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Profile {
    DraftSuccession,
    EditionSuccession,
    Semver,
}

impl Profile {
    fn for_entry(entry: &SyncConfig) -> Self {
        match entry.entity_key.to_lowercase().as_str() {
            "c++" => Profile::DraftSuccession,
            "ecmascript" => Profile::EditionSuccession,
            _ if entry.wants_edition => Profile::EditionSuccession,
            _ => Profile::Semver,
        }
    }
}

/// Newest `esNNNN` tag rendered as `ES<NNNN>`
pub fn pick_edition<S: AsRef<str>>(tags: &[S]) -> Option<String> {
    tags.iter()
        .filter_map(|tag| {
            EDITION_TAG_RE
                .captures(tag.as_ref())?
                .get(1)?
                .as_str()
                .parse::<u32>()
                .ok()
        })
        .max()
        .map(|year| format!("ES{year}"))
}

pub struct TagApiAdapter {
    base_url: String,
}

impl TagApiAdapter {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }

    async fn fetch_page(
        &self,
        owner: &str,
        repo: &str,
        page: usize,
        ctx: &SyncContext,
    ) -> Result<Vec<String>, SourceError> {
        let url = format!(
            "{}/repos/{}/{}/tags?per_page={}&page={}",
            self.base_url, owner, repo, TAGS_PER_PAGE, page
        );
        let tags: Vec<Tag> = ctx.http.get_json(&url, Auth::SourceHost).await?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }

    /// Fetches up to [`MAX_TAG_PAGES`] pages of tag names
    ///
    /// Page 1 decides whether more pages exist. The rest are fetched
    /// concurrently and concatenated in page order up to the first short page.
    async fn fetch_tags(
        &self,
        owner: &str,
        repo: &str,
        ctx: &SyncContext,
    ) -> Result<Vec<String>, SourceError> {
        let mut tags = self.fetch_page(owner, repo, 1, ctx).await?;
        if tags.len() < TAGS_PER_PAGE {
            return Ok(tags);
        }

        let pages = join_all(
            (2..=MAX_TAG_PAGES).map(|page| self.fetch_page(owner, repo, page, ctx)),
        )
        .await;

        for page in pages {
            let page = page?;
            let short = page.len() < TAGS_PER_PAGE;
            tags.extend(page);
            if short {
                break;
            }
        }

        debug!(owner, repo, count = tags.len(), "Fetched tags");
        Ok(tags)
    }

    fn sync_draft_succession(
        &self,
        entry: &SyncConfig,
        tags: &[String],
        ctx: &SyncContext,
    ) -> Result<(), SourceError> {
        match pick_draft_tag(tags) {
            Some(draft) => {
                ctx.set_version(&entry.entity_key, VersionKind::Standard, &draft, None)?;
            }
            None => warn!(repo = %entry.source_locator, "No draft tags found"),
        }
        ctx.set_version(
            &entry.entity_key,
            VersionKind::Current,
            PUBLISHED_CPP_STANDARD,
            None,
        )?;
        Ok(())
    }

    fn sync_edition_succession(
        &self,
        entry: &SyncConfig,
        tags: &[String],
        ctx: &SyncContext,
    ) -> Result<(), SourceError> {
        match pick_edition(tags) {
            Some(edition) => {
                ctx.set_version(&entry.entity_key, VersionKind::Edition, &edition, None)?;
            }
            None => warn!(repo = %entry.source_locator, "No edition tags found"),
        }
        Ok(())
    }

    fn sync_semver(
        &self,
        entry: &SyncConfig,
        tags: &[String],
        ctx: &SyncContext,
    ) -> Result<(), SourceError> {
        match pick_latest_semver(tags).or_else(|| pick_fallback_version(tags)) {
            Some(latest) => {
                ctx.set_normalized(&entry.entity_key, VersionKind::Current, &latest, None)?;
            }
            None => warn!(repo = %entry.source_locator, "No recognizable version tag"),
        }

        if !entry.wants_lts {
            return Ok(());
        }

        let Some(prefix) = entry.lts_tag_prefix.as_deref() else {
            warn!(repo = %entry.source_locator, "LTS requested without a tag prefix, skipping");
            return Ok(());
        };

        match pick_lts_semver(tags, prefix) {
            Some(lts) => {
                ctx.set_normalized(&entry.entity_key, VersionKind::Lts, &lts, None)?;
            }
            None => warn!(repo = %entry.source_locator, prefix, "No tag matches the LTS prefix"),
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SourceAdapter for TagApiAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::TagApi
    }

    async fn sync(&self, entry: &SyncConfig, ctx: &SyncContext) -> Result<(), SourceError> {
        let (owner, repo) = parse_repo(&entry.source_locator)?;
        let tags = self.fetch_tags(owner, repo, ctx).await?;

        match Profile::for_entry(entry) {
            Profile::DraftSuccession => self.sync_draft_succession(entry, &tags, ctx),
            Profile::EditionSuccession => self.sync_edition_succession(entry, &tags, ctx),
            Profile::Semver => self.sync_semver(entry, &tags, ctx),
        }
    }
}
