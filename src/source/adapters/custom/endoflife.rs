//! endoflife.date product feeds

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::catalog::types::VersionKind;
use crate::source::adapter::{SourceAdapter, SyncContext};
use crate::source::adapters::start_of_day;
use crate::source::error::SourceError;
use crate::source::http::Auth;
use crate::sync::entry::{SourceKind, SyncConfig};

/// One release cycle; the feed lists cycles newest first
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Cycle {
    cycle: String,
    #[serde(default)]
    latest: Option<String>,
    #[serde(default)]
    release_date: Option<NaiveDate>,
    #[serde(default)]
    latest_release_date: Option<NaiveDate>,
    /// `true`, `false` or the date the cycle becomes LTS, possibly in the future
    #[serde(default)]
    lts: serde_json::Value,
}

impl Cycle {
    fn is_lts(&self, today: NaiveDate) -> bool {
        match &self.lts {
            serde_json::Value::Bool(lts) => *lts,
            serde_json::Value::String(since) => NaiveDate::parse_from_str(since, "%Y-%m-%d")
                .is_ok_and(|since| since <= today),
            _ => false,
        }
    }

    fn label(&self) -> &str {
        self.latest.as_deref().unwrap_or(&self.cycle)
    }

    fn date(&self) -> Option<NaiveDate> {
        self.latest_release_date.or(self.release_date)
    }
}

/// Writes the newest cycle as `Current` and the newest LTS cycle as `Lts`
///
/// The product is the part after `endoflife:` in the locator, or the
/// lower-cased entity key.
pub struct EndOfLifeSource {
    base_url: String,
}

impl EndOfLifeSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }

    fn product(entry: &SyncConfig) -> String {
        match entry.source_locator.split_once(':') {
            Some((_, product)) if !product.trim().is_empty() => product.trim().to_lowercase(),
            _ => entry.entity_key.to_lowercase(),
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for EndOfLifeSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Custom
    }

    async fn sync(&self, entry: &SyncConfig, ctx: &SyncContext) -> Result<(), SourceError> {
        let product = Self::product(entry);
        let url = format!("{}/api/{}.json", self.base_url, product);
        let cycles: Vec<Cycle> = ctx.http.get_json(&url, Auth::Anonymous).await?;
        debug!(%product, count = cycles.len(), "Fetched release cycles");

        let Some(newest) = cycles.first() else {
            warn!(%product, "Product has no release cycles");
            return Ok(());
        };

        ctx.set_normalized(
            &entry.entity_key,
            VersionKind::Current,
            newest.label(),
            newest.date().map(start_of_day),
        )?;

        if entry.wants_lts {
            let today = Utc::now().date_naive();
            match cycles.iter().find(|c| c.is_lts(today)) {
                Some(lts) => {
                    ctx.set_normalized(
                        &entry.entity_key,
                        VersionKind::Lts,
                        lts.label(),
                        lts.date().map(start_of_day),
                    )?;
                }
                None => warn!(%product, "Product has no LTS cycle"),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::adapters::tests::TestContext;
    use chrono::TimeZone;
    use mockito::Server;

    const UBUNTU: &str = r#"[
        {"cycle": "24.10", "releaseDate": "2024-10-10", "eol": "2025-07-10", "latest": "24.10", "lts": false},
        {"cycle": "24.04", "releaseDate": "2024-04-25", "eol": "2029-05-31", "latest": "24.04.1",
         "latestReleaseDate": "2024-08-29", "lts": true},
        {"cycle": "22.04", "releaseDate": "2022-04-21", "eol": "2027-06-01", "latest": "22.04.5", "lts": true}
    ]"#;

    #[tokio::test]
    async fn sync_writes_newest_cycle_and_newest_lts_cycle() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/ubuntu.json")
            .with_status(200)
            .with_body(UBUNTU)
            .create_async()
            .await;

        let ctx = TestContext::new(&["Ubuntu"]);
        let source = EndOfLifeSource::new(&server.url());
        let entry = SyncConfig::new("Ubuntu", SourceKind::Custom, "endoflife:ubuntu").with_lts();

        source.sync(&entry, &ctx.ctx).await.unwrap();

        mock.assert_async().await;
        let entity = ctx.entity("Ubuntu");
        let current = entity.version(VersionKind::Current).unwrap();
        assert_eq!(current.label, "24.10");
        assert_eq!(
            current.release_date,
            Some(Utc.with_ymd_and_hms(2024, 10, 10, 0, 0, 0).unwrap())
        );
        let lts = entity.version(VersionKind::Lts).unwrap();
        assert_eq!(lts.label, "24.04.1");
        assert_eq!(
            lts.release_date,
            Some(Utc.with_ymd_and_hms(2024, 8, 29, 0, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn sync_treats_lts_date_as_lts_flag() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/nodejs.json")
            .with_status(200)
            .with_body(
                r#"[
                    {"cycle": "23", "latest": "23.3.0", "lts": false},
                    {"cycle": "22", "latest": "22.12.0", "lts": "2024-10-29"}
                ]"#,
            )
            .create_async()
            .await;

        let ctx = TestContext::new(&["NodeEol"]);
        let source = EndOfLifeSource::new(&server.url());
        let entry = SyncConfig::new("NodeEol", SourceKind::Custom, "endoflife:nodejs").with_lts();

        source.sync(&entry, &ctx.ctx).await.unwrap();

        assert_eq!(
            ctx.entity("NodeEol").version(VersionKind::Lts).unwrap().label,
            "22.12.0"
        );
    }

    #[tokio::test]
    async fn sync_skips_cycle_whose_lts_date_is_in_the_future() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/nodejs.json")
            .with_status(200)
            .with_body(
                r#"[
                    {"cycle": "24", "latest": "24.1.0", "lts": "2099-10-28"},
                    {"cycle": "22", "latest": "22.12.0", "lts": "2024-10-29"}
                ]"#,
            )
            .create_async()
            .await;

        let ctx = TestContext::new(&["NodeEol"]);
        let source = EndOfLifeSource::new(&server.url());
        let entry = SyncConfig::new("NodeEol", SourceKind::Custom, "endoflife:nodejs").with_lts();

        source.sync(&entry, &ctx.ctx).await.unwrap();

        let entity = ctx.entity("NodeEol");
        assert_eq!(entity.version(VersionKind::Current).unwrap().label, "24.1.0");
        assert_eq!(entity.version(VersionKind::Lts).unwrap().label, "22.12.0");
    }

    #[test]
    fn is_lts_compares_lts_date_with_today() {
        let cycle: Cycle =
            serde_json::from_str(r#"{"cycle": "22", "lts": "2024-10-29"}"#).unwrap();
        let promoted = NaiveDate::from_ymd_opt(2024, 10, 29).unwrap();

        assert!(cycle.is_lts(promoted));
        assert!(!cycle.is_lts(promoted.pred_opt().unwrap()));
    }

    #[tokio::test]
    async fn sync_uses_entity_key_as_product_without_locator_product() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/postgresql.json")
            .with_status(200)
            .with_body(r#"[{"cycle": "17", "latest": "17.2"}]"#)
            .create_async()
            .await;

        let ctx = TestContext::new(&["PostgreSQL"]);
        let source = EndOfLifeSource::new(&server.url());
        let entry = SyncConfig::new("PostgreSQL", SourceKind::Custom, "endoflife");

        source.sync(&entry, &ctx.ctx).await.unwrap();

        mock.assert_async().await;
        let entity = ctx.entity("PostgreSQL");
        assert_eq!(entity.version(VersionKind::Current).unwrap().label, "17.2");
        assert!(entity.version(VersionKind::Lts).is_none());
    }

    #[tokio::test]
    async fn sync_writes_nothing_for_empty_feed() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/python.json")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let ctx = TestContext::new(&["Python"]);
        let source = EndOfLifeSource::new(&server.url());
        let entry = SyncConfig::new("Python", SourceKind::Custom, "endoflife:python");

        source.sync(&entry, &ctx.ctx).await.unwrap();

        assert!(ctx.entity("Python").versions.is_empty());
    }
}
