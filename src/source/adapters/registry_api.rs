//! Package registry adapter (npm, PyPI, crates.io)
//!
//! Locators look like `npm:@angular/core`, `pypi:django` or `crates:tokio`.
//! A locator without a registry prefix is an npm package.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::catalog::types::VersionKind;
use crate::config::Endpoints;
use crate::source::adapter::{SourceAdapter, SyncContext};
use crate::source::error::SourceError;
use crate::source::http::Auth;
use crate::sync::entry::{SourceKind, SyncConfig};

/// dist-tag keys tried, in order, when a package has no literal `lts` tag
const LTS_FALLBACK_KEYS: &[&str] = &["latest-lts", "long-term-support"];

/// Per-major LTS dist-tags (`v18-lts`) as published by Angular
static MAJOR_LTS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^v(\d+)-lts$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageRegistry {
    Npm,
    Pypi,
    Crates,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryLocator {
    pub registry: PackageRegistry,
    pub package: String,
}

impl RegistryLocator {
    pub fn parse(locator: &str) -> Result<Self, SourceError> {
        let (registry, package) = match locator.split_once(':') {
            Some(("npm", package)) => (PackageRegistry::Npm, package),
            Some(("pypi", package)) => (PackageRegistry::Pypi, package),
            Some(("crates", package)) => (PackageRegistry::Crates, package),
            Some((prefix, _)) => {
                return Err(SourceError::InvalidLocator(format!(
                    "unknown package registry {prefix:?} in {locator:?}"
                )));
            }
            None => (PackageRegistry::Npm, locator),
        };

        let package = package.trim();
        if package.is_empty() || package.contains(char::is_whitespace) {
            return Err(SourceError::InvalidLocator(format!(
                "missing or malformed package name in {locator:?}"
            )));
        }

        Ok(Self {
            registry,
            package: package.to_string(),
        })
    }
}

/// Latest/LTS tags read from a registry metadata document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryMetadata {
    pub latest: Option<String>,
    pub lts: Option<String>,
    pub release_dates: HashMap<String, DateTime<Utc>>,
}

impl RegistryMetadata {
    fn release_date(&self, version: &str) -> Option<DateTime<Utc>> {
        self.release_dates.get(version).copied()
    }
}

/// npm packument (only the fields we read)
#[derive(Debug, Deserialize)]
struct NpmPackument {
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    time: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct PypiResponse {
    info: PypiInfo,
    #[serde(default)]
    releases: HashMap<String, Vec<PypiFile>>,
}

#[derive(Debug, Deserialize)]
struct PypiInfo {
    version: String,
}

#[derive(Debug, Deserialize)]
struct PypiFile {
    upload_time_iso_8601: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct CratesResponse {
    #[serde(rename = "crate")]
    krate: CrateInfo,
    #[serde(default)]
    versions: Vec<CrateVersion>,
}

#[derive(Debug, Deserialize)]
struct CrateInfo {
    max_stable_version: Option<String>,
    max_version: String,
}

#[derive(Debug, Deserialize)]
struct CrateVersion {
    num: String,
    created_at: DateTime<Utc>,
}

/// Picks the LTS version from npm-style dist-tags
pub fn select_lts_tag(dist_tags: &HashMap<String, String>) -> Option<String> {
    if let Some(version) = dist_tags.get("lts") {
        return Some(version.clone());
    }

    if let Some(version) = LTS_FALLBACK_KEYS.iter().find_map(|key| dist_tags.get(*key)) {
        return Some(version.clone());
    }

    dist_tags
        .iter()
        .filter_map(|(tag, version)| {
            let major: u64 = MAJOR_LTS_RE.captures(tag)?.get(1)?.as_str().parse().ok()?;
            Some((major, version))
        })
        .max_by_key(|(major, _)| *major)
        .map(|(_, version)| version.clone())
}

/// Encode package name for URL (handles scoped packages)
fn encode_package_name(package_name: &str) -> String {
    if package_name.starts_with('@') {
        // Scoped package: @scope/name -> @scope%2Fname
        package_name.replace('/', "%2F")
    } else {
        package_name.to_string()
    }
}

pub struct RegistryApiAdapter {
    npm_url: String,
    pypi_url: String,
    crates_url: String,
}

impl RegistryApiAdapter {
    pub fn new(endpoints: &Endpoints) -> Self {
        Self {
            npm_url: endpoints.npm.clone(),
            pypi_url: endpoints.pypi.clone(),
            crates_url: endpoints.crates.clone(),
        }
    }

    async fn fetch_npm(
        &self,
        package: &str,
        ctx: &SyncContext,
    ) -> Result<RegistryMetadata, SourceError> {
        let url = format!("{}/{}", self.npm_url, encode_package_name(package));
        let packument: NpmPackument = ctx.http.get_json(&url, Auth::Anonymous).await?;

        let release_dates = packument
            .time
            .iter()
            .filter_map(|(version, time)| {
                let parsed = DateTime::parse_from_rfc3339(time).ok()?;
                Some((version.clone(), parsed.with_timezone(&Utc)))
            })
            .collect();

        Ok(RegistryMetadata {
            latest: packument.dist_tags.get("latest").cloned(),
            lts: select_lts_tag(&packument.dist_tags),
            release_dates,
        })
    }

    async fn fetch_pypi(
        &self,
        package: &str,
        ctx: &SyncContext,
    ) -> Result<RegistryMetadata, SourceError> {
        let url = format!("{}/pypi/{}/json", self.pypi_url, package);
        let response: PypiResponse = ctx.http.get_json(&url, Auth::Anonymous).await?;

        // A release's date is its earliest uploaded file
        let release_dates = response
            .releases
            .iter()
            .filter_map(|(version, files)| {
                let first = files.iter().filter_map(|f| f.upload_time_iso_8601).min()?;
                Some((version.clone(), first))
            })
            .collect();

        Ok(RegistryMetadata {
            latest: Some(response.info.version),
            lts: None,
            release_dates,
        })
    }

    async fn fetch_crates(
        &self,
        package: &str,
        ctx: &SyncContext,
    ) -> Result<RegistryMetadata, SourceError> {
        let url = format!("{}/api/v1/crates/{}", self.crates_url, package);
        let response: CratesResponse = ctx.http.get_json(&url, Auth::Anonymous).await?;

        let latest = response
            .krate
            .max_stable_version
            .unwrap_or(response.krate.max_version);

        Ok(RegistryMetadata {
            latest: Some(latest),
            lts: None,
            release_dates: response
                .versions
                .into_iter()
                .map(|v| (v.num, v.created_at))
                .collect(),
        })
    }
}

#[async_trait::async_trait]
impl SourceAdapter for RegistryApiAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::RegistryApi
    }

    async fn sync(&self, entry: &SyncConfig, ctx: &SyncContext) -> Result<(), SourceError> {
        let locator = RegistryLocator::parse(&entry.source_locator)?;
        let metadata = match locator.registry {
            PackageRegistry::Npm => self.fetch_npm(&locator.package, ctx).await?,
            PackageRegistry::Pypi => self.fetch_pypi(&locator.package, ctx).await?,
            PackageRegistry::Crates => self.fetch_crates(&locator.package, ctx).await?,
        };
        debug!(package = %locator.package, latest = ?metadata.latest, lts = ?metadata.lts, "Fetched registry metadata");

        match &metadata.latest {
            Some(latest) => {
                ctx.set_normalized(
                    &entry.entity_key,
                    VersionKind::Current,
                    latest,
                    metadata.release_date(latest),
                )?;
            }
            None => warn!(package = %locator.package, "Registry has no latest tag"),
        }

        if entry.wants_lts {
            match &metadata.lts {
                Some(lts) => {
                    ctx.set_normalized(
                        &entry.entity_key,
                        VersionKind::Lts,
                        lts,
                        metadata.release_date(lts),
                    )?;
                }
                None => warn!(package = %locator.package, "Registry publishes no LTS tag"),
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
    use rstest::rstest;

    #[rstest]
    #[case("npm:typescript", PackageRegistry::Npm, "typescript")]
    #[case("@angular/core", PackageRegistry::Npm, "@angular/core")]
    #[case("pypi:django", PackageRegistry::Pypi, "django")]
    #[case("crates:tokio", PackageRegistry::Crates, "tokio")]
    fn registry_locator_parses_prefix(
        #[case] locator: &str,
        #[case] registry: PackageRegistry,
        #[case] package: &str,
    ) {
        assert_eq!(
            RegistryLocator::parse(locator).unwrap(),
            RegistryLocator {
                registry,
                package: package.to_string()
            }
        );
    }

    #[rstest]
    #[case("maven:junit")]
    #[case("npm:")]
    #[case("")]
    #[case("npm:two words")]
    fn registry_locator_rejects_malformed(#[case] locator: &str) {
        assert!(matches!(
            RegistryLocator::parse(locator),
            Err(SourceError::InvalidLocator(_))
        ));
    }

    fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[rstest]
    #[case(&[("latest", "5.0.0"), ("lts", "4.2.0"), ("latest-lts", "4.1.0")], Some("4.2.0"))]
    #[case(&[("latest", "5.0.0"), ("latest-lts", "4.1.0")], Some("4.1.0"))]
    #[case(&[("latest", "19.0.0"), ("v17-lts", "17.3.12"), ("v18-lts", "18.2.13")], Some("18.2.13"))]
    #[case(&[("latest", "5.0.0"), ("next", "6.0.0-rc.1")], None)]
    fn select_lts_tag_uses_fallback_keys(
        #[case] dist_tags: &[(&str, &str)],
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(select_lts_tag(&tags(dist_tags)), expected.map(str::to_string));
    }

    #[test]
    fn encode_package_name_escapes_scoped_packages() {
        assert_eq!(encode_package_name("@types/node"), "@types%2Fnode");
        assert_eq!(encode_package_name("lodash"), "lodash");
    }

    #[tokio::test]
    async fn sync_writes_current_and_lts_from_npm_dist_tags() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/@angular%2Fcore")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "dist-tags": {"latest": "19.0.1", "v18-lts": "18.2.13", "next": "19.1.0-next.0"},
                    "time": {
                        "created": "2016-05-04T16:29:29.000Z",
                        "19.0.1": "2024-11-26T18:10:17.000Z"
                    }
                }"#,
            )
            .create_async()
            .await;

        let ctx = TestContext::new(&["Angular"]);
        let adapter = RegistryApiAdapter::new(&Endpoints::all(&server.url()));
        let entry =
            SyncConfig::new("Angular", SourceKind::RegistryApi, "npm:@angular/core").with_lts();

        adapter.sync(&entry, &ctx.ctx).await.unwrap();

        mock.assert_async().await;
        let entity = ctx.entity("Angular");
        let current = entity.version(VersionKind::Current).unwrap();
        assert_eq!(current.label, "19.0.1");
        assert_eq!(
            current.release_date,
            Some(Utc.with_ymd_and_hms(2024, 11, 26, 18, 10, 17).unwrap())
        );
        assert_eq!(entity.version(VersionKind::Lts).unwrap().label, "18.2.13");
    }

    #[tokio::test]
    async fn sync_skips_lts_when_not_requested() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/typescript")
            .with_status(200)
            .with_body(r#"{"dist-tags": {"latest": "5.7.2", "lts": "5.6.3"}}"#)
            .create_async()
            .await;

        let ctx = TestContext::new(&["TypeScript"]);
        let adapter = RegistryApiAdapter::new(&Endpoints::all(&server.url()));
        let entry = SyncConfig::new("TypeScript", SourceKind::RegistryApi, "npm:typescript");

        adapter.sync(&entry, &ctx.ctx).await.unwrap();

        let entity = ctx.entity("TypeScript");
        assert_eq!(entity.versions.len(), 1);
        assert_eq!(entity.version(VersionKind::Current).unwrap().label, "5.7.2");
    }

    #[tokio::test]
    async fn sync_reads_pypi_info_version_and_upload_time() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/pypi/django/json")
            .with_status(200)
            .with_body(
                r#"{
                    "info": {"version": "5.1.3"},
                    "releases": {
                        "5.1.3": [
                            {"upload_time_iso_8601": "2024-11-05T14:00:05.000000Z"},
                            {"upload_time_iso_8601": "2024-11-05T13:59:58.000000Z"}
                        ],
                        "5.1.2": []
                    }
                }"#,
            )
            .create_async()
            .await;

        let ctx = TestContext::new(&["Django"]);
        let adapter = RegistryApiAdapter::new(&Endpoints::all(&server.url()));
        let entry = SyncConfig::new("Django", SourceKind::RegistryApi, "pypi:django");

        adapter.sync(&entry, &ctx.ctx).await.unwrap();

        let current = ctx.entity("Django").version(VersionKind::Current).cloned().unwrap();
        assert_eq!(current.label, "5.1.3");
        assert_eq!(
            current.release_date,
            Some(Utc.with_ymd_and_hms(2024, 11, 5, 13, 59, 58).unwrap())
        );
    }

    #[tokio::test]
    async fn sync_reads_crates_max_stable_version() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/crates/tokio")
            .with_status(200)
            .with_body(
                r#"{
                    "crate": {"max_stable_version": "1.41.1", "max_version": "1.42.0-alpha.1"},
                    "versions": [{"num": "1.41.1", "created_at": "2024-11-07T12:00:00+00:00"}]
                }"#,
            )
            .create_async()
            .await;

        let ctx = TestContext::new(&["Tokio"]);
        let adapter = RegistryApiAdapter::new(&Endpoints::all(&server.url()));
        let entry = SyncConfig::new("Tokio", SourceKind::RegistryApi, "crates:tokio");

        adapter.sync(&entry, &ctx.ctx).await.unwrap();

        let current = ctx.entity("Tokio").version(VersionKind::Current).cloned().unwrap();
        assert_eq!(current.label, "1.41.1");
        assert!(current.release_date.is_some());
    }

    #[tokio::test]
    async fn sync_propagates_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/left-pad-gone")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let ctx = TestContext::new(&["LeftPad"]);
        let adapter = RegistryApiAdapter::new(&Endpoints::all(&server.url()));
        let entry = SyncConfig::new("LeftPad", SourceKind::RegistryApi, "left-pad-gone");

        let result = adapter.sync(&entry, &ctx.ctx).await;

        assert!(matches!(result, Err(SourceError::NotFound(_))));
        assert!(ctx.entity("LeftPad").versions.is_empty());
    }
}
