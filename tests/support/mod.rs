//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use catalog_sync::catalog::sqlite::SqliteCatalog;
use catalog_sync::catalog::store::CatalogStore;
use catalog_sync::catalog::types::CatalogEntity;
use catalog_sync::catalog::upserter::VersionUpserter;
use catalog_sync::config::Endpoints;
use catalog_sync::source::adapter::SyncContext;
use catalog_sync::source::adapters::AdapterRegistry;
use catalog_sync::source::http::HttpClient;
use catalog_sync::source::normalizer::LabelNormalizer;
use catalog_sync::source::retry::RetryPolicy;
use catalog_sync::sync::entry::SyncConfig;
use catalog_sync::sync::orchestrator::SyncOrchestrator;

/// Catalog database in a temp directory, pre-populated with `entities`
pub fn create_test_catalog(entities: &[&str]) -> (TempDir, Arc<SqliteCatalog>) {
    let temp_dir = TempDir::new().unwrap();
    let catalog = Arc::new(SqliteCatalog::open(&temp_dir.path().join("catalog.db")).unwrap());
    for name in entities {
        catalog.insert_entity(name).unwrap();
    }
    (temp_dir, catalog)
}

/// Retry policy with millisecond delays
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        ..RetryPolicy::default()
    }
}

pub fn create_test_context(catalog: Arc<SqliteCatalog>, dry_run: bool) -> SyncContext {
    let http = HttpClient::new(Some("ghp_test".to_string()))
        .unwrap()
        .with_retry_policy(fast_retry());
    SyncContext::new(
        Arc::new(http),
        Arc::new(VersionUpserter::new(catalog, dry_run)),
        Arc::new(LabelNormalizer::default()),
    )
}

/// Orchestrator whose adapters all talk to `base_url`
pub fn create_test_orchestrator(
    configs: Vec<SyncConfig>,
    catalog: Arc<SqliteCatalog>,
    base_url: &str,
    dry_run: bool,
) -> SyncOrchestrator {
    SyncOrchestrator::new(
        configs,
        AdapterRegistry::builtin(&Endpoints::all(base_url)),
        create_test_context(catalog, dry_run),
    )
    .unwrap()
}

pub fn entity(catalog: &SqliteCatalog, name: &str) -> CatalogEntity {
    catalog.find_one(name).unwrap().unwrap()
}
