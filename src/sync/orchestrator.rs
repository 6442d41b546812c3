//! Runs every configured entity through its adapter
//!
//! The entry list is validated when the orchestrator is built, so a run never
//! starts with an entry that cannot be dispatched. Each entity is synced
//! inside a `sync` span carrying its key and source kind; adapter, retry and
//! upsert logs pick those fields up from the span.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{Instrument, debug, info, info_span};

use crate::catalog::store::CatalogStore;
use crate::catalog::upserter::VersionUpserter;
use crate::config::SyncSettings;
use crate::source::adapter::SyncContext;
use crate::source::adapters::AdapterRegistry;
use crate::source::error::SourceError;
use crate::source::http::HttpClient;
use crate::source::normalizer::LabelNormalizer;
use crate::sync::entry::SyncConfig;
use crate::sync::error::{ConfigError, SyncError};
use crate::sync::report::{FailedEntity, RunReport};
use crate::sync::scheduler::{BatchOptions, process_in_batches};
use crate::sync::validate::validate;

/// Wires the shared HTTP client, upserter and normalizer for one run
pub fn build_context(
    store: Arc<dyn CatalogStore>,
    settings: &SyncSettings,
) -> Result<SyncContext, SourceError> {
    let http = HttpClient::new(settings.github_token.clone())?;
    Ok(SyncContext::new(
        Arc::new(http),
        Arc::new(VersionUpserter::new(store, settings.dry_run)),
        Arc::new(LabelNormalizer::default()),
    ))
}

pub struct SyncOrchestrator {
    configs: Vec<SyncConfig>,
    registry: Arc<AdapterRegistry>,
    ctx: Arc<SyncContext>,
}

impl SyncOrchestrator {
    pub fn new(
        configs: Vec<SyncConfig>,
        registry: AdapterRegistry,
        ctx: SyncContext,
    ) -> Result<Self, ConfigError> {
        validate(&configs, &registry)?;
        Ok(Self {
            configs,
            registry: Arc::new(registry),
            ctx: Arc::new(ctx),
        })
    }

    /// Syncs every configured entity, `concurrency` at a time
    ///
    /// Per-entity failures are collected into the report; the run itself does
    /// not fail and is not retried.
    pub async fn sync_all(&self, concurrency: usize, timeout: Duration) -> RunReport {
        let started = Instant::now();
        info!(
            entities = self.configs.len(),
            concurrency,
            timeout_ms = timeout.as_millis() as u64,
            dry_run = self.ctx.upserter.is_dry_run(),
            "Starting sync run"
        );

        let registry = self.registry.clone();
        let ctx = self.ctx.clone();
        let outcome = process_in_batches(
            self.configs.clone(),
            move |entry: SyncConfig| {
                let registry = registry.clone();
                let ctx = ctx.clone();
                let span = info_span!(
                    "sync",
                    entity = %entry.entity_key,
                    kind = entry.source_kind.as_str()
                );
                async move {
                    sync_entry(&registry, &ctx, &entry).await?;
                    Ok::<_, SyncError>(entry.entity_key)
                }
                .instrument(span)
            },
            BatchOptions {
                concurrency,
                timeout,
            },
        )
        .await;

        let report = RunReport {
            succeeded: outcome.results,
            failed: outcome
                .errors
                .into_iter()
                .map(|failure| FailedEntity {
                    entity_key: failure.item.entity_key,
                    error_message: failure.error.to_string(),
                })
                .collect(),
            duration_ms: started.elapsed().as_millis() as u64,
            request_count: self.ctx.http.request_count(),
            cache_entry_count: self.ctx.http.cache().len(),
            dry_run: self.ctx.upserter.is_dry_run(),
        };
        report.log_summary();
        report
    }

    /// Syncs a single configured entity, matched case-insensitively
    ///
    /// Bounded by the same per-entity `timeout` as a full run.
    pub async fn sync_one(&self, entity_key: &str, timeout: Duration) -> Result<(), SyncError> {
        let entry = self
            .configs
            .iter()
            .find(|c| c.entity_key.eq_ignore_ascii_case(entity_key))
            .ok_or_else(|| SyncError::UnknownEntity(entity_key.to_string()))?;

        let span = info_span!(
            "sync",
            entity = %entry.entity_key,
            kind = entry.source_kind.as_str()
        );
        tokio::time::timeout(timeout, sync_entry(&self.registry, &self.ctx, entry))
            .instrument(span)
            .await
            .map_err(|_| SyncError::Timeout(timeout))?
    }
}

async fn sync_entry(
    registry: &AdapterRegistry,
    ctx: &SyncContext,
    entry: &SyncConfig,
) -> Result<(), SyncError> {
    let adapter = registry
        .adapter_for(entry)
        .ok_or_else(|| SyncError::NoAdapter {
            entity_key: entry.entity_key.clone(),
        })?;

    debug!(locator = %entry.source_locator, "Syncing entity");
    adapter.sync(entry, ctx).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::store::MockCatalogStore;
    use crate::catalog::types::CatalogEntity;
    use crate::source::adapter::MockSourceAdapter;
    use crate::source::adapters::CustomRegistry;
    use crate::source::http::tests::test_client;
    use crate::sync::entry::SourceKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn context(store: MockCatalogStore, dry_run: bool) -> SyncContext {
        SyncContext::new(
            Arc::new(test_client(None)),
            Arc::new(VersionUpserter::new(Arc::new(store), dry_run)),
            Arc::new(LabelNormalizer::default()),
        )
    }

    fn custom_adapter(
        f: impl Fn(&SyncConfig) -> Result<(), SourceError> + Send + Sync + 'static,
    ) -> Arc<MockSourceAdapter> {
        let mut adapter = MockSourceAdapter::new();
        adapter.expect_kind().return_const(SourceKind::Custom);
        adapter
            .expect_sync()
            .returning(move |entry, _| f(entry));
        Arc::new(adapter)
    }

    fn orchestrator(
        keys: &[&str],
        adapter: Arc<MockSourceAdapter>,
        store: MockCatalogStore,
    ) -> SyncOrchestrator {
        let mut custom = CustomRegistry::new();
        for key in keys {
            custom = custom.register(key, adapter.clone());
        }
        let configs = keys
            .iter()
            .map(|key| SyncConfig::new(key, SourceKind::Custom, "mock"))
            .collect();
        SyncOrchestrator::new(configs, AdapterRegistry::new(custom), context(store, false))
            .unwrap()
    }

    #[tokio::test]
    async fn sync_all_isolates_failing_entities() {
        let adapter = custom_adapter(|entry| match entry.entity_key.as_str() {
            "Broken" => Err(SourceError::Http {
                status: 500,
                url: "https://example.test".to_string(),
            }),
            _ => Ok(()),
        });
        let orchestrator = orchestrator(&["Alpha", "Broken", "Gamma"], adapter, MockCatalogStore::new());

        let report = orchestrator.sync_all(2, Duration::from_secs(5)).await;

        assert_eq!(report.succeeded, vec!["Alpha", "Gamma"]);
        assert_eq!(
            report.failed,
            vec![FailedEntity {
                entity_key: "Broken".to_string(),
                error_message: "HTTP 500 from https://example.test".to_string(),
            }]
        );
        assert_eq!(report.total(), 3);
    }

    #[tokio::test]
    async fn sync_one_runs_only_the_requested_entity() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let adapter = custom_adapter(move |entry| {
            assert_eq!(entry.entity_key, "Gamma");
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let orchestrator = orchestrator(&["Alpha", "Gamma"], adapter, MockCatalogStore::new());

        orchestrator
            .sync_one("gamma", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sync_one_reports_unknown_entity() {
        let adapter = custom_adapter(|_| Ok(()));
        let orchestrator = orchestrator(&["Alpha"], adapter, MockCatalogStore::new());

        let result = orchestrator.sync_one("Zeta", Duration::from_secs(5)).await;

        assert!(matches!(result, Err(SyncError::UnknownEntity(key)) if key == "Zeta"));
    }

    #[tokio::test]
    async fn sync_all_writes_through_upserter() {
        let mut store = MockCatalogStore::new();
        store.expect_find_one().returning(|name| {
            Ok(Some(CatalogEntity {
                name: name.to_string(),
                versions: vec![],
            }))
        });
        store.expect_set_version().times(1).returning(|_, _| Ok(true));

        let mut adapter = MockSourceAdapter::new();
        adapter.expect_kind().return_const(SourceKind::Custom);
        adapter.expect_sync().returning(|entry, ctx| {
            ctx.set_version(
                &entry.entity_key,
                crate::catalog::types::VersionKind::Current,
                "1.0.0",
                None,
            )?;
            Ok(())
        });

        let orchestrator = orchestrator(&["Alpha"], Arc::new(adapter), store);

        let report = orchestrator.sync_all(10, Duration::from_secs(5)).await;

        assert!(report.is_clean());
        assert!(!report.dry_run);
    }

    struct StalledAdapter;

    #[async_trait::async_trait]
    impl crate::source::adapter::SourceAdapter for StalledAdapter {
        fn kind(&self) -> SourceKind {
            SourceKind::Custom
        }

        async fn sync(&self, _entry: &SyncConfig, _ctx: &SyncContext) -> Result<(), SourceError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sync_one_times_out_like_a_full_run() {
        let custom = CustomRegistry::new().register("Slow", Arc::new(StalledAdapter));
        let configs = vec![SyncConfig::new("Slow", SourceKind::Custom, "mock")];
        let orchestrator = SyncOrchestrator::new(
            configs,
            AdapterRegistry::new(custom),
            context(MockCatalogStore::new(), false),
        )
        .unwrap();

        let result = orchestrator.sync_one("Slow", Duration::from_secs(1)).await;

        assert!(matches!(result, Err(SyncError::Timeout(t)) if t == Duration::from_secs(1)));
    }

    #[test]
    fn new_rejects_invalid_configs() {
        let configs = vec![SyncConfig::new("Rust", SourceKind::ReleaseApi, "rust-lang/rust")];
        let registry = AdapterRegistry::new(CustomRegistry::new());

        let result = SyncOrchestrator::new(configs, registry, context(MockCatalogStore::new(), false));

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
