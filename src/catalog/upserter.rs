//! Create-or-update of a single version slot on an existing entity

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::catalog::error::CatalogError;
use crate::catalog::store::CatalogStore;
use crate::catalog::types::{VersionKind, VersionRecord};

/// Outcome of a `set_version` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new slot was added
    Inserted,
    /// An existing slot of the same kind was overwritten
    Updated,
    /// The entity does not exist, nothing was written
    MissingEntity,
    /// Dry-run mode, the store was not touched
    DryRun,
}

/// Writes version slots through a [`CatalogStore`]
///
/// The sync engine never creates entities: a missing entity is logged and
/// skipped. Each call is independent, so an adapter that fails halfway leaves
/// the slots it already wrote in place.
pub struct VersionUpserter {
    store: Arc<dyn CatalogStore>,
    dry_run: bool,
}

impl VersionUpserter {
    pub fn new(store: Arc<dyn CatalogStore>, dry_run: bool) -> Self {
        Self { store, dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn set_version(
        &self,
        entity_name: &str,
        kind: VersionKind,
        label: &str,
        release_date: Option<DateTime<Utc>>,
    ) -> Result<UpsertOutcome, CatalogError> {
        if self.dry_run {
            info!(entity = entity_name, %kind, label, ?release_date, "[dry-run] would set version");
            return Ok(UpsertOutcome::DryRun);
        }

        let Some(entity) = self.store.find_one(entity_name)? else {
            warn!(entity = entity_name, %kind, label, "Entity not found in catalog, skipping");
            return Ok(UpsertOutcome::MissingEntity);
        };

        let existing = entity.version(kind);
        if let Some(existing) = existing
            && existing.label == label
            && existing.release_date == release_date
        {
            debug!(entity = entity_name, %kind, label, "Version unchanged");
        }

        let record = VersionRecord::new(kind, label, release_date);
        if !self.store.set_version(entity_name, &record)? {
            // Removed between the lookup and the write
            warn!(entity = entity_name, %kind, label, "Entity disappeared before write, skipping");
            return Ok(UpsertOutcome::MissingEntity);
        }

        let outcome = if existing.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        };
        info!(entity = entity_name, %kind, label, ?outcome, "Set version");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::sqlite::SqliteCatalog;
    use crate::catalog::store::MockCatalogStore;
    use crate::catalog::types::CatalogEntity;
    use tempfile::TempDir;

    fn create_upserter(entities: &[&str]) -> (TempDir, Arc<SqliteCatalog>, VersionUpserter) {
        let temp_dir = TempDir::new().unwrap();
        let catalog = Arc::new(SqliteCatalog::open(&temp_dir.path().join("test.db")).unwrap());
        for name in entities {
            catalog.insert_entity(name).unwrap();
        }
        let upserter = VersionUpserter::new(catalog.clone(), false);
        (temp_dir, catalog, upserter)
    }

    #[test]
    fn set_version_is_idempotent() {
        let (_temp_dir, catalog, upserter) = create_upserter(&["Rust"]);

        let first = upserter
            .set_version("Rust", VersionKind::Current, "1.83.0", None)
            .unwrap();
        let second = upserter
            .set_version("Rust", VersionKind::Current, "1.83.0", None)
            .unwrap();

        assert_eq!(first, UpsertOutcome::Inserted);
        assert_eq!(second, UpsertOutcome::Updated);
        let entity = catalog.find_one("Rust").unwrap().unwrap();
        assert_eq!(
            entity.versions,
            vec![VersionRecord::new(VersionKind::Current, "1.83.0", None)]
        );
    }

    #[test]
    fn set_version_keeps_at_most_one_record_per_kind() {
        let (_temp_dir, catalog, upserter) = create_upserter(&["Node.js"]);

        let calls = [
            (VersionKind::Current, "22.0.0"),
            (VersionKind::Lts, "20.12.0"),
            (VersionKind::Current, "23.0.0"),
            (VersionKind::Lts, "22.11.0"),
            (VersionKind::Current, "23.1.0"),
        ];
        for (kind, label) in calls {
            upserter.set_version("Node.js", kind, label, None).unwrap();
        }

        let entity = catalog.find_one("Node.js").unwrap().unwrap();
        let mut kinds: Vec<_> = entity.versions.iter().map(|v| v.kind.as_str()).collect();
        kinds.sort();
        assert_eq!(kinds, vec!["current", "lts"]);
        assert_eq!(entity.version(VersionKind::Current).unwrap().label, "23.1.0");
        assert_eq!(entity.version(VersionKind::Lts).unwrap().label, "22.11.0");
    }

    #[test]
    fn set_version_is_a_no_op_for_missing_entity() {
        let mut store = MockCatalogStore::new();
        store
            .expect_find_one()
            .withf(|name| name == "DoesNotExist")
            .times(1)
            .returning(|_| Ok(None));
        store.expect_set_version().times(0);

        let upserter = VersionUpserter::new(Arc::new(store), false);
        let outcome = upserter
            .set_version("DoesNotExist", VersionKind::Current, "1.0", None)
            .unwrap();

        assert_eq!(outcome, UpsertOutcome::MissingEntity);
    }

    #[test]
    fn set_version_in_dry_run_never_touches_the_store() {
        let mut store = MockCatalogStore::new();
        store.expect_find_one().times(0);
        store.expect_set_version().times(0);

        let upserter = VersionUpserter::new(Arc::new(store), true);
        for kind in [VersionKind::Current, VersionKind::Lts, VersionKind::Standard] {
            let outcome = upserter.set_version("Go", kind, "1.22.1", None).unwrap();
            assert_eq!(outcome, UpsertOutcome::DryRun);
        }
    }

    #[test]
    fn set_version_updates_existing_slot_through_the_store() {
        let mut store = MockCatalogStore::new();
        store.expect_find_one().returning(|name| {
            Ok(Some(CatalogEntity {
                name: name.to_string(),
                versions: vec![VersionRecord::new(VersionKind::Current, "1.21.0", None)],
            }))
        });
        store
            .expect_set_version()
            .withf(|name, record| {
                name == "Go" && record.kind == VersionKind::Current && record.label == "1.22.0"
            })
            .times(1)
            .returning(|_, _| Ok(true));

        let upserter = VersionUpserter::new(Arc::new(store), false);
        let outcome = upserter
            .set_version("Go", VersionKind::Current, "1.22.0", None)
            .unwrap();

        assert_eq!(outcome, UpsertOutcome::Updated);
    }
}
