//! Persistence boundary for catalog entities

#[cfg(test)]
use mockall::automock;

use crate::catalog::error::CatalogError;
use crate::catalog::types::{CatalogEntity, VersionRecord};

/// Trait for reading entities and writing their version slots
///
/// Implementations must make `set_version` atomic per `(entity, kind)`: an
/// existing record of the same kind is updated in place, otherwise a new one
/// is added. Whole-array overwrites are never issued.
#[cfg_attr(test, automock)]
pub trait CatalogStore: Send + Sync + 'static {
    /// Finds an entity by exact name
    fn find_one(&self, name: &str) -> Result<Option<CatalogEntity>, CatalogError>;

    /// Sets the label and release date of one version slot.
    /// Returns false if the entity does not exist.
    fn set_version(&self, name: &str, record: &VersionRecord) -> Result<bool, CatalogError>;

    /// Creates an empty entity
    fn insert_entity(&self, name: &str) -> Result<(), CatalogError>;

    /// Lists all entity names
    fn list_entities(&self) -> Result<Vec<String>, CatalogError>;
}
