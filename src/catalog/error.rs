use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Entity already exists: {0}")]
    AlreadyExists(String),

    #[error("Corrupt version record for {entity}: {reason}")]
    CorruptRecord { entity: String, reason: String },
}
