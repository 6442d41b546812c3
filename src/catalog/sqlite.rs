use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::catalog::error::CatalogError;
use crate::catalog::store::CatalogStore;
use crate::catalog::types::{CatalogEntity, VersionKind, VersionRecord};

/// Schema migrations
/// Each version contains a list of SQL statements to execute
const MIGRATIONS: &[&[&str]] = &[
    // v1: support window columns
    &[
        "ALTER TABLE entity_versions ADD COLUMN end_of_support INTEGER",
        "ALTER TABLE entity_versions ADD COLUMN support_duration_months INTEGER",
    ],
    // v2: updated_at column
    &["ALTER TABLE entity_versions ADD COLUMN updated_at INTEGER NOT NULL DEFAULT 0"],
];

/// SQLite-backed catalog store
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    pub fn open(db_path: &Path) -> Result<Self, CatalogError> {
        info!("Opening catalog database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let catalog = Self {
            conn: Mutex::new(conn),
        };

        catalog.create_schema()?;
        debug!("Catalog database ready");

        Ok(catalog)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.conn.lock().map_err(|_| CatalogError::LockPoisoned)
    }

    fn current_timestamp_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    fn create_schema(&self) -> Result<(), CatalogError> {
        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        // One row per (entity, kind): the database enforces the slot invariant too
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS entity_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                label TEXT NOT NULL,
                release_date INTEGER,
                FOREIGN KEY (entity_id) REFERENCES entities(id) ON DELETE CASCADE,
                UNIQUE(entity_id, kind)
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_entity_versions_entity_id ON entity_versions(entity_id)",
            [],
        )?;

        Self::apply_migrations(&conn)?;

        Ok(())
    }

    /// Apply pending migrations based on user_version pragma
    fn apply_migrations(conn: &Connection) -> Result<(), CatalogError> {
        let current_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        for (i, statements) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                for sql in *statements {
                    match conn.execute(sql, []) {
                        Ok(_) => {}
                        Err(rusqlite::Error::SqliteFailure(_, Some(ref msg)))
                            if msg.contains("duplicate column name") =>
                        {
                            debug!("Column already exists, skipping: {}", sql);
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                debug!("Applied migration v{}", version);
            }
        }

        let target_version = MIGRATIONS.len() as i32;
        if target_version > current_version {
            conn.pragma_update(None, "user_version", target_version)?;
        }

        Ok(())
    }

    fn entity_id(conn: &Connection, name: &str) -> Result<Option<i64>, CatalogError> {
        match conn.query_row("SELECT id FROM entities WHERE name = ?1", [name], |row| {
            row.get(0)
        }) {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn timestamp_from_ms(
    entity: &str,
    column: &str,
    ms: Option<i64>,
) -> Result<Option<DateTime<Utc>>, CatalogError> {
    ms.map(|ms| {
        DateTime::from_timestamp_millis(ms).ok_or_else(|| CatalogError::CorruptRecord {
            entity: entity.to_string(),
            reason: format!("{column} out of range: {ms}"),
        })
    })
    .transpose()
}

type VersionRow = (String, String, Option<i64>, Option<i64>, Option<u32>);

impl CatalogStore for SqliteCatalog {
    fn find_one(&self, name: &str) -> Result<Option<CatalogEntity>, CatalogError> {
        let conn = self.lock_conn()?;

        let Some(entity_id) = Self::entity_id(&conn, name)? else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            r#"
            SELECT kind, label, release_date, end_of_support, support_duration_months
            FROM entity_versions
            WHERE entity_id = ?1
            ORDER BY id
            "#,
        )?;

        let rows = stmt
            .query_map([entity_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?
            .collect::<Result<Vec<VersionRow>, _>>()?;

        let versions = rows
            .into_iter()
            .map(|(kind, label, release_date, end_of_support, months)| {
                let kind = kind
                    .parse::<VersionKind>()
                    .map_err(|_| CatalogError::CorruptRecord {
                        entity: name.to_string(),
                        reason: format!("unknown version kind {kind:?}"),
                    })?;
                Ok(VersionRecord {
                    kind,
                    label,
                    release_date: timestamp_from_ms(name, "release_date", release_date)?,
                    end_of_support: timestamp_from_ms(name, "end_of_support", end_of_support)?,
                    support_duration_months: months,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        Ok(Some(CatalogEntity {
            name: name.to_string(),
            versions,
        }))
    }

    fn set_version(&self, name: &str, record: &VersionRecord) -> Result<bool, CatalogError> {
        let now = Self::current_timestamp_ms();

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let Some(entity_id) = Self::entity_id(&tx, name)? else {
            return Ok(false);
        };

        // Set the existing slot of this kind or add a new one. Support window
        // columns are left untouched on update.
        tx.execute(
            r#"
            INSERT INTO entity_versions (entity_id, kind, label, release_date, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(entity_id, kind) DO UPDATE SET
                label = excluded.label,
                release_date = excluded.release_date,
                updated_at = excluded.updated_at
            "#,
            (
                entity_id,
                record.kind.as_str(),
                &record.label,
                record.release_date.map(|d| d.timestamp_millis()),
                now,
            ),
        )?;

        tx.commit()?;
        Ok(true)
    }

    fn insert_entity(&self, name: &str) -> Result<(), CatalogError> {
        let conn = self.lock_conn()?;
        let inserted = conn.execute(
            "INSERT INTO entities (name, created_at) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
            (name, Self::current_timestamp_ms()),
        )?;

        if inserted == 0 {
            return Err(CatalogError::AlreadyExists(name.to_string()));
        }
        Ok(())
    }

    fn list_entities(&self) -> Result<Vec<String>, CatalogError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT name FROM entities ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }
}
