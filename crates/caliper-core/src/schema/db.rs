use chrono::Utc;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{IndexEntry, SnippetMetadata};

use super::migrations::MIGRATIONS;

/// A database connection backing an on-disk vector index.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Open an existing database without writing to it.
    ///
    /// Migrations are not applied; a file whose schema is behind fails
    /// instead.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let db = Self { conn };

        let applied = db.applied_migrations()?;
        let pending: Vec<&str> = MIGRATIONS
            .iter()
            .filter(|m| !applied.contains(&m.version))
            .map(|m| m.name)
            .collect();
        if !pending.is_empty() {
            return Err(Error::InvalidData(format!(
                "index schema is out of date (missing: {})",
                pending.join(", ")
            )));
        }

        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let applied = self.applied_migrations()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }

    fn applied_migrations(&self) -> Result<Vec<u32>> {
        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(applied)
    }
}

// Index settings
impl Database {
    /// Read an index setting.
    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM index_meta WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Write an index setting, replacing any previous value.
    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO index_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }
}

// Entry CRUD
impl Database {
    /// Insert or replace a batch of entries in a single transaction.
    ///
    /// A replaced entry keeps its original insertion position.
    pub fn upsert_entries(&mut self, entries: &[IndexEntry]) -> Result<usize> {
        self.upsert_entries_with_meta(&[], entries)
    }

    /// Like [`Database::upsert_entries`], but also writes the `meta` settings
    /// in the same transaction. Either everything lands or nothing does.
    pub fn upsert_entries_with_meta(
        &mut self,
        meta: &[(&str, &str)],
        entries: &[IndexEntry],
    ) -> Result<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        for (key, value) in meta {
            tx.execute(
                "INSERT INTO index_meta (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                rusqlite::params![key, value],
            )?;
        }
        {
            let mut stmt = tx.prepare(
                "INSERT INTO entries (
                    id, text, category, tools_required, ppe_required, embedding, ingested_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    text = excluded.text,
                    category = excluded.category,
                    tools_required = excluded.tools_required,
                    ppe_required = excluded.ppe_required,
                    embedding = excluded.embedding,
                    ingested_at = excluded.ingested_at",
            )?;
            for entry in entries {
                stmt.execute(rusqlite::params![
                    entry.id,
                    entry.text,
                    entry.metadata.category,
                    entry.metadata.tools_required,
                    entry.metadata.ppe_required,
                    encode_vector(&entry.embedding),
                    now,
                ])?;
            }
        }
        tx.commit()?;
        Ok(entries.len())
    }

    /// List all entries in insertion order.
    pub fn list_entries(&self) -> Result<Vec<IndexEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, text, category, tools_required, ppe_required, embedding
             FROM entries
             ORDER BY seq",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    SnippetMetadata {
                        category: row.get(2)?,
                        tools_required: row.get(3)?,
                        ppe_required: row.get(4)?,
                    },
                    row.get::<_, Vec<u8>>(5)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, text, metadata, blob)| {
                let embedding = decode_vector(&blob).map_err(|e| {
                    Error::InvalidData(format!("entry {id} has a corrupt embedding: {e}"))
                })?;
                Ok(IndexEntry {
                    id,
                    text,
                    metadata,
                    embedding,
                })
            })
            .collect()
    }

    /// Number of stored entries.
    pub fn count_entries(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| Error::InvalidData(format!("negative count {count}")))
    }
}

/// Serialize a vector as little-endian `f32` bytes.
#[must_use]
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Inverse of [`encode_vector`].
pub fn decode_vector(bytes: &[u8]) -> std::result::Result<Vec<f32>, String> {
    if bytes.len() % 4 != 0 {
        return Err(format!("blob length {} is not a multiple of 4", bytes.len()));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
