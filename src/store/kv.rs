//! The durable key-value contract and its implementations. The whole
//! collection lives under one key as one string blob, so the contract stays
//! deliberately small: get a blob, set a blob. `SqliteStore` backs the real
//! application with a single `kv` table; `MemoryStore` backs tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::{params, Connection, OptionalExtension};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".reading-log";
/// SQLite file name stored inside the application data directory.
pub const DB_FILE_NAME: &str = "books.sqlite";

/// Simple string-blob store keyed by fixed names. `&mut self` keeps the
/// contract honest about exclusive access: only one component (the bridge)
/// ever holds a store.
pub trait BlobStore {
    fn get(&mut self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Resolve the application data directory inside the user's home, creating
/// it if needed. Both the database and the log file live here.
pub fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    let dir = base_dirs.home_dir().join(DATA_DIR_NAME);
    fs::create_dir_all(&dir).context("failed to create data directory")?;
    Ok(dir)
}

/// SQLite-backed store: one `kv` table, one row per key.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file and run the lazy schema migration.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
        let conn = Connection::open(path).context("failed to open SQLite database")?;
        Self::with_connection(conn)
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("failed to open in-memory SQLite database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .context("failed to create kv table")?;
        Ok(Self { conn })
    }
}

impl BlobStore for SqliteStore {
    fn get(&mut self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .context("failed to read blob")
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .context("failed to write blob")?;
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a key, for tests that start from an existing blob.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }
}

impl BlobStore for MemoryStore {
    fn get(&mut self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
