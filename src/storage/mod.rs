use crate::error::{BankchatError, Result};
use anyhow::Context;
use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub mod types;
pub use types as keys;

/// Persisted key-value store for client state
///
/// The chat client keeps its token, user record and the local mirror of
/// the session list here. Values are strings; structured values are JSON.
pub trait LocalStore: Send + Sync {
    /// Read a value, `None` if the key was never written or was removed
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Read and decode a JSON value
///
/// A value that no longer decodes is logged and treated as absent.
pub fn read_json<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::error!("Error decoding stored {}: {}", key, e);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

/// Encode and write a JSON value
pub fn write_json<T: Serialize + ?Sized>(store: &dyn LocalStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)
        .with_context(|| format!("Failed to serialize {}", key))?;
    store.set(key, &raw)
}

/// SQLite-backed store in the user's data directory
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    /// Create a new storage instance
    ///
    /// Initializes the database file in the user's data directory, or at
    /// `BANKCHAT_STORAGE_DB` when that variable is set.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("BANKCHAT_STORAGE_DB") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "bankchat", "bankchat")
            .ok_or_else(|| BankchatError::Storage("Could not determine data directory".into()))?;

        Self::new_with_path(proj_dirs.data_dir().join("client.db"))
    }

    /// Create a new storage instance that uses the specified database path.
    ///
    /// # Examples
    ///
    /// ```
    /// use bankchat::storage::{LocalStore, SqliteStorage};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = SqliteStorage::new_with_path(dir.path().join("client.db")).unwrap();
    /// storage.set("token", "abc").unwrap();
    /// assert_eq!(storage.get("token").unwrap().as_deref(), Some("abc"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| BankchatError::Storage(e.to_string()))?;
        }

        let storage = Self { db_path };
        storage.init()?;
        Ok(storage)
    }

    /// Open the configured path, or the default location when `None`
    pub fn open(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::new_with_path(p),
            None => Self::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| BankchatError::Storage(e.to_string()).into())
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| BankchatError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl LocalStore for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connect()?;
        let value = conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .context("Failed to query value")
            .map_err(|e| BankchatError::Storage(e.to_string()))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO local_storage (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )
        .context("Failed to write value")
        .map_err(|e| BankchatError::Storage(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM local_storage WHERE key = ?", params![key])
            .context("Failed to delete value")
            .map_err(|e| BankchatError::Storage(e.to_string()))?;
        Ok(())
    }
}

/// In-process store, used by tests and when no data directory is available
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| BankchatError::Storage("memory store poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| BankchatError::Storage("memory store poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| BankchatError::Storage("memory store poisoned".into()))?;
        values.remove(key);
        Ok(())
    }
}
