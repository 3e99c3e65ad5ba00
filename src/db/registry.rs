//! Cache of open databases keyed by connection file and section.
//!
//! A pool is opened once per (file, section) and shared afterwards. Entries can also
//! be registered by hand for pools built elsewhere.

use crate::config::DatabaseConfig;
use crate::db::pool::Database;
use crate::error::{DbError, DbResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RegistryKey {
    file: PathBuf,
    section: String,
}

impl RegistryKey {
    fn new(file: &Path, section: &str) -> Self {
        Self {
            file: file.to_path_buf(),
            section: section.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Arc<RwLock<HashMap<RegistryKey, Database>>>,
}

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

/// The process-wide registry.
pub fn global() -> &'static Registry {
    &GLOBAL
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `database` under (file, section), replacing any previous entry.
    pub async fn register(&self, file: impl AsRef<Path>, section: &str, database: Database) {
        let key = RegistryKey::new(file.as_ref(), section);
        let previous = {
            let mut entries = self.entries.write().await;
            entries.insert(key, database)
        }; // Lock released here

        if let Some(previous) = previous {
            debug!(section, "Replaced registered database");
            previous.close().await;
        }
    }

    /// Cached database for (file, section), if any. Never opens a connection.
    pub async fn contains(&self, file: impl AsRef<Path>, section: &str) -> Option<Database> {
        let key = RegistryKey::new(file.as_ref(), section);
        self.entries.read().await.get(&key).cloned()
    }

    /// Cached database for (file, section), opening it from the file on a miss.
    pub async fn get(&self, file: impl AsRef<Path>, section: &str) -> DbResult<Database> {
        let file = file.as_ref();
        if let Some(db) = self.contains(file, section).await {
            return Ok(db);
        }

        info!(file = %file.display(), section, "Loading database from connection file");
        let config = DatabaseConfig::from_section(file, section)?.into_connection_config()?;
        let database = Database::connect(&config).await?;

        // Re-check after async work; a concurrent load may have won
        let key = RegistryKey::new(file, section);
        let (winner, loser) = {
            let mut entries = self.entries.write().await;
            match entries.get(&key) {
                Some(existing) => (existing.clone(), Some(database)),
                None => {
                    entries.insert(key, database.clone());
                    (database, None)
                }
            }
        }; // Lock released here

        if let Some(loser) = loser {
            debug!(section, "Discarding concurrently opened database");
            loser.close().await;
        }
        Ok(winner)
    }

    /// Like `get`, but fails instead of loading when the entry is missing.
    pub async fn require(&self, file: impl AsRef<Path>, section: &str) -> DbResult<Database> {
        let file = file.as_ref();
        self.contains(file, section).await.ok_or_else(|| {
            DbError::connection_not_found(format!("{}[{}]", file.display(), section))
        })
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Close every cached database and empty the registry.
    pub async fn close_all(&self) {
        let drained: Vec<(RegistryKey, Database)> = {
            let mut entries = self.entries.write().await;
            entries.drain().collect()
        };
        for (key, db) in drained {
            info!(section = %key.section, "Closing database");
            db.close().await;
        }
        info!("All databases closed");
    }
}
