// ============================================================================
// LocalStore - Embedded key-value storage (redb)
// ============================================================================
// Holds the authenticated flag and the listing's last query string, the two
// pieces of state a browser would keep in local storage and the URL bar.
// Product edits are never written here.
// Default path: ~/.catalog/catalog.redb (override via CATALOG_DB_PATH)
// ============================================================================

use anyhow::{anyhow, Result};
use redb::{Database, TableDefinition};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::filter::QueryParams;
use crate::view::QueryLocation;

type BytesTable = TableDefinition<'static, &'static str, &'static [u8]>;

// Table definitions
const FLAGS: BytesTable = TableDefinition::new("flags");
const LISTING: BytesTable = TableDefinition::new("listing");

const LISTING_QUERY_KEY: &str = "listing:query";

/// Local key-value store for session flags and the listing query
pub struct LocalStore {
    db: Database,
    path: PathBuf,
    auth_key: String,
}

impl LocalStore {
    /// Open (or create) the store at `path`. `auth_key` names the flag that
    /// records whether the UI is in authenticated mode.
    pub fn open(path: impl AsRef<Path>, auth_key: impl Into<String>) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow!("Failed to create {}: {}", parent.display(), e))?;
        }

        info!("Opening local store at: {}", db_path.display());

        let db = Database::create(&db_path)
            .map_err(|e| anyhow!("Failed to open local store: {}", e))?;

        // Ensure tables exist by doing a write transaction
        let write_txn = db
            .begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let _ = write_txn.open_table(FLAGS).map_err(|e| anyhow!("Failed to create flags table: {}", e))?;
            let _ = write_txn.open_table(LISTING).map_err(|e| anyhow!("Failed to create listing table: {}", e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit init: {}", e))?;

        Ok(Self {
            db,
            path: db_path,
            auth_key: auth_key.into(),
        })
    }

    /// Get the store file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn auth_key(&self) -> &str {
        &self.auth_key
    }

    // ========================================================================
    // Auth Flag
    // ========================================================================

    pub fn is_authenticated(&self) -> Result<bool> {
        let flag: Option<bool> = self.get(FLAGS, &self.auth_key)?;
        Ok(flag.unwrap_or(false))
    }

    pub fn login(&self) -> Result<()> {
        self.put(FLAGS, &self.auth_key, &true)?;
        info!("Switched to authenticated mode");
        Ok(())
    }

    /// Returns whether the flag was set
    pub fn logout(&self) -> Result<bool> {
        let removed = self.remove(FLAGS, &self.auth_key)?;
        info!("Switched to unauthenticated mode");
        Ok(removed)
    }

    // ========================================================================
    // Listing Query
    // ========================================================================

    pub fn load_query(&self) -> Result<QueryParams> {
        let query: Option<QueryParams> = self.get(LISTING, LISTING_QUERY_KEY)?;
        Ok(query.unwrap_or_default())
    }

    pub fn save_query(&self, query: &QueryParams) -> Result<()> {
        if query.is_empty() {
            self.remove(LISTING, LISTING_QUERY_KEY)?;
        } else {
            self.put(LISTING, LISTING_QUERY_KEY, query)?;
        }
        debug!("Stored listing query '{}'", query.to_query_string());
        Ok(())
    }

    // ========================================================================
    // Table Helpers
    // ========================================================================

    fn put<T: serde::Serialize>(
        &self,
        table_def: BytesTable,
        key: &str,
        value: &T,
    ) -> Result<()> {
        let bytes = bincode::serialize(value)
            .map_err(|e| anyhow!("Failed to serialize {}: {}", key, e))?;

        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let mut table = write_txn.open_table(table_def)
                .map_err(|e| anyhow!("Failed to open table: {}", e))?;
            table.insert(key, bytes.as_slice())
                .map_err(|e| anyhow!("Failed to insert {}: {}", key, e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit: {}", e))?;
        Ok(())
    }

    fn get<T: serde::de::DeserializeOwned>(
        &self,
        table_def: BytesTable,
        key: &str,
    ) -> Result<Option<T>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let table = read_txn.open_table(table_def)
            .map_err(|e| anyhow!("Failed to open table: {}", e))?;

        match table.get(key).map_err(|e| anyhow!("Failed to get {}: {}", key, e))? {
            Some(value) => {
                let decoded: T = bincode::deserialize(value.value())
                    .map_err(|e| anyhow!("Failed to deserialize {}: {}", key, e))?;
                Ok(Some(decoded))
            }
            None => Ok(None),
        }
    }

    fn remove(&self, table_def: BytesTable, key: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        let removed;
        {
            let mut table = write_txn.open_table(table_def)
                .map_err(|e| anyhow!("Failed to open table: {}", e))?;
            removed = table.remove(key)
                .map_err(|e| anyhow!("Failed to remove {}: {}", key, e))?
                .is_some();
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit delete: {}", e))?;
        Ok(removed)
    }
}

impl QueryLocation for LocalStore {
    fn read_query(&self) -> Result<QueryParams> {
        self.load_query()
    }

    fn write_query(&self, query: &QueryParams) -> Result<()> {
        self.save_query(query)
    }
}
