//! ============================================================================
//! Configuration - Environment-driven settings
//! ============================================================================
//! CATALOG_API_BASE   REST API base URL          (default https://dummyjson.com)
//! CATALOG_DB_PATH    local store file           (default ~/.catalog/catalog.redb)
//! CATALOG_AUTH_KEY   key of the auth flag       (default catalog_auth)
//! CATALOG_PAGE_SIZE  products per listing page  (default 12)
//! ============================================================================

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing::warn;

use crate::catalog::{DEFAULT_API_BASE, PAGE_SIZE};

pub const DEFAULT_AUTH_KEY: &str = "catalog_auth";

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub api_base: String,
    /// None means "resolve the default under the home directory"
    pub db_path: Option<PathBuf>,
    pub auth_key: String,
    pub page_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            db_path: None,
            auth_key: DEFAULT_AUTH_KEY.to_string(),
            page_size: PAGE_SIZE,
        }
    }
}

impl CatalogConfig {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let page_size = match get("CATALOG_PAGE_SIZE") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!("Ignoring CATALOG_PAGE_SIZE='{}', using {}", raw, PAGE_SIZE);
                    PAGE_SIZE
                }
            },
            None => defaults.page_size,
        };

        Self {
            api_base: get("CATALOG_API_BASE").unwrap_or(defaults.api_base),
            db_path: get("CATALOG_DB_PATH").map(PathBuf::from),
            auth_key: get("CATALOG_AUTH_KEY").unwrap_or(defaults.auth_key),
            page_size,
        }
    }

    /// Store path, defaulting to ~/.catalog/catalog.redb
    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
        Ok(home.join(".catalog").join("catalog.redb"))
    }
}
