//! ============================================================================
//! Catalog Source - Remote product listing
//! ============================================================================
//! `CatalogSource` is the seam between the loader and the network. The HTTP
//! implementation talks to a DummyJSON-style REST API:
//! - GET {base}/products?limit=L&skip=S -> { products, total, skip, limit }
//! - GET {base}/products/{id}           -> Product
//! ============================================================================

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::types::{CatalogError, CatalogPage, Product};

/// Default catalog API base URL
pub const DEFAULT_API_BASE: &str = "https://dummyjson.com";

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch up to `limit` products starting at `offset`
    async fn list_products(&self, limit: usize, offset: usize) -> Result<CatalogPage, CatalogError>;

    /// Fetch one product; `CatalogError::NotFound` when the id does not exist
    async fn get_product(&self, id: u64) -> Result<Product, CatalogError>;
}

/// `CatalogSource` over HTTP
pub struct HttpCatalogSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("catalog-browser/1.0")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn products_url(&self) -> String {
        format!("{}/products", self.base_url)
    }
}

impl Default for HttpCatalogSource {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn list_products(&self, limit: usize, offset: usize) -> Result<CatalogPage, CatalogError> {
        debug!("GET {} (limit={}, skip={})", self.products_url(), limit, offset);

        let response = self
            .client
            .get(self.products_url())
            .query(&[("limit", limit), ("skip", offset)])
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CatalogError::Network(format!(
                "listing returned {}",
                response.status()
            )));
        }

        response
            .json::<CatalogPage>()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))
    }

    async fn get_product(&self, id: u64) -> Result<Product, CatalogError> {
        let url = format!("{}/{}", self.products_url(), id);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound(id)),
            status if !status.is_success() => Err(CatalogError::Network(format!(
                "product {} returned {}",
                id, status
            ))),
            _ => response
                .json::<Product>()
                .await
                .map_err(|e| CatalogError::InvalidResponse(e.to_string())),
        }
    }
}
