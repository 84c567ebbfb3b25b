//! Book catalog browsing.

use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::{Book, BookQuery, Category, Page};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct CatalogService {
    client: ApiClient,
}

impl CatalogService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// List books matching `query`. Paging is clamped to 1..=100 per page.
    #[instrument(skip(self))]
    pub async fn list_books(&self, query: BookQuery) -> Result<Page<Book>> {
        query
            .validate()
            .map_err(|message| ApiError::validation("price", message))?;
        let query = query.normalized();

        let page: Page<Book> = self.client.get_with_query("/books", &query).await?;
        debug!(count = page.items.len(), total = page.total, "Listed books");
        Ok(page)
    }

    #[instrument(skip(self))]
    pub async fn get_book(&self, id: &str) -> Result<Book> {
        let id = require_id(id)?;
        self.client.get(&format!("/books/{}", id)).await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.client.get("/categories").await
    }
}

pub(crate) fn require_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() || id.contains('/') {
        return Err(ApiError::validation("id", "must be a non-empty identifier"));
    }
    Ok(id)
}
