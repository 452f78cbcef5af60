//! Top-level archive collections (e.g. `61` for Collection 6.1)

use std::sync::Arc;

use crate::app::catalog::{CatalogNode, CatalogRecord, ChildCache, Children, NodeCore, Product};
use crate::app::client::LaadsClient;
use crate::app::url::url_join;
use crate::errors::{CatalogError, CatalogResult, NodeKind};

/// An archive collection, owning its products
#[derive(Debug)]
pub struct Collection {
    core: NodeCore,
    products: ChildCache<Product>,
}

impl Collection {
    /// Creates a collection directly below the client's archive root
    ///
    /// The URL is always `base_url/name`; collections have no parent.
    pub fn new(record: CatalogRecord, client: LaadsClient) -> Arc<Self> {
        let url = url_join(client.base_url(), &[record.name.as_str()]);
        Arc::new(Self {
            core: NodeCore::new(record, url, client),
            products: ChildCache::default(),
        })
    }

    /// Creates a collection from its name alone
    pub fn named(name: impl Into<String>, client: LaadsClient) -> Arc<Self> {
        Self::new(CatalogRecord::new(name), client)
    }

    /// Fetches the product listing and replaces any memoized products
    pub async fn get_products(self: &Arc<Self>) -> CatalogResult<Vec<Arc<Product>>> {
        let products = self
            .products
            .replace_with(|| self.load_products(true))
            .await?;
        Ok(products.to_vec())
    }

    /// Products of this collection, loaded on first use
    pub async fn products(self: &Arc<Self>) -> CatalogResult<Vec<Arc<Product>>> {
        Ok(self.product_map().await?.to_vec())
    }

    /// The product called `name`
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the collection has no such product
    pub async fn product(self: &Arc<Self>, name: &str) -> CatalogResult<Arc<Product>> {
        self.product_map()
            .await?
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(NodeKind::Product, name))
    }

    /// Whether the collection publishes a product called `name`
    pub async fn has_product(self: &Arc<Self>, name: &str) -> CatalogResult<bool> {
        Ok(self.product_map().await?.contains(name))
    }

    async fn product_map(self: &Arc<Self>) -> CatalogResult<Arc<Children<Product>>> {
        self.products
            .get_or_load(|| self.load_products(false))
            .await
    }

    async fn load_products(self: &Arc<Self>, refresh: bool) -> CatalogResult<Children<Product>> {
        let records = self.core.records(refresh).await?;
        let client = self.core.client();
        tracing::debug!(
            "Collection {} lists {} products",
            self.name(),
            records.len()
        );

        Ok(Children::from_named(records.into_iter().map(|record| {
            let name = record.name.clone();
            (name, Arc::new(Product::new(record, self, client.clone())))
        })))
    }
}

impl CatalogNode for Collection {
    fn core(&self) -> &NodeCore {
        &self.core
    }
}
