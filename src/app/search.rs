//! Search entry point over the whole archive
//!
//! [`ModisClient`] owns the root collection listing and answers
//! [`SearchQuery`]s by walking the catalog: collections, then products, then
//! the matching days, then either every image of those days or one tile each.

use std::sync::Arc;

use crate::app::catalog::{ChildCache, Children, Collection, Product, ProductDay};
use crate::app::catalog::{CatalogNode, CatalogRecord, parse_listing};
use crate::app::client::{ClientConfig, LaadsClient, Payload};
use crate::app::dates::DateArg;
use crate::app::image::{ImageInfo, TilePosition};
use crate::app::url::url_json_file;
use crate::constants::env as env_constants;
use crate::errors::{CatalogError, CatalogResult, NodeKind, TransportResult};

/// Filters for [`ModisClient::search`]
///
/// Day filters are exclusive and applied in priority order: `date`, then
/// `year` (with optional `day_of_year`), then `start_date` + `end_date`.
/// With none of them every published day is visited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub collection: Option<String>,
    pub product: Option<String>,
    pub date: Option<DateArg>,
    pub year: Option<i32>,
    pub day_of_year: Option<u32>,
    pub start_date: Option<DateArg>,
    pub end_date: Option<DateArg>,
    pub position: Option<TilePosition>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    /// Restricts the search to one product
    ///
    /// The first candidate collection publishing it wins; if none does, the
    /// search fails with `CatalogError::NotFound` instead of widening to all
    /// products.
    pub fn product(mut self, name: impl Into<String>) -> Self {
        self.product = Some(name.into());
        self
    }

    pub fn date(mut self, date: impl Into<DateArg>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn day_of_year(mut self, day_of_year: u32) -> Self {
        self.day_of_year = Some(day_of_year);
        self
    }

    pub fn date_range(mut self, start: impl Into<DateArg>, end: impl Into<DateArg>) -> Self {
        self.start_date = Some(start.into());
        self.end_date = Some(end.into());
        self
    }

    pub fn position(mut self, position: impl Into<TilePosition>) -> Self {
        self.position = Some(position.into());
        self
    }
}

/// Client for the whole MODIS archive
#[derive(Debug)]
pub struct ModisClient {
    client: LaadsClient,
    collections: ChildCache<Collection>,
}

impl ModisClient {
    /// Creates a client from configuration
    ///
    /// A missing token is not an error here (public listings still work),
    /// but it is reported as a warning.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the HTTP client cannot be built
    pub fn new(config: &ClientConfig) -> TransportResult<Self> {
        let client = LaadsClient::new(config)?;
        if client.api_token().is_none() {
            tracing::warn!("API token is missing; downloads from LAADS will be refused");
        }
        tracing::info!("Created MODIS client for {}", client.base_url());

        Ok(Self {
            client,
            collections: ChildCache::default(),
        })
    }

    /// Creates a client with default settings and a token from `MODIS_API_TOKEN`
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the HTTP client cannot be built
    pub fn from_env() -> TransportResult<Self> {
        let mut config = ClientConfig::default();
        config.api_token = std::env::var(env_constants::API_TOKEN)
            .ok()
            .filter(|t| !t.is_empty());
        Self::new(&config)
    }

    /// Transport shared with every collection this client builds
    pub fn transport(&self) -> &LaadsClient {
        &self.client
    }

    /// Fetches the root listing and replaces any memoized collections
    pub async fn get_collections(&self) -> CatalogResult<Vec<Arc<Collection>>> {
        let collections = self
            .collections
            .replace_with(|| self.load_collections())
            .await?;
        Ok(collections.to_vec())
    }

    /// Collections of the archive, loaded on first use
    pub async fn collections(&self) -> CatalogResult<Vec<Arc<Collection>>> {
        Ok(self.collection_map().await?.to_vec())
    }

    /// The collection called `name`
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the archive has no such collection
    pub async fn collection(&self, name: &str) -> CatalogResult<Arc<Collection>> {
        self.collection_map()
            .await?
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(NodeKind::Collection, name))
    }

    /// Products of the collection called `name`
    ///
    /// Served from that collection's own memo, so a later
    /// [`Collection::get_products`] refresh is visible here too.
    pub async fn get_products_from_collection(&self, name: &str) -> CatalogResult<Vec<Arc<Product>>> {
        self.collection(name).await?.products().await
    }

    /// Runs `query` and returns the matching images in visiting order
    ///
    /// Products or years without data for the requested day are skipped.
    /// Any other failure, including a missing tile on one matched day,
    /// aborts the whole search.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown collection or product
    /// or a missing tile, `CatalogError::InvalidPosition` for an off-grid
    /// position, `CatalogError::InvalidQuery` when only one range bound is
    /// given, and transport errors unchanged
    pub async fn search(&self, query: &SearchQuery) -> CatalogResult<Vec<Arc<ImageInfo>>> {
        if let Some(position) = &query.position {
            position.validate()?;
        }

        let collections = match &query.collection {
            Some(name) => vec![self.collection(name).await?],
            None => self.collections().await?,
        };

        let products = self.select_products(&collections, query.product.as_deref()).await?;

        let mut days = Vec::new();
        for product in &products {
            days.extend(select_days(product, query).await?);
        }

        let mut images = Vec::new();
        for day in &days {
            match query.position {
                Some(position) => images.push(day.get_image_tile(position).await?),
                None => images.extend(day.images().await?),
            }
        }

        tracing::info!(
            "Search matched {} images across {} days of {} products",
            images.len(),
            days.len(),
            products.len()
        );
        Ok(images)
    }

    async fn select_products(
        &self,
        collections: &[Arc<Collection>],
        product: Option<&str>,
    ) -> CatalogResult<Vec<Arc<Product>>> {
        match product.filter(|p| !p.is_empty()) {
            Some(name) => {
                for collection in collections {
                    if collection.has_product(name).await? {
                        return Ok(vec![collection.product(name).await?]);
                    }
                }
                Err(CatalogError::not_found(NodeKind::Product, name))
            }
            None => {
                let mut products = Vec::new();
                for collection in collections {
                    products.extend(collection.products().await?);
                }
                Ok(products)
            }
        }
    }

    async fn collection_map(&self) -> CatalogResult<Arc<Children<Collection>>> {
        self.collections.get_or_load(|| self.load_collections()).await
    }

    async fn load_collections(&self) -> CatalogResult<Children<Collection>> {
        let listing_url = url_json_file(self.client.base_url());
        let payload = match self.client.get(&listing_url, &[]).await? {
            Payload::Json(value) => value,
            Payload::Text(_) => {
                return Err(CatalogError::UnexpectedPayload {
                    url: listing_url,
                    reason: "response is not JSON".to_string(),
                })
            }
        };

        let records: Vec<CatalogRecord> = parse_listing(&listing_url, &payload)?;
        tracing::debug!("Archive lists {} collections", records.len());

        Ok(Children::from_named(records.into_iter().map(|record| {
            let name = record.name.clone();
            (name, Collection::new(record, self.client.clone()))
        })))
    }
}

/// Days of `product` selected by the query's day filters
async fn select_days(product: &Arc<Product>, query: &SearchQuery) -> CatalogResult<Vec<Arc<ProductDay>>> {
    if let Some(date) = &query.date {
        return Ok(product.get_date(date.clone()).await?.into_iter().collect());
    }

    if let Some(year) = query.year {
        if !product.has_year(year).await? {
            return Ok(Vec::new());
        }
        let year_node = product.year(year).await?;
        return match query.day_of_year {
            Some(day) => Ok(year_node.day_of_year(day).await?.into_iter().collect()),
            None => year_node.days().await,
        };
    }

    match (&query.start_date, &query.end_date) {
        (Some(start), Some(end)) => {
            return product
                .get_days_in_date_range(start.clone(), end.clone())
                .await;
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(CatalogError::InvalidQuery {
                reason: "start_date and end_date must be given together".to_string(),
            });
        }
        (None, None) => {}
    }

    let mut days = Vec::new();
    for year in product.years().await? {
        days.extend(year.days().await?);
    }
    tracing::debug!("Enumerated {} days of {}", days.len(), product.name());
    Ok(days)
}
