//! Lazily resolved catalog of the archive directory tree
//!
//! The archive is a tree `Collection → Product → ProductYear → ProductDay →
//! image`, where every directory publishes a sibling `<dir>.json` listing its
//! entries. Each level here fetches its listing on first use and memoizes the
//! children it builds from it. The explicit `get_*` methods re-fetch and replace
//! the memoized children wholesale; the plain accessors load at most once.
//!
//! Parents own their children through `Arc`; children point back with `Weak`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::app::client::{LaadsClient, Payload};
use crate::app::url::url_json_file;
use crate::constants::laads;
use crate::errors::{CatalogError, CatalogResult};

pub mod collection;
pub mod day;
pub mod product;
pub mod year;

pub use collection::Collection;
pub use day::{DownloadTarget, ProductDay};
pub use product::Product;
pub use year::ProductYear;

/// One entry of a directory listing
///
/// `name` is the only field every level relies on; everything else the API
/// returns (`last-modified`, `size`, ...) is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: Map::new(),
        }
    }

    /// Raw field lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Adds or replaces a raw field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.insert(key.into(), value.into());
    }

    /// Last modification timestamp as published by the archive
    pub fn updated_at(&self) -> Option<&str> {
        self.extra.get("last-modified").and_then(Value::as_str)
    }

    /// Size in bytes, accepting numeric or string encodings
    pub fn size(&self) -> Option<u64> {
        match self.extra.get("size")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// All fields, `name` included, as one JSON object
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.extra.clone();
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map
    }
}

/// Extracts listing records from a `<dir>.json` payload
///
/// Accepts a bare array of records or an object wrapping one under `content`.
pub(crate) fn parse_listing(url: &str, payload: &Value) -> CatalogResult<Vec<CatalogRecord>> {
    let entries = match payload {
        Value::Array(entries) => entries,
        Value::Object(object) => match object.get(laads::LISTING_CONTENT_KEY) {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(CatalogError::UnexpectedPayload {
                    url: url.to_string(),
                    reason: format!("object without '{}' array", laads::LISTING_CONTENT_KEY),
                })
            }
        },
        other => {
            return Err(CatalogError::UnexpectedPayload {
                url: url.to_string(),
                reason: format!("expected array of records, got {}", json_kind(other)),
            })
        }
    };

    entries
        .iter()
        .map(|entry| {
            serde_json::from_value::<CatalogRecord>(entry.clone()).map_err(|e| {
                CatalogError::UnexpectedPayload {
                    url: url.to_string(),
                    reason: format!("bad record: {e}"),
                }
            })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Name-indexed children of one node, in listing order
#[derive(Debug)]
pub struct Children<T> {
    items: Vec<Arc<T>>,
    index: HashMap<String, usize>,
}

impl<T> Children<T> {
    /// Builds the map; a repeated name replaces the earlier entry in place
    pub fn from_named(entries: impl IntoIterator<Item = (String, Arc<T>)>) -> Self {
        let mut items: Vec<Arc<T>> = Vec::new();
        let mut index = HashMap::new();
        for (name, child) in entries {
            match index.get(&name) {
                Some(&slot) => items[slot] = child,
                None => {
                    index.insert(name, items.len());
                    items.push(child);
                }
            }
        }
        Self { items, index }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<T>> {
        self.index.get(name).map(|&slot| &self.items[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.items.iter()
    }

    pub fn to_vec(&self) -> Vec<Arc<T>> {
        self.items.clone()
    }
}

/// Memoized children with single-flight population
///
/// The lock is held across the loading fetch, so concurrent first accesses
/// wait for one load instead of issuing duplicate requests.
#[derive(Debug)]
pub struct ChildCache<T> {
    slot: Mutex<Option<Arc<Children<T>>>>,
}

impl<T> Default for ChildCache<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T> ChildCache<T> {
    /// Returns the memoized children, loading them on first use
    pub async fn get_or_load<F, Fut>(&self, load: F) -> CatalogResult<Arc<Children<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CatalogResult<Children<T>>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(children) = slot.as_ref() {
            return Ok(Arc::clone(children));
        }
        let children = Arc::new(load().await?);
        *slot = Some(Arc::clone(&children));
        Ok(children)
    }

    /// Loads fresh children and replaces whatever was memoized
    pub async fn replace_with<F, Fut>(&self, load: F) -> CatalogResult<Arc<Children<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CatalogResult<Children<T>>>,
    {
        let mut slot = self.slot.lock().await;
        let children = Arc::new(load().await?);
        *slot = Some(Arc::clone(&children));
        Ok(children)
    }

    /// Drops the memoized children so the next access reloads
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    pub async fn is_loaded(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}

/// State shared by every catalog level
#[derive(Debug)]
pub struct NodeCore {
    record: CatalogRecord,
    url: String,
    client: RwLock<LaadsClient>,
    listing: Mutex<Option<Arc<Value>>>,
}

impl NodeCore {
    pub(crate) fn new(record: CatalogRecord, url: String, client: LaadsClient) -> Self {
        Self {
            record,
            url,
            client: RwLock::new(client),
            listing: Mutex::new(None),
        }
    }

    pub fn record(&self) -> &CatalogRecord {
        &self.record
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Snapshot of this node's transport, token included
    pub fn client(&self) -> LaadsClient {
        self.client
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn api_token(&self) -> Option<String> {
        self.client().api_token().map(str::to_string)
    }

    /// Overrides the token of this node only; children built later inherit it
    pub fn set_api_token(&self, token: impl Into<String>) {
        self.client
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .set_api_token(token);
    }

    /// Raw listing payload, fetched once and then served from memory
    pub async fn fetch_available(&self) -> CatalogResult<Arc<Value>> {
        let mut listing = self.listing.lock().await;
        if let Some(payload) = listing.as_ref() {
            return Ok(Arc::clone(payload));
        }
        let payload = Arc::new(self.fetch_listing().await?);
        *listing = Some(Arc::clone(&payload));
        Ok(payload)
    }

    /// Re-fetches the raw listing payload, replacing the memoized one
    pub async fn refresh_available(&self) -> CatalogResult<Arc<Value>> {
        let mut listing = self.listing.lock().await;
        let payload = Arc::new(self.fetch_listing().await?);
        *listing = Some(Arc::clone(&payload));
        Ok(payload)
    }

    /// Listing records, fresh from the network when `refresh` is set
    pub(crate) async fn records(&self, refresh: bool) -> CatalogResult<Vec<CatalogRecord>> {
        let payload = if refresh {
            self.refresh_available().await?
        } else {
            self.fetch_available().await?
        };
        parse_listing(&self.url, &payload)
    }

    async fn fetch_listing(&self) -> CatalogResult<Value> {
        let listing_url = url_json_file(&self.url);
        tracing::debug!("Fetching listing {}", listing_url);

        match self.client().get(&listing_url, &[]).await? {
            Payload::Json(value) => Ok(value),
            Payload::Text(_) => Err(CatalogError::UnexpectedPayload {
                url: listing_url,
                reason: "response is not JSON".to_string(),
            }),
        }
    }
}

/// Contract shared by every level of the catalog tree
pub trait CatalogNode {
    fn core(&self) -> &NodeCore;

    fn name(&self) -> &str {
        self.core().name()
    }

    /// Absolute URL of this directory; fixed at construction
    fn url(&self) -> &str {
        self.core().url()
    }

    fn record(&self) -> &CatalogRecord {
        self.core().record()
    }

    fn updated_at(&self) -> Option<&str> {
        self.core().record().updated_at()
    }

    fn size(&self) -> Option<u64> {
        self.core().record().size()
    }

    fn set_api_token(&self, token: &str) {
        self.core().set_api_token(token);
    }

    fn api_token(&self) -> Option<String> {
        self.core().api_token()
    }

    /// Raw listing payload of this node, memoized after the first fetch
    fn fetch_available(&self) -> impl Future<Output = CatalogResult<Arc<Value>>> + Send
    where
        Self: Sync,
    {
        self.core().fetch_available()
    }
}
