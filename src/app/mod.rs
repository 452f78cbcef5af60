//! Core application logic for MODIS Fetcher
//!
//! This module contains the HTTP transport, the lazily resolved archive
//! catalog, image descriptors and the search entry point.
//!
//! # Examples
//!
//! ```rust,no_run
//! use modis_fetcher::app::{ClientConfig, ModisClient, SearchQuery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ModisClient::new(&ClientConfig::default().with_token("my-token"))?;
//!
//! let query = SearchQuery::new()
//!     .collection("61")
//!     .product("MOD09GA")
//!     .date_range("2020-01-01", "2020-01-03")
//!     .position((10, 5));
//!
//! for image in client.search(&query).await? {
//!     println!("{} -> {}", image.name, image.url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod dates;
pub mod image;
pub mod search;
pub mod url;

// Re-export main public API
pub use catalog::{
    CatalogNode, CatalogRecord, Collection, DownloadTarget, Product, ProductDay, ProductYear,
};
pub use client::{ClientConfig, LaadsClient, Payload};
pub use dates::DateArg;
pub use image::{parse_image_name, ImageInfo, ImageName, TilePosition};
pub use search::{ModisClient, SearchQuery};
pub use url::{url_join, url_json_file};
