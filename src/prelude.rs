//! Prelude module for MODIS Fetcher Library
//!
//! Re-exports the items needed for typical usage with a single
//! `use modis_fetcher::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use modis_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let client = ModisClient::new(&config.client_config())?;
//!
//!     let day = client
//!         .collection("61")
//!         .await?
//!         .product("MOD09GA")
//!         .await?
//!         .get_date("2020-02-14")
//!         .await?;
//!
//!     if let Some(day) = day {
//!         day.download_tile_by_position((10, 5), "downloads/").await?;
//!     }
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, CatalogError, Result};

pub use crate::app::{
    // Catalog levels
    CatalogNode,
    CatalogRecord,
    ClientConfig,
    Collection,
    DateArg,
    DownloadTarget,
    // Image descriptors
    ImageInfo,
    LaadsClient,
    // Search
    ModisClient,
    Product,
    ProductDay,
    ProductYear,
    SearchQuery,
    TilePosition,
};

pub use crate::config::{AppConfig, LoggingConfig};
