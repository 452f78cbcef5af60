//! MODIS Fetcher Library
//!
//! A Rust library for navigating the NASA LAADS MODIS archive. The archive
//! tree (collections, products, years, days, image files) is resolved lazily
//! and memoized per node; searches filter it by product, date, date range or
//! year/day-of-year and can narrow each day to a single sinusoidal-grid tile.

pub mod app;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, CatalogError, Result};
