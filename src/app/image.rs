//! Image descriptors for archive files
//!
//! MODIS file names encode most of their metadata:
//!
//! ```text
//! MOD09GA.A2020045.h10v05.061.2020050123456.hdf
//! ^product ^acquisition ^tile ^collection ^production time
//! ```
//!
//! The tile segment is only present for products on the sinusoidal grid.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::app::catalog::CatalogRecord;
use crate::app::dates::date_from_year_day;
use crate::app::url::url_join;
use crate::constants::grid;
use crate::errors::{CatalogError, CatalogResult};

/// Position of a tile on the MODIS sinusoidal grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePosition {
    pub horizontal: i32,
    pub vertical: i32,
}

impl TilePosition {
    pub fn new(horizontal: i32, vertical: i32) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Checks the position lies on the grid (h 0-35, v 0-17)
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidPosition` otherwise
    pub fn validate(&self) -> CatalogResult<()> {
        let horizontal_ok = (0..=grid::MAX_HORIZONTAL).contains(&self.horizontal);
        let vertical_ok = (0..=grid::MAX_VERTICAL).contains(&self.vertical);
        if horizontal_ok && vertical_ok {
            Ok(())
        } else {
            Err(CatalogError::InvalidPosition {
                horizontal: self.horizontal,
                vertical: self.vertical,
            })
        }
    }

    /// Parses an `hHHvVV` file name token
    pub fn from_token(token: &str) -> Option<Self> {
        let rest = token.strip_prefix('h')?;
        let (horizontal, vertical) = rest.split_once('v')?;
        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(horizontal) || !all_digits(vertical) {
            return None;
        }
        Some(Self::new(horizontal.parse().ok()?, vertical.parse().ok()?))
    }
}

impl From<(i32, i32)> for TilePosition {
    fn from((horizontal, vertical): (i32, i32)) -> Self {
        Self::new(horizontal, vertical)
    }
}

impl fmt::Display for TilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{:02}v{:02}", self.horizontal, self.vertical)
    }
}

/// Metadata carried by an archive file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageName {
    pub product: String,
    pub year_day_acquisition: String,
    pub year_acquisition: String,
    pub day_acquisition: String,
    pub datetime_acquisition: NaiveDate,
    pub collection_number: String,
    pub production_date_and_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_position: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_position: Option<i32>,
}

/// Parses `PRODUCT.AYYYYDDD.[hHHvVV.]COLLECTION.PRODUCTIONTIME[...]`
///
/// # Errors
///
/// Returns `CatalogError::Parse` when the name does not follow the convention
pub fn parse_image_name(name: &str) -> CatalogResult<ImageName> {
    let parts: Vec<&str> = name.split('.').collect();

    let product = match parts.first() {
        Some(p) if !p.is_empty() => (*p).to_string(),
        _ => return Err(CatalogError::parse(name, "missing product segment")),
    };

    let acquisition = parts
        .get(1)
        .copied()
        .ok_or_else(|| CatalogError::parse(name, "missing acquisition segment"))?;
    let digits = acquisition
        .strip_prefix('A')
        .filter(|d| d.len() > 4 && d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| {
            CatalogError::parse(name, format!("acquisition segment '{acquisition}' is not AYYYYDDD"))
        })?;
    let (year_acquisition, day_acquisition) = digits.split_at(4);

    let tile = parts.get(2).and_then(|token| TilePosition::from_token(token));
    let rest = if tile.is_some() { 3 } else { 2 };

    let collection_number = parts
        .get(rest)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CatalogError::parse(name, "missing collection segment"))?;
    let production = parts
        .get(rest + 1)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CatalogError::parse(name, "missing production time segment"))?;

    let year: i32 = year_acquisition
        .parse()
        .map_err(|_| CatalogError::parse(name, "acquisition year is not numeric"))?;
    let day: u32 = day_acquisition
        .parse()
        .map_err(|_| CatalogError::parse(name, "acquisition day is not numeric"))?;
    let datetime_acquisition = date_from_year_day(year, day)
        .ok_or_else(|| CatalogError::parse(name, "acquisition day out of range"))?;

    Ok(ImageName {
        product,
        year_day_acquisition: acquisition.to_string(),
        year_acquisition: year_acquisition.to_string(),
        day_acquisition: day_acquisition.to_string(),
        datetime_acquisition,
        collection_number: (*collection_number).to_string(),
        production_date_and_time: (*production).to_string(),
        tile_position: tile.map(|_| parts[2].to_string()),
        horizontal_position: tile.map(|t| t.horizontal),
        vertical_position: tile.map(|t| t.vertical),
    })
}

/// One image file of a product day
///
/// Combines the fields parsed from the file name with the raw listing record.
/// Raw fields win when both define the same key; unrecognized raw keys end
/// up in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub name: String,
    /// Absolute download URL
    pub url: String,
    pub product: String,
    pub year_day_acquisition: String,
    pub year_acquisition: String,
    pub day_acquisition: String,
    pub datetime_acquisition: NaiveDate,
    pub collection_number: String,
    pub production_date_and_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_position: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_position: Option<i32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageInfo {
    /// Builds the descriptor for a listing record of the day at `day_url`
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` for names outside the naming convention
    pub fn from_listing(day_url: &str, record: &CatalogRecord) -> CatalogResult<Self> {
        let parsed = parse_image_name(&record.name)?;

        let mut merged = match serde_json::to_value(&parsed) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let mut raw = record.to_map();
        raw.insert(
            "url".to_string(),
            Value::String(url_join(day_url, &[record.name.as_str()])),
        );
        merged.extend(raw);

        serde_json::from_value(Value::Object(merged))
            .map_err(|e| CatalogError::parse(&record.name, e.to_string()))
    }

    /// Grid position, for gridded products
    pub fn tile(&self) -> Option<TilePosition> {
        match (self.horizontal_position, self.vertical_position) {
            (Some(h), Some(v)) => Some(TilePosition::new(h, v)),
            _ => None,
        }
    }

    pub fn is_gridded(&self) -> bool {
        self.tile_position.is_some()
    }

    pub fn size(&self) -> Option<u64> {
        match self.extra.get("size")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.extra.get("last-modified").and_then(Value::as_str)
    }
}
