//! Day directories of a product year (e.g. `MOD09GA/2020/045`)

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use chrono::NaiveDate;

use crate::app::catalog::{CatalogNode, CatalogRecord, ChildCache, Children, NodeCore, ProductYear};
use crate::app::client::LaadsClient;
use crate::app::dates::date_from_year_day;
use crate::app::image::{ImageInfo, TilePosition};
use crate::app::url::url_join;
use crate::errors::{CatalogError, CatalogResult, NodeKind};

/// What to download from a day directory
#[derive(Debug, Clone)]
pub enum DownloadTarget<'a> {
    /// An already resolved image
    Image(&'a ImageInfo),
    /// An absolute URL
    Url(String),
    /// The name of an image in this day
    Name(String),
}

impl<'a> From<&'a ImageInfo> for DownloadTarget<'a> {
    fn from(image: &'a ImageInfo) -> Self {
        DownloadTarget::Image(image)
    }
}

impl<'a> From<&'a Arc<ImageInfo>> for DownloadTarget<'a> {
    fn from(image: &'a Arc<ImageInfo>) -> Self {
        DownloadTarget::Image(image.as_ref())
    }
}

impl From<&str> for DownloadTarget<'_> {
    /// Strings containing `://` are URLs, anything else an image name
    fn from(value: &str) -> Self {
        if value.contains("://") {
            DownloadTarget::Url(value.to_string())
        } else {
            DownloadTarget::Name(value.to_string())
        }
    }
}

impl From<String> for DownloadTarget<'_> {
    fn from(value: String) -> Self {
        DownloadTarget::from(value.as_str())
    }
}

/// One day of a product year, owning its image descriptors
#[derive(Debug)]
pub struct ProductDay {
    core: NodeCore,
    product_year: Weak<ProductYear>,
    product_name: String,
    year: i32,
    day_of_year: u32,
    date: NaiveDate,
    images: ChildCache<ImageInfo>,
}

impl ProductDay {
    /// Creates the day directory `record.name` below `year`
    ///
    /// Year and day are read back from the two last URL segments.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` if those segments are not numeric or
    /// do not form a date
    pub fn new(
        mut record: CatalogRecord,
        year: &Arc<ProductYear>,
        client: LaadsClient,
    ) -> CatalogResult<Self> {
        let product_name = year.product_name().to_string();
        record.insert("product_name", product_name.clone());
        record.insert("product_year", year.name().to_string());
        let url = url_join(year.url(), &[record.name.as_str()]);

        let (year_value, day_of_year) = parse_year_and_day(&url)?;
        let date = date_from_year_day(year_value, day_of_year)
            .ok_or_else(|| CatalogError::parse(&url, "day of year out of range"))?;

        Ok(Self {
            core: NodeCore::new(record, url, client),
            product_year: Arc::downgrade(year),
            product_name,
            year: year_value,
            day_of_year,
            date,
            images: ChildCache::default(),
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn day_of_year(&self) -> u32 {
        self.day_of_year
    }

    /// Acquisition date of this day
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn product_year(&self) -> Option<Arc<ProductYear>> {
        self.product_year.upgrade()
    }

    /// Fetches the file listing and replaces any memoized images
    pub async fn get_images(&self) -> CatalogResult<Vec<Arc<ImageInfo>>> {
        let images = self.images.replace_with(|| self.load_images(true)).await?;
        Ok(images.to_vec())
    }

    /// Images of this day, loaded on first use
    pub async fn images(&self) -> CatalogResult<Vec<Arc<ImageInfo>>> {
        Ok(self.image_map().await?.to_vec())
    }

    /// The image file called `name`
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the day has no such file
    pub async fn image(&self, name: &str) -> CatalogResult<Arc<ImageInfo>> {
        self.image_map()
            .await?
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(NodeKind::Image, name))
    }

    /// The gridded image covering `position`
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidPosition` for positions off the grid and
    /// `CatalogError::NotFound` when no image of this day covers the tile
    pub async fn get_image_tile(
        &self,
        position: impl Into<TilePosition>,
    ) -> CatalogResult<Arc<ImageInfo>> {
        let position = position.into();
        position.validate()?;

        self.image_map()
            .await?
            .iter()
            .find(|image| image.is_gridded() && image.tile() == Some(position))
            .cloned()
            .ok_or_else(|| {
                CatalogError::not_found(NodeKind::Image, format!("{} tile {}", self.url(), position))
            })
    }

    /// Downloads the tile at `position`; see [`ProductDay::download`]
    pub async fn download_tile_by_position(
        &self,
        position: impl Into<TilePosition>,
        output: impl AsRef<Path>,
    ) -> CatalogResult<PathBuf> {
        let image = self.get_image_tile(position).await?;
        self.download(&image, output).await
    }

    /// Downloads an image, URL or named image of this day to `output`
    ///
    /// If `output` is a directory the file keeps its archive name. Returns the
    /// path that was written.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown image name, or a
    /// transport error if the transfer fails
    pub async fn download<'a>(
        &self,
        target: impl Into<DownloadTarget<'a>>,
        output: impl AsRef<Path>,
    ) -> CatalogResult<PathBuf> {
        let url = match target.into() {
            DownloadTarget::Image(image) => image.url.clone(),
            DownloadTarget::Url(url) => url,
            DownloadTarget::Name(name) => self.image(&name).await?.url.clone(),
        };

        Ok(self.core.client().download(&url, output.as_ref()).await?)
    }

    async fn image_map(&self) -> CatalogResult<Arc<Children<ImageInfo>>> {
        self.images.get_or_load(|| self.load_images(false)).await
    }

    async fn load_images(&self, refresh: bool) -> CatalogResult<Children<ImageInfo>> {
        let records = self.core.records(refresh).await?;

        let images = records
            .iter()
            .map(|record| {
                ImageInfo::from_listing(self.url(), record)
                    .map(|image| (record.name.clone(), Arc::new(image)))
            })
            .collect::<CatalogResult<Vec<_>>>()?;

        tracing::debug!("Day {} lists {} images", self.url(), images.len());
        Ok(Children::from_named(images))
    }
}

impl CatalogNode for ProductDay {
    fn core(&self) -> &NodeCore {
        &self.core
    }
}

fn parse_year_and_day(url: &str) -> CatalogResult<(i32, u32)> {
    let mut segments = url.trim_end_matches('/').rsplit('/');
    let day = segments.next().and_then(|s| s.parse::<u32>().ok());
    let year = segments.next().and_then(|s| s.parse::<i32>().ok());

    match (year, day) {
        (Some(year), Some(day)) => Ok((year, day)),
        _ => Err(CatalogError::parse(url, "expected .../YYYY/DDD")),
    }
}
