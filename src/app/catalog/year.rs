//! Year directories of a product (e.g. `MOD09GA/2020`)

use std::fmt::Display;
use std::sync::{Arc, Weak};

use crate::app::catalog::{CatalogNode, CatalogRecord, ChildCache, Children, NodeCore, Product, ProductDay};
use crate::app::client::LaadsClient;
use crate::app::url::{last_segment, url_join};
use crate::errors::{CatalogError, CatalogResult};

/// One year of a product, owning its day directories
#[derive(Debug)]
pub struct ProductYear {
    core: NodeCore,
    product: Weak<Product>,
    product_name: String,
    year: i32,
    days: ChildCache<ProductDay>,
}

impl ProductYear {
    /// Creates the year directory `record.name` below `product`
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` if the last URL segment is not a year
    pub fn new(
        mut record: CatalogRecord,
        product: &Arc<Product>,
        client: LaadsClient,
    ) -> CatalogResult<Self> {
        let product_name = product.name().to_string();
        record.insert("product_name", product_name.clone());
        let url = url_join(product.url(), &[record.name.as_str()]);

        let year = last_segment(&url)
            .and_then(|segment| segment.parse::<i32>().ok())
            .ok_or_else(|| CatalogError::parse(&url, "last path segment is not a year"))?;

        Ok(Self {
            core: NodeCore::new(record, url, client),
            product: Arc::downgrade(product),
            product_name,
            year,
            days: ChildCache::default(),
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn product(&self) -> Option<Arc<Product>> {
        self.product.upgrade()
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Fetches the day listing and replaces any memoized days
    pub async fn get_days(self: &Arc<Self>) -> CatalogResult<Vec<Arc<ProductDay>>> {
        let days = self.days.replace_with(|| self.load_days(true)).await?;
        Ok(days.to_vec())
    }

    /// Days of this year, loaded on first use
    pub async fn days(self: &Arc<Self>) -> CatalogResult<Vec<Arc<ProductDay>>> {
        Ok(self.day_map().await?.to_vec())
    }

    /// The day directory for `day_of_year` (`45`, `"45"` or `"045"`), or
    /// `None` if absent
    ///
    /// Day directories are zero-padded (`045`); an unpadded name is also
    /// accepted.
    pub async fn day_of_year(
        self: &Arc<Self>,
        day_of_year: impl Display,
    ) -> CatalogResult<Option<Arc<ProductDay>>> {
        let days = self.day_map().await?;
        Ok(lookup_key(&days, &day_of_year.to_string()).cloned())
    }

    pub async fn has_day_of_year(self: &Arc<Self>, day_of_year: impl Display) -> CatalogResult<bool> {
        let days = self.day_map().await?;
        Ok(lookup_key(&days, &day_of_year.to_string()).is_some())
    }

    /// Published days between `start` and `end` inclusive
    ///
    /// Days with no directory are left out.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidRange` if `start > end`
    pub async fn get_days_in_range(
        self: &Arc<Self>,
        start: u32,
        end: u32,
    ) -> CatalogResult<Vec<Arc<ProductDay>>> {
        if start > end {
            return Err(CatalogError::InvalidRange { start, end });
        }

        let days = self.day_map().await?;
        Ok((start..=end)
            .filter_map(|day| lookup_day(&days, day).cloned())
            .collect())
    }

    async fn day_map(self: &Arc<Self>) -> CatalogResult<Arc<Children<ProductDay>>> {
        self.days.get_or_load(|| self.load_days(false)).await
    }

    async fn load_days(self: &Arc<Self>, refresh: bool) -> CatalogResult<Children<ProductDay>> {
        let records = self.core.records(refresh).await?;
        let client = self.core.client();

        let days: Vec<_> = records
            .into_iter()
            .filter_map(|record| {
                let name = record.name.clone();
                match ProductDay::new(record, self, client.clone()) {
                    Ok(day) => Some((name, Arc::new(day))),
                    Err(e) => {
                        tracing::debug!("Skipping entry {} of {}: {}", name, self.url(), e);
                        None
                    }
                }
            })
            .collect();

        tracing::debug!("Year {} of {} lists {} days", self.year, self.product_name, days.len());
        Ok(Children::from_named(days))
    }
}

fn lookup_day(days: &Children<ProductDay>, day_of_year: u32) -> Option<&Arc<ProductDay>> {
    days.get(&format!("{day_of_year:03}"))
        .or_else(|| days.get(&day_of_year.to_string()))
}

/// Numeric keys go through the padded lookup, anything else is matched as is
fn lookup_key<'a>(days: &'a Children<ProductDay>, key: &str) -> Option<&'a Arc<ProductDay>> {
    match key.trim().parse::<u32>() {
        Ok(day_of_year) => lookup_day(days, day_of_year),
        Err(_) => days.get(key),
    }
}

impl CatalogNode for ProductYear {
    fn core(&self) -> &NodeCore {
        &self.core
    }
}
