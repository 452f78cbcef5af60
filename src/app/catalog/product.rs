//! Products within a collection (e.g. `MOD09GA`)

use std::fmt::Display;
use std::sync::{Arc, Weak};

use crate::app::catalog::{
    CatalogNode, CatalogRecord, ChildCache, Children, Collection, NodeCore, ProductDay,
    ProductYear,
};
use crate::app::client::LaadsClient;
use crate::app::dates::{dates_inclusive, year_and_day_of, DateArg};
use crate::app::url::url_join;
use crate::errors::{CatalogError, CatalogResult, NodeKind};

/// A product, owning its years of data
#[derive(Debug)]
pub struct Product {
    core: NodeCore,
    collection: Weak<Collection>,
    collection_name: String,
    years: ChildCache<ProductYear>,
}

impl Product {
    /// Creates a product below `collection`, tagging its record with the
    /// collection name
    pub fn new(mut record: CatalogRecord, collection: &Arc<Collection>, client: LaadsClient) -> Self {
        let collection_name = collection.name().to_string();
        record.insert("collection_name", collection_name.clone());
        let url = url_join(collection.url(), &[record.name.as_str()]);

        Self {
            core: NodeCore::new(record, url, client),
            collection: Arc::downgrade(collection),
            collection_name,
            years: ChildCache::default(),
        }
    }

    /// Owning collection, while it is still alive
    pub fn collection(&self) -> Option<Arc<Collection>> {
        self.collection.upgrade()
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Fetches the year listing and replaces any memoized years
    pub async fn get_years(self: &Arc<Self>) -> CatalogResult<Vec<Arc<ProductYear>>> {
        let years = self.years.replace_with(|| self.load_years(true)).await?;
        Ok(years.to_vec())
    }

    /// Years of this product, loaded on first use
    pub async fn years(self: &Arc<Self>) -> CatalogResult<Vec<Arc<ProductYear>>> {
        Ok(self.year_map().await?.to_vec())
    }

    /// The year directory for `year` (`2020` or `"2020"`)
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product has no data that year
    pub async fn year(self: &Arc<Self>, year: impl Display) -> CatalogResult<Arc<ProductYear>> {
        let key = year.to_string();
        self.year_map()
            .await?
            .get(&key)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(NodeKind::Year, key))
    }

    pub async fn has_year(self: &Arc<Self>, year: impl Display) -> CatalogResult<bool> {
        Ok(self.year_map().await?.contains(&year.to_string()))
    }

    /// Days between `start` and `end` inclusive, in chronological order
    ///
    /// Dates without published data are skipped, whether the whole year or
    /// only the day is missing. An `end` before `start` yields no days.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidDate` for malformed date text, or a
    /// transport error if a listing cannot be fetched
    pub async fn get_days_in_date_range(
        self: &Arc<Self>,
        start: impl Into<DateArg>,
        end: impl Into<DateArg>,
    ) -> CatalogResult<Vec<Arc<ProductDay>>> {
        let start = start.into().resolve()?;
        let end = end.into().resolve()?;

        let mut days = Vec::new();
        let mut current_year: Option<(i32, Option<Arc<ProductYear>>)> = None;

        for date in dates_inclusive(start, end) {
            let (year, day_of_year) = year_and_day_of(date);

            if !matches!(&current_year, Some((cached, _)) if *cached == year) {
                let node = self.year_map().await?.get(&year.to_string()).cloned();
                current_year = Some((year, node));
            }

            if let Some((_, Some(year_node))) = &current_year {
                if let Some(day) = year_node.day_of_year(day_of_year).await? {
                    days.push(day);
                }
            }
        }

        tracing::debug!(
            "Product {} has {} days between {} and {}",
            self.name(),
            days.len(),
            start,
            end
        );
        Ok(days)
    }

    /// The day directory for one calendar date, or `None` if nothing was
    /// published that day
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidDate` for malformed date text, or a
    /// transport error if a listing cannot be fetched
    pub async fn get_date(
        self: &Arc<Self>,
        date: impl Into<DateArg>,
    ) -> CatalogResult<Option<Arc<ProductDay>>> {
        let (year, day_of_year) = year_and_day_of(date.into().resolve()?);

        match self.year_map().await?.get(&year.to_string()) {
            Some(year_node) => year_node.day_of_year(day_of_year).await,
            None => Ok(None),
        }
    }

    async fn year_map(self: &Arc<Self>) -> CatalogResult<Arc<Children<ProductYear>>> {
        self.years.get_or_load(|| self.load_years(false)).await
    }

    /// Builds the years from the listing; entries that are not year
    /// directories are skipped
    async fn load_years(self: &Arc<Self>, refresh: bool) -> CatalogResult<Children<ProductYear>> {
        let records = self.core.records(refresh).await?;
        let client = self.core.client();

        let years: Vec<_> = records
            .into_iter()
            .filter_map(|record| {
                let name = record.name.clone();
                match ProductYear::new(record, self, client.clone()) {
                    Ok(year) => Some((name, Arc::new(year))),
                    Err(e) => {
                        tracing::debug!("Skipping entry {} of {}: {}", name, self.name(), e);
                        None
                    }
                }
            })
            .collect();

        Ok(Children::from_named(years))
    }
}

impl CatalogNode for Product {
    fn core(&self) -> &NodeCore {
        &self.core
    }
}
