//! Calendar helpers for year/day-of-year addressing
//!
//! The archive addresses days as `YYYY/DDD`; callers usually think in calendar
//! dates. These helpers convert between the two.

use chrono::{Datelike, Duration, NaiveDate};

use crate::errors::{CatalogError, CatalogResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A date argument given either as a calendar date or as `YYYY-MM-DD` text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateArg {
    Date(NaiveDate),
    Text(String),
}

impl DateArg {
    /// Resolves the argument to a calendar date
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidDate` if the text is not `YYYY-MM-DD`
    pub fn resolve(&self) -> CatalogResult<NaiveDate> {
        match self {
            DateArg::Date(date) => Ok(*date),
            DateArg::Text(text) => NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
                .map_err(|_| CatalogError::InvalidDate {
                    value: text.clone(),
                }),
        }
    }
}

impl From<NaiveDate> for DateArg {
    fn from(date: NaiveDate) -> Self {
        DateArg::Date(date)
    }
}

impl From<&str> for DateArg {
    fn from(text: &str) -> Self {
        DateArg::Text(text.to_string())
    }
}

impl From<String> for DateArg {
    fn from(text: String) -> Self {
        DateArg::Text(text)
    }
}

/// Date of `day_of_year` within `year`, counting Jan 1 as day 1
///
/// Days past the end of the year roll into the next one. Returns `None` for
/// day 0 or dates outside chrono's range.
pub fn date_from_year_day(year: i32, day_of_year: u32) -> Option<NaiveDate> {
    if day_of_year == 0 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, 1, 1)?
        .checked_add_signed(Duration::days(i64::from(day_of_year) - 1))
}

/// Year and ordinal day of a date
pub fn year_and_day_of(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.ordinal())
}

/// Every date from `start` to `end` inclusive; empty when `end < start`
pub fn dates_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let total_days = (end - start).num_days() + 1;
    (0..total_days.max(0)).filter_map(move |offset| start.checked_add_signed(Duration::days(offset)))
}
