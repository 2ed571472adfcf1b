//! Bucket labels used as grouping keys.

use crate::{data::Listing, error::DigestError};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

pub const DEFAULT_OLDEST_YEAR: u16 = 2007;
pub const DEFAULT_NEWEST_YEAR: u16 = 2022;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Recency {
    UnderTwoDays,
    TwoToFourDays,
    OverFourDays,
}

impl Recency {
    /// Buckets a fractional day count. Lower bounds are inclusive.
    pub fn from_days(days: f64) -> Self {
        if days < 2.0 {
            Recency::UnderTwoDays
        } else if days < 4.0 {
            Recency::TwoToFourDays
        } else {
            Recency::OverFourDays
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recency::UnderTwoDays => "<2 days",
            Recency::TwoToFourDays => "2–4 days",
            Recency::OverFourDays => ">4 days",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModelYear {
    Year(u16),
    Uncategorized,
}

impl fmt::Display for Recency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ModelYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelYear::Year(year) => write!(f, "{}", year),
            ModelYear::Uncategorized => f.write_str("uncategorized"),
        }
    }
}

impl Serialize for Recency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Serialize for ModelYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Candidate model years, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearTable {
    years: Vec<(u16, String)>,
}

impl YearTable {
    pub fn new(oldest: u16, newest: u16) -> Result<Self, DigestError> {
        if oldest > newest || !(1000..=9999).contains(&oldest) || newest > 9999 {
            return Err(DigestError::YearRangeError { oldest, newest });
        }
        Ok(Self::from_range(oldest, newest))
    }

    fn from_range(oldest: u16, newest: u16) -> Self {
        let years = (oldest..=newest)
            .rev()
            .map(|year| (year, year.to_string()))
            .collect();
        YearTable { years }
    }

    pub fn years(&self) -> impl Iterator<Item = u16> + '_ {
        self.years.iter().map(|(year, _)| *year)
    }

    /// First candidate found anywhere in `title`, scanning newest to oldest.
    pub fn classify(&self, title: &str) -> ModelYear {
        self.years
            .iter()
            .find(|(_, token)| title.contains(token.as_str()))
            .map_or(ModelYear::Uncategorized, |(year, _)| ModelYear::Year(*year))
    }
}

impl Default for YearTable {
    fn default() -> Self {
        Self::from_range(DEFAULT_OLDEST_YEAR, DEFAULT_NEWEST_YEAR)
    }
}

pub fn recency_bucket(listing: &Listing, now: DateTime<Utc>) -> Recency {
    let elapsed = now.signed_duration_since(listing.ad_published);
    Recency::from_days(elapsed.num_milliseconds() as f64 / MILLIS_PER_DAY)
}

pub fn model_year_bucket(listing: &Listing, table: &YearTable) -> ModelYear {
    table.classify(&listing.r#type)
}
