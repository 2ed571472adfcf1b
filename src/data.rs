use crate::error::NormalizeError;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use itertools::Itertools;
use lazy_regex::regex;
use serde::{Deserialize, Serialize};

/// One listing exactly as it was read from a results page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListing {
    #[serde(rename = "type")]
    pub r#type: String,
    pub location: String,
    pub price: String,
    pub distance: String,
    pub ad_published: String,
    pub link: String,
}

/// A listing with a numeric price and a parsed publish time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(rename = "type")]
    pub r#type: String,
    pub location: String,
    pub distance: String,
    pub link: String,
    pub price: u64,
    pub price_label: String,
    pub ad_published: DateTime<Utc>,
}

/// Parses a display price such as `Rs. 1,234,567`.
///
/// The currency marker and thousands separators are dropped, and what is left must be a run of
/// ASCII digits. Already-bare numbers are accepted. Fractions and free text are not.
pub fn parse_price(label: &str) -> Option<u64> {
    let digits = regex!(r"Rs\. |,").replace_all(label, "");
    let digits = digits.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Date-only values are UTC midnight. Date-times without an offset are local wall-clock time;
/// an ambiguous local time resolves to the earlier instant, a skipped one is rejected.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    parse_published_in(raw, &Local)
}

fn parse_published_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(raw) {
        return Some(d.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(d) = NaiveDateTime::parse_from_str(raw, format) {
            return tz
                .from_local_datetime(&d)
                .earliest()
                .map(|d| d.with_timezone(&Utc));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| Utc.from_utc_datetime(&d))
}

pub fn normalize(raw: RawListing) -> Result<Listing, NormalizeError> {
    let price = parse_price(&raw.price).ok_or_else(|| NormalizeError::InvalidPrice {
        link: raw.link.clone(),
        label: raw.price.clone(),
    })?;
    let ad_published =
        parse_published(&raw.ad_published).ok_or_else(|| NormalizeError::InvalidDate {
            link: raw.link.clone(),
            raw: raw.ad_published.clone(),
        })?;

    Ok(Listing {
        r#type: raw.r#type,
        location: raw.location,
        distance: raw.distance,
        link: raw.link,
        price,
        price_label: raw.price,
        ad_published,
    })
}

/// Normalizes a batch, keeping input order among the accepted listings.
pub fn normalize_all<I>(raws: I) -> (Vec<Listing>, Vec<NormalizeError>)
where
    I: IntoIterator<Item = RawListing>,
{
    raws.into_iter().map(normalize).partition_result()
}

pub fn keep(listing: &Listing, ceiling: u64) -> bool {
    listing.price <= ceiling
}
