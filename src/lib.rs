use chrono::{DateTime, Local, Utc};
use itertools::Itertools;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub mod classify;
pub mod group;
pub mod riyasewana;
pub mod snapshot;

mod data;
mod error;

pub use classify::{ModelYear, Recency, YearTable};
pub use data::{keep, normalize, normalize_all, parse_price, parse_published, Listing, RawListing};
pub use error::{DigestError, NormalizeError};
pub use group::Grouping;
pub use snapshot::Snapshot;

pub const DEFAULT_PAGES: u32 = 10;

/// Where raw listings come from, one results page at a time.
#[async_trait::async_trait]
pub trait ListingSource {
    async fn fetch_page(&self, page: u32) -> Result<Vec<RawListing>, DigestError>;
}

#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub query: String,
    pub max_price: u64,
    pub pages: u32,
    pub years: YearTable,
    pub output_dir: PathBuf,
}

impl DigestConfig {
    pub fn new(query: impl Into<String>, max_price: u64) -> Self {
        DigestConfig {
            query: query.into(),
            max_price,
            pages: DEFAULT_PAGES,
            years: YearTable::default(),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Drains pages `1..=pages` in order, one request at a time.
pub async fn collect_listings<S>(source: &S, pages: u32) -> Result<Vec<RawListing>, DigestError>
where
    S: ListingSource + Sync,
{
    let mut listings = vec![];
    for page in 1..=pages {
        listings.extend(source.fetch_page(page).await?);
    }
    info!("Collected {} listings from {} pages", listings.len(), pages);
    Ok(listings)
}

/// Normalizes, filters by `max_price` and groups the listings of one run.
pub fn digest(
    raws: Vec<RawListing>,
    max_price: u64,
    now: DateTime<Utc>,
    years: &YearTable,
) -> Snapshot {
    let (listings, rejected) = normalize_all(raws);
    for e in &rejected {
        warn!("Skipping listing: {}", e);
    }

    let filtered = listings
        .into_iter()
        .filter(|l| keep(l, max_price))
        .collect_vec();
    debug!(
        "{} listings at or under {} ({} rejected)",
        filtered.len(),
        max_price,
        rejected.len()
    );

    Snapshot::build(&filtered, now, years)
}

/// Runs the whole pipeline and returns the path of the written snapshot.
///
/// Nothing is written if any page fails to load.
pub async fn run<S>(source: &S, config: &DigestConfig) -> Result<PathBuf, DigestError>
where
    S: ListingSource + Sync,
{
    let raws = collect_listings(source, config.pages).await?;

    let now = Utc::now();
    let snapshot = digest(raws, config.max_price, now, &config.years);
    info!(
        "Grouped {} listings",
        group::leaf_count(&snapshot.group_by_year)
    );

    let date = now.with_timezone(&Local).date_naive();
    snapshot.write(&config.output_dir, &config.query, date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct FakeSource {
        pages: BTreeMap<u32, Vec<RawListing>>,
        requested: Mutex<Vec<u32>>,
    }

    impl FakeSource {
        fn new(pages: Vec<(u32, Vec<RawListing>)>) -> Self {
            FakeSource {
                pages: pages.into_iter().collect(),
                requested: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait::async_trait]
    impl ListingSource for FakeSource {
        async fn fetch_page(&self, page: u32) -> Result<Vec<RawListing>, DigestError> {
            self.requested.lock().unwrap().push(page);
            match self.pages.get(&page) {
                Some(listings) => Ok(listings.clone()),
                None => Err(DigestError::UrlError(format!("no page {}", page))),
            }
        }
    }

    fn raw(title: &str, price: &str, published: DateTime<Utc>) -> RawListing {
        RawListing {
            r#type: title.to_string(),
            location: "Negombo".to_string(),
            price: price.to_string(),
            distance: "40000 (km)".to_string(),
            ad_published: published.to_rfc3339(),
            link: format!("https://riyasewana.com/buy/{}", title.replace(' ', "-")),
        }
    }

    #[test]
    fn test_digest_two_records() {
        let now = Utc::now();
        let first = raw("Car 2020", "Rs. 500,000", now - Duration::days(1));
        let second = raw("Car 2021", "Rs. 900,000", now - Duration::days(5));

        let snapshot = digest(vec![first.clone(), second], 600_000, now, &YearTable::default());

        let expected = normalize(first).unwrap();
        let mut inner = BTreeMap::new();
        inner.insert(Recency::UnderTwoDays, vec![expected.clone()]);
        let mut by_year = BTreeMap::new();
        by_year.insert(ModelYear::Year(2020), inner);

        let mut inner = BTreeMap::new();
        inner.insert(ModelYear::Year(2020), vec![expected]);
        let mut by_date = BTreeMap::new();
        by_date.insert(Recency::UnderTwoDays, inner);

        assert_eq!(snapshot.group_by_year, by_year);
        assert_eq!(snapshot.group_by_published_date, by_date);
        assert_eq!(snapshot.timestamp, now);
    }

    #[test]
    fn test_digest_skips_malformed() {
        let now = Utc::now();
        let listings = vec![
            raw("Car 2019", "Negotiable", now),
            raw("Car 2018", "Rs. 100", now),
            RawListing {
                ad_published: "sometime".to_string(),
                ..raw("Car 2017", "Rs. 100", now)
            },
        ];
        let snapshot = digest(listings, 1_000, now, &YearTable::default());
        assert_eq!(group::leaf_count(&snapshot.group_by_year), 1);
        assert!(snapshot.group_by_year.contains_key(&ModelYear::Year(2018)));
    }

    #[test]
    fn test_digest_ceiling_zero() {
        let now = Utc::now();
        let snapshot = digest(
            vec![raw("Car 2020", "Rs. 1", now)],
            0,
            now,
            &YearTable::default(),
        );
        assert!(snapshot.group_by_year.is_empty());
        assert!(snapshot.group_by_published_date.is_empty());
    }

    #[tokio::test]
    async fn test_collect_listings_in_page_order() {
        let now = Utc::now();
        let source = FakeSource::new(vec![
            (1, vec![raw("A 2010", "Rs. 1", now), raw("B 2011", "Rs. 2", now)]),
            (2, vec![]),
            (3, vec![raw("C 2012", "Rs. 3", now)]),
        ]);

        let listings = collect_listings(&source, 3).await.unwrap();
        assert_eq!(
            listings.iter().map(|l| l.r#type.as_str()).collect_vec(),
            vec!["A 2010", "B 2011", "C 2012"]
        );
        assert_eq!(*source.requested.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_run_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        let source = FakeSource::new(vec![
            (1, vec![raw("Toyota Aqua 2015", "Rs. 5,000,000", now - Duration::hours(3))]),
            (2, vec![raw("Toyota Premio 2019", "Rs. 9,000,000", now)]),
        ]);
        let config = DigestConfig {
            pages: 2,
            output_dir: dir.path().to_path_buf(),
            ..DigestConfig::new("toyota", 6_000_000)
        };

        let path = run(&source, &config).await.unwrap();

        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("toyota-"));
        assert!(name.ends_with(".json"));

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let leaf = &value["groupByYear"]["2015"]["<2 days"];
        assert_eq!(leaf.as_array().unwrap().len(), 1);
        assert_eq!(leaf[0]["priceLabel"], "Rs. 5,000,000");
        assert_eq!(value["groupByPublishedDate"]["<2 days"]["2015"], *leaf);
        assert!(value["groupByYear"].get("2019").is_none());
    }

    #[tokio::test]
    async fn test_run_aborts_on_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::new(vec![(1, vec![])]);
        let config = DigestConfig {
            pages: 2,
            output_dir: dir.path().to_path_buf(),
            ..DigestConfig::new("toyota", 1)
        };

        assert!(run(&source, &config).await.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
