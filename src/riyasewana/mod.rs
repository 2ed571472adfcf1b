mod parser;

pub use parser::parse_listings;

use crate::{DigestError, ListingSource, RawListing};
use reqwest::{Client, Url};
use scraper::Html;
use tokio::{
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{debug, info};

pub const SEARCH_URL: &str = "https://riyasewana.com/search/cars/";

/// Search results for one query on riyasewana.com.
pub struct RiyasewanaSource {
    client: Client,
    search_url: Url,
    page_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RiyasewanaSource {
    pub fn new(query: &str, page_delay: Duration) -> Result<Self, DigestError> {
        Self::with_search_url(SEARCH_URL, query, page_delay)
    }

    pub fn with_search_url(
        search_url: &str,
        query: &str,
        page_delay: Duration,
    ) -> Result<Self, DigestError> {
        let mut url = Url::parse(search_url)
            .map_err(|e| DigestError::UrlError(format!("{}: {}", search_url, e)))?;
        // The query is one opaque path segment, percent-encoded by `push`.
        url.path_segments_mut()
            .map_err(|_| DigestError::UrlError(format!("{}: cannot be a base", search_url)))?
            .pop_if_empty()
            .push(query);
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36")
            .build()?;

        Ok(RiyasewanaSource {
            client,
            search_url: url,
            page_delay,
            last_request: Mutex::new(None),
        })
    }

    /// Page 1 is the bare search url, later pages add `?page=N`.
    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.search_url.clone();
        if page > 1 {
            url.query_pairs_mut().append_pair("page", &page.to_string());
        }
        url
    }
}

#[async_trait::async_trait]
impl ListingSource for RiyasewanaSource {
    async fn fetch_page(&self, page: u32) -> Result<Vec<RawListing>, DigestError> {
        let url = self.page_url(page);

        let html = {
            let mut last_request = self.last_request.lock().await;
            if let Some(last) = last_request.take() {
                let elapsed = last.elapsed();
                if elapsed < self.page_delay {
                    tokio::time::sleep(self.page_delay - elapsed).await;
                }
            }

            debug!("Visit {}", url);
            let response = self.client.get(url.clone()).send().await?;
            last_request.replace(Instant::now());

            let status = response.status();
            if !status.is_success() {
                return Err(DigestError::StatusError {
                    url: url.to_string(),
                    status,
                });
            }
            response.text().await?
        };

        let listings = {
            let doc = Html::parse_document(&html);
            parse_listings(&doc, &url)
        };
        info!("Page {} yielded {} listings", page, listings.len());
        Ok(listings)
    }
}
