use std::time::Duration;

use tender_core::{Config, TenderRecord};

use crate::ScrapeError;
use crate::listing::{parse_article, parse_listing};

/// Paginated list-and-detail crawl of the tender listing.
///
/// Listing pages are newest-first, so the first post dated anything other
/// than the target date ends the whole crawl.
pub struct Crawler {
    client: reqwest::Client,
    base_url: String,
    max_pages: u32,
    timeout: Duration,
}

impl Crawler {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            max_pages: config.max_pages,
            timeout: Duration::from_secs(config.download_timeout_secs),
        }
    }

    /// URL of listing page `page` (1-based).
    pub fn listing_url(&self, page: u32) -> String {
        format!("{}/{}/", self.base_url.trim_end_matches('/'), page)
    }

    /// Tender records posted on `target_date` (French long form).
    ///
    /// A listing page with a non-success status ends the crawl; a transport
    /// failure on a listing page is an error. A detail page that cannot be
    /// fetched skips its post.
    pub async fn crawl(&self, target_date: &str) -> Result<Vec<TenderRecord>, ScrapeError> {
        let mut records = Vec::new();

        for page in 1..=self.max_pages {
            let page_url = self.listing_url(page);
            tracing::info!(page, url = %page_url, "fetching listing page");

            let Some(html) = self.fetch_html(&page_url).await? else {
                break;
            };
            let entries = {
                let page_url = page_url.clone();
                tokio::task::spawn_blocking(move || parse_listing(&html, &page_url)).await?
            };

            let mut reached_older = false;
            for entry in entries {
                if entry.date != target_date {
                    tracing::info!(date = %entry.date, target = target_date, "post outside target date, stopping");
                    reached_older = true;
                    break;
                }
                let Some(url) = entry.url else {
                    continue;
                };
                match self.fetch_article(&url).await {
                    Ok(Some(record)) => records.push(record),
                    Ok(None) => {}
                    Err(e) => tracing::warn!(url = %url, error = %e, "skipping article"),
                }
            }
            if reached_older {
                break;
            }
        }

        tracing::info!(count = records.len(), "crawl complete");
        Ok(records)
    }

    async fn fetch_article(&self, url: &str) -> Result<Option<TenderRecord>, ScrapeError> {
        tracing::debug!(url, "visiting article");
        let Some(html) = self.fetch_html(url).await? else {
            return Ok(None);
        };
        let article_url = url.to_string();
        let details =
            tokio::task::spawn_blocking(move || parse_article(&html, &article_url)).await?;
        Ok(Some(TenderRecord::new(
            details.title,
            url,
            details.attachments,
        )))
    }

    /// Body of `url`, or `None` for a non-success status.
    async fn fetch_html(&self, url: &str) -> Result<Option<String>, ScrapeError> {
        let http_err = |source| ScrapeError::Http {
            url: url.to_string(),
            source,
        };
        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(http_err)?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(url, %status, "page not available");
            return Ok(None);
        }
        resp.text().await.map(Some).map_err(http_err)
    }
}
