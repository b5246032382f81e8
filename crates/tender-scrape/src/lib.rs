use thiserror::Error;

pub mod crawl;
pub mod dates;
pub mod delivery;
pub mod download;
pub mod filter;
pub mod listing;
pub mod pipeline;

pub use crawl::Crawler;
pub use delivery::{DeliveryReport, Webhook};
pub use download::{Downloader, attachment_name};
pub use filter::{filter_tenders, is_excluded};
pub use pipeline::{AttachmentProcessor, combine_sections};

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTML parsing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("no webhook URL configured")]
    NoUrl,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webhook returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// Shared HTTP client for crawling, downloads and delivery.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("tender-scan/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(2)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
