//! HTML parsing for listing and detail pages.
//!
//! `scraper` types are `!Send`; callers run these functions inside
//! `spawn_blocking` and only move owned results across.

use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{Html, Selector};

static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article.elementor-post").unwrap());
static POST_DATE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.elementor-post-date").unwrap());
static TITLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3.elementor-post__title a").unwrap());
static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static ATTACHMENT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".post-attachments a[href]").unwrap());

/// One post on a listing page, in listing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Date text as printed, trimmed.
    pub date: String,
    /// Absolute detail-page URL, if the post has a title link.
    pub url: Option<String>,
}

/// Title and attachment links of a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDetails {
    pub title: String,
    pub attachments: Vec<String>,
}

/// Resolve `href` against `base`. `None` when either does not parse.
fn absolutize(base: &str, href: &str) -> Option<String> {
    let url = Url::parse(base).and_then(|b| b.join(href));
    match url {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            tracing::debug!(href, error = %e, "dropping unparsable link");
            None
        }
    }
}

/// Posts of a listing page. Posts without a date element are dropped.
pub fn parse_listing(html: &str, page_url: &str) -> Vec<ListingEntry> {
    let document = Html::parse_document(html);

    document
        .select(&ARTICLE)
        .filter_map(|article| {
            let date = article.select(&POST_DATE).next()?;
            let date = date.text().collect::<String>().trim().to_string();
            let url = article
                .select(&TITLE_LINK)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| absolutize(page_url, href));
            Some(ListingEntry { date, url })
        })
        .collect()
}

/// Title from the first `h1` (`Untitled` if there is none) and attachment
/// links in page order.
pub fn parse_article(html: &str, article_url: &str) -> ArticleDetails {
    let document = Html::parse_document(html);

    let title = document
        .select(&HEADING)
        .next()
        .map(|h| h.text().collect::<String>().trim().to_string())
        .unwrap_or_else(|| "Untitled".to_string());

    let attachments = document
        .select(&ATTACHMENT)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| absolutize(article_url, href))
        .collect();

    ArticleDetails { title, attachments }
}
