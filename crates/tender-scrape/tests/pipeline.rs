//! End-to-end crawl, filter, extraction and delivery against a local HTTP server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

use tender_core::{BackendError, Config, OcrEngine, PdfBackend, RenderedPage, TenderRecord};
use tender_ingest::DocumentExtractor;
use tender_scrape::{
    AttachmentProcessor, Crawler, DeliveryError, Downloader, Webhook, filter_tenders, http_client,
};

const PAGE_ONE: &str = r#"
<article class="elementor-post">
  <h3 class="elementor-post__title"><a href="/appel-1/">Etude</a></h3>
  <span class="elementor-post-date">17 octobre 2026</span>
</article>
<article class="elementor-post">
  <h3 class="elementor-post__title"><a href="/appel-2/">Travaux</a></h3>
  <span class="elementor-post-date">17 octobre 2026</span>
</article>
<article class="elementor-post">
  <h3 class="elementor-post__title"><a href="/appel-3/">Older</a></h3>
  <span class="elementor-post-date">16 octobre 2026</span>
</article>"#;

const PAGE_TWO: &str = r#"
<article class="elementor-post">
  <h3 class="elementor-post__title"><a href="/appel-9/">Never reached</a></h3>
  <span class="elementor-post-date">17 octobre 2026</span>
</article>"#;

const ARTICLE_ONE: &str = r#"
<h1>Etude de faisabilité</h1>
<div class="post-attachments">
  <a href="/files/notes.txt">Notes</a>
  <a href="/files/missing.pdf">CPS</a>
  <a href="/files/table.csv?v=2">Bordereau</a>
</div>"#;

const ARTICLE_TWO: &str = r#"
<h1>Travaux de construction d'une école</h1>
<div class="post-attachments"><a href="/files/notes.txt">Notes</a></div>"#;

type Seen = Arc<Mutex<Vec<Value>>>;

async fn hook(State(seen): State<Seen>, Json(body): Json<Value>) -> StatusCode {
    let rejected = body["Title"].as_str().is_some_and(|t| t.contains("Rejet"));
    seen.lock().unwrap().push(body);
    if rejected {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

/// Start the fixture site; returns its base URL and the webhook inbox.
async fn serve() -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/offres/1/", get(|| async { Html(PAGE_ONE) }))
        .route("/offres/2/", get(|| async { Html(PAGE_TWO) }))
        .route("/appel-1/", get(|| async { Html(ARTICLE_ONE) }))
        .route("/appel-2/", get(|| async { Html(ARTICLE_TWO) }))
        .route("/files/notes.txt", get(|| async { "Cahier   des charges\n\n\n\n" }))
        .route("/files/table.csv", get(|| async { "Name,Amount\nAcme,100\n" }))
        .route("/hook", post(hook))
        .with_state(Arc::clone(&seen));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

struct NoPdf;

impl PdfBackend for NoPdf {
    fn page_texts(&self, _data: &[u8]) -> Result<Vec<String>, BackendError> {
        Err(BackendError::OpenError("not in this test".into()))
    }

    fn render_pages(
        &self,
        _data: &[u8],
        _dpi: u32,
        _on_page: &mut dyn FnMut(usize, usize, Result<RenderedPage, BackendError>),
    ) -> Result<(), BackendError> {
        Err(BackendError::OpenError("not in this test".into()))
    }
}

struct NoOcr;

impl OcrEngine for NoOcr {
    fn name(&self) -> &str {
        "none"
    }

    fn recognize(&self, _page: &RenderedPage) -> Result<String, BackendError> {
        Ok(String::new())
    }
}

fn config_for(base: &str) -> Config {
    Config {
        base_url: format!("{base}/offres/"),
        max_pages: 3,
        download_timeout_secs: 5,
        ..Config::default()
    }
}

#[tokio::test]
async fn crawl_filter_extract_deliver() {
    let (base, seen) = serve().await;
    let config = config_for(&base);
    let client = http_client();

    let records = Crawler::new(client.clone(), &config)
        .crawl("17 octobre 2026")
        .await
        .unwrap();
    // Stops at the first older post; page two is never read.
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].url, format!("{base}/appel-1/"));

    let mut records = filter_tenders(records, &config.excluded_keywords);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Etude de faisabilité");
    assert_eq!(records[0].attachments.len(), 3);

    let processor = AttachmentProcessor::new(
        Downloader::new(client.clone(), Duration::from_secs(5)),
        Arc::new(DocumentExtractor::new(Arc::new(NoPdf), Arc::new(NoOcr))),
    );
    for record in &mut records {
        processor.process(record).await;
    }

    assert_eq!(
        records[0].extracted_text(),
        "--- From notes.txt ---\nCahier des charges\n\n--- From table.csv ---\nName Amount\nAcme 100"
    );
    let diags = records[0].diagnostics();
    assert_eq!(diags.len(), 1);
    assert!(diags[0].source.ends_with("/files/missing.pdf"));

    let webhook = Webhook::new(client, format!("{base}/hook"), Duration::from_secs(5));
    let report = webhook.send_all(&records, Duration::ZERO).await;
    assert_eq!(report.sent, 1);
    assert!(report.failed.is_empty());

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["Title"], "Etude de faisabilité");
    assert_eq!(seen[0]["URL"], format!("{base}/appel-1/"));
    assert_eq!(seen[0]["Attachments"].as_array().unwrap().len(), 3);
    assert!(
        seen[0]["Extracted_Text"]
            .as_str()
            .unwrap()
            .contains("Acme 100")
    );
    assert_eq!(seen[0]["Diagnostics"][0]["kind"], "download");
}

#[tokio::test]
async fn missing_listing_page_ends_crawl_cleanly() {
    let (base, _seen) = serve().await;
    let config = Config {
        base_url: format!("{base}/nowhere/"),
        ..config_for(&base)
    };
    let records = Crawler::new(http_client(), &config)
        .crawl("17 octobre 2026")
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn rejected_delivery_does_not_stop_batch() {
    let (base, seen) = serve().await;
    let records = vec![
        TenderRecord::new("Rejet attendu", format!("{base}/appel-1/"), vec![]),
        TenderRecord::new("Etude", format!("{base}/appel-2/"), vec![]),
    ];
    let webhook = Webhook::new(http_client(), format!("{base}/hook"), Duration::from_secs(5));
    let report = webhook
        .send_all(&records, Duration::from_millis(10))
        .await;

    assert_eq!(report.sent, 1);
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(
        &report.failed[0].1,
        DeliveryError::Status(s) if *s == StatusCode::INTERNAL_SERVER_ERROR
    ));
    assert_eq!(seen.lock().unwrap().len(), 2);
}
