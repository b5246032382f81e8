use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use tender_core::{
    CollectingSink, Config, DocumentBlob, EventSink, ExtractionEvent, Tee, TracingSink,
    config_file,
};
use tender_ingest::{DocumentExtractor, TesseractCli};
use tender_scrape::dates::{french_date, parse_iso, target_date, today};
use tender_scrape::{
    AttachmentProcessor, Crawler, Downloader, Webhook, filter_tenders, http_client,
};

mod output;

use output::ColorMode;

/// Tender scanner - crawl tender announcements, extract attachment text, deliver to a webhook
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Which posting date to collect.
#[derive(Args, Debug, Default)]
struct DateArgs {
    /// Exact posting date (YYYY-MM-DD); overrides --days-back
    #[arg(long)]
    date: Option<String>,

    /// Collect posts from this many days ago (default: 1, i.e. yesterday)
    #[arg(long)]
    days_back: Option<i64>,

    /// Number of listing pages to walk at most
    #[arg(long)]
    max_pages: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl, filter, extract attachment text and deliver to the webhook
    Run {
        #[command(flatten)]
        dates: DateArgs,

        /// Webhook receiving one JSON POST per tender
        #[arg(long)]
        webhook_url: Option<String>,

        /// Deliver tenders without downloading their attachments
        #[arg(long)]
        no_extract: bool,

        /// Print the records as JSON instead of delivering them
        #[arg(long)]
        dry_run: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Extract the text of a local document
    Extract {
        /// Path to a PDF, DOCX, XLSX, CSV, TXT or ZIP file
        file_path: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// List the tenders that would be processed, without downloading anything
    Crawl {
        #[command(flatten)]
        dates: DateArgs,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_file(&config_file::load_config());
    apply_env(&mut config, |key| std::env::var(key).ok());

    match cli.command {
        Command::Run {
            dates,
            webhook_url,
            no_extract,
            dry_run,
            no_color,
        } => {
            if webhook_url.is_some() {
                config.webhook_url = webhook_url;
            }
            run(config, dates, no_extract, dry_run, ColorMode(!no_color)).await
        }
        Command::Extract {
            file_path,
            no_color,
        } => extract(&config, &file_path, ColorMode(!no_color)),
        Command::Crawl { dates, no_color } => crawl(config, dates, ColorMode(!no_color)).await,
    }
}

/// Environment variables sit between the config file and command-line flags.
fn apply_env(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(url) = var("N8N_WEBHOOK_URL").filter(|v| !v.is_empty()) {
        config.webhook_url = Some(url);
    }
    if let Some(path) = var("TESSERACT_PATH").filter(|v| !v.is_empty()) {
        config.tesseract_path = PathBuf::from(path);
    }
}

/// Posting date selected by `--date`, else `--days-back`, else the config.
fn resolve_target(config: &mut Config, dates: &DateArgs) -> anyhow::Result<NaiveDate> {
    if let Some(pages) = dates.max_pages {
        config.max_pages = pages;
    }
    if let Some(days) = dates.days_back {
        config.days_back = days;
    }
    match &dates.date {
        Some(s) => parse_iso(s).map_err(|e| anyhow::anyhow!("Invalid --date {s:?}: {e}")),
        None => target_date(today(), config.days_back)
            .ok_or_else(|| anyhow::anyhow!("--days-back {} is out of range", config.days_back)),
    }
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

async fn crawl(mut config: Config, dates: DateArgs, color: ColorMode) -> anyhow::Result<()> {
    let target = french_date(resolve_target(&mut config, &dates)?);

    let bar = spinner(format!("Crawling listing for {target}..."));
    let records = Crawler::new(http_client(), &config).crawl(&target).await;
    bar.finish_and_clear();
    let records = records?;

    let found = records.len();
    let records = filter_tenders(records, &config.excluded_keywords);
    let mut stdout = std::io::stdout();
    output::print_tender_list(&mut stdout, &target, &records, found - records.len(), color)?;
    Ok(())
}

async fn run(
    mut config: Config,
    dates: DateArgs,
    no_extract: bool,
    dry_run: bool,
    color: ColorMode,
) -> anyhow::Result<()> {
    let target = french_date(resolve_target(&mut config, &dates)?);
    tracing::info!(?config, target = %target, "starting run");

    let webhook_url = match (&config.webhook_url, dry_run) {
        (Some(url), _) => Some(url.clone()),
        (None, true) => None,
        (None, false) => anyhow::bail!(
            "No webhook URL configured. Set N8N_WEBHOOK_URL, [delivery] webhook_url, or pass --webhook-url (or use --dry-run)"
        ),
    };

    let client = http_client();
    let mut stdout = std::io::stdout();

    let bar = spinner(format!("Crawling listing for {target}..."));
    let records = Crawler::new(client.clone(), &config).crawl(&target).await;
    bar.finish_and_clear();
    let records = records?;

    let found = records.len();
    let mut records = filter_tenders(records, &config.excluded_keywords);
    output::print_tender_list(&mut stdout, &target, &records, found - records.len(), color)?;

    if !no_extract && !records.is_empty() {
        if !TesseractCli::from_config(&config).is_available() {
            tracing::warn!(
                path = %config.tesseract_path.display(),
                "tesseract not found, scanned PDFs will yield no text"
            );
        }

        let bar = spinner("Extracting attachments...".to_string());
        let progress: Arc<dyn EventSink> = {
            let bar = bar.clone();
            Arc::new(move |event: ExtractionEvent| {
                match &event {
                    ExtractionEvent::Started { source, .. } => {
                        bar.set_message(format!("Extracting {source}..."));
                    }
                    ExtractionEvent::OcrPage {
                        source,
                        page,
                        total,
                    } => bar.set_message(format!("OCR {source} page {page}/{total}...")),
                    _ => {}
                }
                TracingSink.emit(event);
            })
        };
        let processor = AttachmentProcessor::new(
            Downloader::new(
                client.clone(),
                Duration::from_secs(config.download_timeout_secs),
            ),
            Arc::new(DocumentExtractor::from_config(&config)),
        )
        .with_sink(progress);

        let total = records.len();
        writeln!(stdout)?;
        for (i, record) in records.iter_mut().enumerate() {
            processor.process(record).await;
            bar.suspend(|| output::print_tender_extracted(&mut stdout, i, total, record, color))?;
        }
        bar.finish_and_clear();
    }

    let Some(webhook_url) = webhook_url.filter(|_| !dry_run) else {
        for record in &records {
            writeln!(stdout, "{}", serde_json::to_string_pretty(record)?)?;
        }
        return Ok(());
    };

    let webhook = Webhook::new(
        client,
        webhook_url,
        Duration::from_secs(config.delivery_timeout_secs),
    );
    let report = webhook
        .send_all(&records, Duration::from_millis(config.delivery_delay_ms))
        .await;
    output::print_delivery_report(&mut stdout, &report, color)?;
    Ok(())
}

fn extract(config: &Config, file_path: &std::path::Path, color: ColorMode) -> anyhow::Result<()> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }
    let name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.display().to_string());
    let blob = DocumentBlob::new(name.clone(), std::fs::read(file_path)?);

    let extractor = DocumentExtractor::from_config(config);
    let collected = CollectingSink::new();
    let outcome = extractor.extract_outcome(&blob, &Tee::new(&TracingSink, &collected));

    let mut stdout = std::io::stdout();
    output::print_extraction(&mut stdout, &name, &outcome, &collected.diagnostics(), color)?;
    Ok(())
}
