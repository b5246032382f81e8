use std::path::PathBuf;

use serde::Serialize;

pub mod backend;
pub mod config_file;
pub mod events;
pub mod extraction;
pub mod format;
pub mod normalize;

// Re-export for convenience
pub use backend::{BackendError, OcrEngine, PdfBackend, RenderedPage};
pub use config_file::ConfigFile;
pub use events::{CollectingSink, EventSink, ExtractionEvent, Tee, TracingSink};
pub use extraction::{
    Diagnostic, DiagnosticKind, ExtractedText, ExtractionOutcome, Provenance, Segment,
};
pub use format::DocumentFormat;
pub use normalize::normalize;

/// Raw bytes of a document together with the name its format is derived from.
///
/// Produced by a download or by reading an archive member, and owned by the
/// call that produced it.
#[derive(Debug, Clone)]
pub struct DocumentBlob {
    name: String,
    data: Vec<u8>,
}

impl DocumentBlob {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Format derived from the name's extension. Content is never sniffed.
    pub fn format(&self) -> DocumentFormat {
        DocumentFormat::from_name(&self.name)
    }
}

/// A published tender: the unit that is extracted and delivered downstream.
#[derive(Debug, Clone, Serialize)]
pub struct TenderRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "URL")]
    pub url: String,
    /// Attachment URLs in page order.
    #[serde(rename = "Attachments")]
    pub attachments: Vec<String>,
    #[serde(rename = "Extracted_Text")]
    extracted_text: String,
    #[serde(rename = "Diagnostics", skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
}

impl TenderRecord {
    pub fn new(title: impl Into<String>, url: impl Into<String>, attachments: Vec<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            attachments,
            extracted_text: String::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Combined text of all attachments. Empty until [`TenderRecord::attach_text`] runs.
    pub fn extracted_text(&self) -> &str {
        &self.extracted_text
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Set the combined attachment text and the diagnostics gathered while producing it.
    ///
    /// Called once, after every attachment has been processed.
    pub fn attach_text(&mut self, text: String, diagnostics: Vec<Diagnostic>) {
        debug_assert!(
            self.extracted_text.is_empty() && self.diagnostics.is_empty(),
            "extracted text attached twice"
        );
        self.extracted_text = text;
        self.diagnostics = diagnostics;
    }
}

pub const DEFAULT_BASE_URL: &str = "https://tanmia.ma/appels-doffres/";
pub const DEFAULT_OCR_LANGUAGES: &str = "ara+fra+eng";
pub const DEFAULT_OCR_DPI: u32 = 300;

/// Title keywords that mark a tender as irrelevant.
pub const DEFAULT_EXCLUDED_KEYWORDS: &[&str] = &[
    "construction",
    "installation",
    "travaux",
    "fourniture",
    "achat",
    "equipement",
    "supply",
    "acquisition",
    "nettoyage",
];

/// Runtime configuration.
#[derive(Clone)]
pub struct Config {
    /// Listing root; page `n` lives at `{base_url}{n}/`.
    pub base_url: String,
    pub max_pages: u32,
    /// Target posting date is today minus this many days.
    pub days_back: i64,
    pub excluded_keywords: Vec<String>,
    /// Tesseract language set, e.g. `ara+fra+eng`.
    pub ocr_languages: String,
    pub ocr_dpi: u32,
    pub tesseract_path: PathBuf,
    /// Total uncompressed bytes read from one archive, in MB. 0 = unlimited.
    pub max_archive_size_mb: u32,
    pub download_timeout_secs: u64,
    pub webhook_url: Option<String>,
    pub delivery_timeout_secs: u64,
    pub delivery_delay_ms: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("max_pages", &self.max_pages)
            .field("days_back", &self.days_back)
            .field("excluded_keywords", &self.excluded_keywords)
            .field("ocr_languages", &self.ocr_languages)
            .field("ocr_dpi", &self.ocr_dpi)
            .field("tesseract_path", &self.tesseract_path)
            .field("max_archive_size_mb", &self.max_archive_size_mb)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "***"))
            .field("delivery_timeout_secs", &self.delivery_timeout_secs)
            .field("delivery_delay_ms", &self.delivery_delay_ms)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_pages: 5,
            days_back: 1,
            excluded_keywords: DEFAULT_EXCLUDED_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ocr_languages: DEFAULT_OCR_LANGUAGES.to_string(),
            ocr_dpi: DEFAULT_OCR_DPI,
            tesseract_path: PathBuf::from("tesseract"),
            max_archive_size_mb: 0,
            download_timeout_secs: 60,
            webhook_url: None,
            delivery_timeout_secs: 60,
            delivery_delay_ms: 1000,
        }
    }
}

impl Config {
    /// Defaults overridden by whatever the config file sets.
    pub fn from_file(file: &ConfigFile) -> Self {
        let mut config = Self::default();
        if let Some(site) = &file.site {
            if let Some(url) = &site.base_url {
                config.base_url = url.clone();
            }
            if let Some(n) = site.max_pages {
                config.max_pages = n;
            }
            if let Some(d) = site.days_back {
                config.days_back = d;
            }
        }
        if let Some(words) = file.filter.as_ref().and_then(|f| f.excluded_keywords.clone()) {
            config.excluded_keywords = words;
        }
        if let Some(ext) = &file.extraction {
            if let Some(langs) = &ext.ocr_languages {
                config.ocr_languages = langs.clone();
            }
            if let Some(dpi) = ext.ocr_dpi {
                config.ocr_dpi = dpi;
            }
            if let Some(path) = &ext.tesseract_path {
                config.tesseract_path = PathBuf::from(path);
            }
            if let Some(mb) = ext.max_archive_size_mb {
                config.max_archive_size_mb = mb;
            }
        }
        if let Some(secs) = file.network.as_ref().and_then(|n| n.download_timeout_secs) {
            config.download_timeout_secs = secs;
        }
        if let Some(delivery) = &file.delivery {
            if delivery.webhook_url.is_some() {
                config.webhook_url = delivery.webhook_url.clone();
            }
            if let Some(secs) = delivery.timeout_secs {
                config.delivery_timeout_secs = secs;
            }
            if let Some(ms) = delivery.delay_ms {
                config.delivery_delay_ms = ms;
            }
        }
        config
    }

    /// Archive size limit in bytes, 0 = unlimited.
    pub fn max_archive_bytes(&self) -> u64 {
        self.max_archive_size_mb as u64 * 1024 * 1024
    }
}
