use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use thiserror::Error;

use tender_core::{
    Diagnostic, DiagnosticKind, DocumentBlob, DocumentFormat, EventSink,
    ExtractedText, ExtractionEvent, ExtractionOutcome, OcrEngine, PdfBackend,
};

pub mod archive;
pub mod formats;
pub mod ocr;

pub use ocr::TesseractCli;

/// Failure inside a single format strategy. Never escapes [`DocumentExtractor`];
/// it is turned into a [`Diagnostic`] at the dispatch boundary.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),
    #[error("workbook has no worksheets")]
    NoWorksheet,
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("XML error: {source}")]
    Xml {
        source: quick_xml::Error,
        offset: u64,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    /// Byte offset of the failure, when the underlying parser reports one.
    pub fn offset(&self) -> Option<u64> {
        match self {
            FormatError::Csv(e) => e.position().map(|p| p.byte()),
            FormatError::Xml { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// Routes a document to the extractor for its format and turns every failure
/// into a diagnostic. Extraction never fails past this point.
#[derive(Clone)]
pub struct DocumentExtractor {
    pdf: Arc<dyn PdfBackend>,
    ocr: Arc<dyn OcrEngine>,
    ocr_dpi: u32,
    max_archive_bytes: u64,
}

impl DocumentExtractor {
    pub fn new(pdf: Arc<dyn PdfBackend>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            pdf,
            ocr,
            ocr_dpi: tender_core::DEFAULT_OCR_DPI,
            max_archive_bytes: 0,
        }
    }

    /// MuPDF for page text and rasterization, the Tesseract CLI for recognition.
    #[cfg(feature = "pdf")]
    pub fn from_config(config: &tender_core::Config) -> Self {
        Self::new(
            Arc::new(tender_pdf_mupdf::MupdfBackend::new()),
            Arc::new(TesseractCli::from_config(config)),
        )
        .with_ocr_dpi(config.ocr_dpi)
        .with_max_archive_bytes(config.max_archive_bytes())
    }

    pub fn with_ocr_dpi(mut self, dpi: u32) -> Self {
        self.ocr_dpi = dpi;
        self
    }

    /// Cap on the total uncompressed bytes read from one archive. 0 = unlimited.
    pub fn with_max_archive_bytes(mut self, bytes: u64) -> Self {
        self.max_archive_bytes = bytes;
        self
    }

    /// Normalized text of `blob`, or an empty string when nothing could be extracted.
    pub fn extract(&self, blob: &DocumentBlob, sink: &dyn EventSink) -> String {
        self.extract_outcome(blob, sink).into_text()
    }

    /// Extract `blob`, reporting how it went.
    ///
    /// Emits `Started`, then any diagnostics, then `Finished` to `sink`.
    pub fn extract_outcome(&self, blob: &DocumentBlob, sink: &dyn EventSink) -> ExtractionOutcome {
        let format = blob.format();
        sink.emit(ExtractionEvent::Started {
            source: blob.name().to_string(),
            format: format.clone(),
        });

        let outcome = match catch_unwind(AssertUnwindSafe(|| self.dispatch(blob, &format, sink))) {
            Ok(outcome) => outcome,
            Err(_) => {
                let diagnostic = Diagnostic::new(
                    blob.name(),
                    format.clone(),
                    DiagnosticKind::Parse,
                    "extractor panicked on malformed input",
                );
                sink.emit(ExtractionEvent::Diagnostic(diagnostic.clone()));
                ExtractionOutcome::Failed(diagnostic)
            }
        };

        sink.emit(ExtractionEvent::Finished {
            source: blob.name().to_string(),
            format,
            chars: outcome.text().chars().count(),
        });
        outcome
    }

    fn dispatch(
        &self,
        blob: &DocumentBlob,
        format: &DocumentFormat,
        sink: &dyn EventSink,
    ) -> ExtractionOutcome {
        let data = blob.data();
        let result = match format {
            DocumentFormat::Pdf => {
                return formats::pdf::extract_pages(
                    self.pdf.as_ref(),
                    self.ocr.as_ref(),
                    self.ocr_dpi,
                    blob,
                    sink,
                );
            }
            DocumentFormat::Docx => formats::docx::extract_paragraphs(data),
            DocumentFormat::Xlsx => formats::table::extract_spreadsheet(data),
            DocumentFormat::Csv => formats::table::extract_delimited(data),
            DocumentFormat::Text => Ok(formats::text::extract_plain(data)),
            DocumentFormat::Zip => archive::extract_members(self, blob, self.max_archive_bytes, sink),
            DocumentFormat::LegacyWord => {
                return unsupported(blob, format, "no extractor for legacy .doc files", sink);
            }
            DocumentFormat::Unsupported(_) => {
                return unsupported(blob, format, "unrecognised extension", sink);
            }
        };
        finish(blob, format, result, sink)
    }
}

fn unsupported(
    blob: &DocumentBlob,
    format: &DocumentFormat,
    cause: &str,
    sink: &dyn EventSink,
) -> ExtractionOutcome {
    sink.emit(ExtractionEvent::Diagnostic(Diagnostic::new(
        blob.name(),
        format.clone(),
        DiagnosticKind::Unsupported,
        cause,
    )));
    ExtractionOutcome::Unsupported {
        format: format.clone(),
    }
}

fn finish(
    blob: &DocumentBlob,
    format: &DocumentFormat,
    result: Result<ExtractedText, FormatError>,
    sink: &dyn EventSink,
) -> ExtractionOutcome {
    match result {
        Ok(text) => ExtractionOutcome::Extracted(text),
        Err(e) => {
            let diagnostic =
                Diagnostic::new(blob.name(), format.clone(), DiagnosticKind::Parse, e.to_string())
                    .with_offset(e.offset());
            sink.emit(ExtractionEvent::Diagnostic(diagnostic.clone()));
            ExtractionOutcome::Failed(diagnostic)
        }
    }
}
