use std::fmt;

use serde::Serialize;

use crate::format::DocumentFormat;
use crate::normalize::{is_blank, normalize};

/// Where a piece of extracted text came from inside its document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Untagged text (plain text, tables, paragraphs).
    Body,
    /// Text objects of a page, 1-based.
    Page { number: usize, total: usize },
    /// Recognised text of a rasterized page, 1-based.
    OcrPage { number: usize, total: usize },
    /// Text of a member of an archive.
    ArchiveEntry(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub provenance: Provenance,
    pub text: String,
}

impl Segment {
    pub fn body(text: impl Into<String>) -> Self {
        Self {
            provenance: Provenance::Body,
            text: text.into(),
        }
    }

    fn render(&self) -> String {
        match &self.provenance {
            Provenance::Body => self.text.clone(),
            Provenance::Page { number, total } => {
                format!("[PDF PAGE {number}/{total}]\n{}", self.text)
            }
            Provenance::OcrPage { number, total } => {
                format!("[OCR PAGE {number}/{total}]\n{}", self.text)
            }
            Provenance::ArchiveEntry(name) => format!("===== From {name} =====\n{}", self.text),
        }
    }
}

/// Ordered text segments of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pub segments: Vec<Segment>,
}

impl ExtractedText {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single untagged segment.
    pub fn body(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::body(text)],
        }
    }

    pub fn push(&mut self, provenance: Provenance, text: impl Into<String>) {
        self.segments.push(Segment {
            provenance,
            text: text.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when no segment carries any text after normalization.
    pub fn is_blank(&self) -> bool {
        self.segments
            .iter()
            .all(|s| is_blank(&s.text))
    }

    /// Concatenate the segments with their provenance tags, one blank line apart.
    pub fn render(&self) -> String {
        self.segments
            .iter()
            .map(Segment::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// No extractor for the document's format.
    Unsupported,
    /// The bytes could not be parsed as the claimed format.
    Parse,
    /// Rasterization or text recognition failed.
    Recognition,
    /// The attachment could not be fetched.
    Download,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unsupported => "unsupported",
            Self::Parse => "parse",
            Self::Recognition => "recognition",
            Self::Download => "download",
        };
        f.write_str(s)
    }
}

/// A structured description of something that went wrong while handling a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Document name (filename, archive member, or URL).
    pub source: String,
    pub format: DocumentFormat,
    pub kind: DiagnosticKind,
    pub cause: String,
    /// Byte offset of the failure, when the parser reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl Diagnostic {
    pub fn new(
        source: impl Into<String>,
        format: DocumentFormat,
        kind: DiagnosticKind,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            format,
            kind,
            cause: cause.into(),
            offset: None,
        }
    }

    pub fn with_offset(mut self, offset: Option<u64>) -> Self {
        self.offset = offset;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}: {}", self.source, self.format, self.kind, self.cause)?;
        if let Some(offset) = self.offset {
            write!(f, " (at byte {offset})")?;
        }
        Ok(())
    }
}

/// Result of extracting one document.
///
/// Only `Extracted` carries text. `Unsupported` and `Failed` degrade to an
/// empty string in [`ExtractionOutcome::into_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Extracted(ExtractedText),
    Unsupported { format: DocumentFormat },
    Failed(Diagnostic),
}

impl ExtractionOutcome {
    /// Normalized text of the document, empty unless extraction succeeded.
    pub fn text(&self) -> String {
        match self {
            Self::Extracted(text) => normalize(&text.render()),
            Self::Unsupported { .. } | Self::Failed(_) => String::new(),
        }
    }

    pub fn into_text(self) -> String {
        self.text()
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Failed(d) => Some(d),
            _ => None,
        }
    }

    pub fn is_extracted(&self) -> bool {
        matches!(self, Self::Extracted(_))
    }
}
