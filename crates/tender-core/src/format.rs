use std::fmt;

use serde::{Serialize, Serializer};

/// Container format of a document, derived from its filename.
///
/// The mapping from extension to variant is total: anything not recognised
/// lands in [`DocumentFormat::Unsupported`], carrying the extension it saw.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// `.pdf`: page-oriented, with recognition fallback.
    Pdf,
    /// `.docx`: paragraph-structured word-processor document.
    Docx,
    /// `.doc`: legacy binary word-processor document. Recognised so archive
    /// members can be listed, but there is no extractor for it.
    LegacyWord,
    /// `.xlsx`: spreadsheet, first sheet only.
    Xlsx,
    /// `.csv`: comma-delimited table.
    Csv,
    /// `.zip`: compressed container, members are dispatched recursively.
    Zip,
    /// `.txt`: UTF-8 text, decoded leniently.
    Text,
    /// Any other extension (possibly empty).
    Unsupported(String),
}

impl DocumentFormat {
    /// Map a bare extension (without the dot) to a format, case-insensitively.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "doc" => Self::LegacyWord,
            "xlsx" => Self::Xlsx,
            "csv" => Self::Csv,
            "zip" => Self::Zip,
            "txt" => Self::Text,
            _ => Self::Unsupported(ext),
        }
    }

    /// Derive the format from a filename or path-like name.
    ///
    /// Only the final path component is considered, and only the suffix after its
    /// last dot. Names without a dot map to `Unsupported("")`.
    pub fn from_name(name: &str) -> Self {
        let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
        match base.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unsupported(String::new()),
        }
    }

    /// Whether an archive member of this format is handed back to the dispatcher.
    ///
    /// Mirrors the member filter the archive extractor has always used: the five
    /// extractable formats plus legacy `.doc`. Nested `.zip` members are not listed.
    pub fn is_archive_member(&self) -> bool {
        matches!(
            self,
            Self::Pdf | Self::Docx | Self::LegacyWord | Self::Xlsx | Self::Csv | Self::Text
        )
    }

    /// Short lowercase label used in logs and diagnostics.
    pub fn label(&self) -> &str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::LegacyWord => "doc",
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Zip => "zip",
            Self::Text => "txt",
            Self::Unsupported(ext) => ext,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(ext) if ext.is_empty() => write!(f, "unsupported (no extension)"),
            Self::Unsupported(ext) => write!(f, "unsupported (.{ext})"),
            other => f.write_str(other.label()),
        }
    }
}

impl Serialize for DocumentFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
