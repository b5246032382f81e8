use tender_core::{ExtractedText, normalize};

/// Decode as UTF-8, replacing invalid sequences, and normalize.
pub fn extract_plain(data: &[u8]) -> ExtractedText {
    ExtractedText::body(normalize(&String::from_utf8_lossy(data)))
}
