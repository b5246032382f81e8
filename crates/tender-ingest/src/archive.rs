use std::io::{Cursor, Read};

use tender_core::{
    Diagnostic, DiagnosticKind, DocumentBlob, DocumentFormat, EventSink, ExtractedText,
    ExtractionEvent, Provenance,
};

use crate::{DocumentExtractor, FormatError};

/// Returns true if the entry should be skipped regardless of its extension:
/// directories, macOS resource forks, hidden files.
fn is_noise(name: &str, is_dir: bool) -> bool {
    if is_dir || name.contains("__MACOSX") {
        return true;
    }
    name.rsplit('/')
        .next()
        .is_none_or(|base| base.is_empty() || base.starts_with('.'))
}

/// Extract every member of a ZIP archive whose extension has an extractor,
/// in archive order, each under a `===== From <name> =====` header.
///
/// Members are dispatched through `extractor`, so a member that fails only
/// costs its own text. Nested archives are not entered. `max_size` limits the
/// total uncompressed bytes read (0 = unlimited); when reached, the remaining
/// members are skipped with a diagnostic.
pub fn extract_members(
    extractor: &DocumentExtractor,
    blob: &DocumentBlob,
    max_size: u64,
    sink: &dyn EventSink,
) -> Result<ExtractedText, FormatError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(blob.data()))?;

    let mut text = ExtractedText::new();
    let mut total_size: u64 = 0;
    let mut extracted = 0usize;

    for i in 0..archive.len() {
        let (name, data) = {
            let mut file = match archive.by_index(i) {
                Ok(file) => file,
                Err(e) => {
                    report(sink, blob, format!("entry {i}: {e}"));
                    continue;
                }
            };

            let name = file.name().to_string();
            if is_noise(&name, file.is_dir()) {
                continue;
            }
            if !DocumentFormat::from_name(&name).is_archive_member() {
                tracing::debug!(archive = blob.name(), member = %name, "skipping archive member");
                continue;
            }

            if max_size > 0 && add_to_total(&mut total_size, file.size(), max_size) {
                report(
                    sink,
                    blob,
                    format!(
                        "size limit ({}MB) reached after {} files, skipping remaining",
                        max_size / 1024 / 1024,
                        extracted
                    ),
                );
                break;
            }

            let mut data = Vec::new();
            if let Err(e) = file.read_to_end(&mut data) {
                report(sink, blob, format!("failed to read {name}: {e}"));
                continue;
            }
            (name, data)
        };

        sink.emit(ExtractionEvent::ArchiveMember {
            archive: blob.name().to_string(),
            member: name.clone(),
        });
        let member = DocumentBlob::new(name.clone(), data);
        let member_text = extractor.extract(&member, sink);
        text.push(Provenance::ArchiveEntry(name), member_text);
        extracted += 1;
    }

    Ok(text)
}

/// Add a member's declared size to the running total; true once it exceeds
/// `max_size`. Declared sizes come from the archive itself, so the total
/// saturates instead of wrapping.
fn add_to_total(total: &mut u64, size: u64, max_size: u64) -> bool {
    *total = total.saturating_add(size);
    *total > max_size
}

fn report(sink: &dyn EventSink, blob: &DocumentBlob, cause: String) {
    sink.emit(ExtractionEvent::Diagnostic(Diagnostic::new(
        blob.name(),
        DocumentFormat::Zip,
        DiagnosticKind::Parse,
        cause,
    )));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_entries() {
        assert!(is_noise("docs/", true));
        assert!(is_noise("__MACOSX/._a.pdf", false));
        assert!(is_noise("docs/.DS_Store", false));
        assert!(!is_noise("docs/cps.pdf", false));
        assert!(!is_noise("a.csv", false));
    }

    #[test]
    fn forged_member_sizes_still_hit_the_limit() {
        let max = 10 * 1024 * 1024;
        let mut total = 0;
        assert!(!add_to_total(&mut total, 4096, max));
        assert!(add_to_total(&mut total, u64::MAX - 1, max));
        assert!(add_to_total(&mut total, u64::MAX, max));
        assert_eq!(total, u64::MAX);
    }
}
