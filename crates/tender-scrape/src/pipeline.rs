use std::sync::Arc;

use tender_core::{
    CollectingSink, Diagnostic, DiagnosticKind, DocumentFormat, EventSink, Tee, TenderRecord,
    TracingSink,
};
use tender_ingest::DocumentExtractor;

use crate::download::{Downloader, attachment_name};

/// Join per-attachment texts as `--- From <name> ---` sections, one blank
/// line apart, in the order given. Empty texts keep their header.
pub fn combine_sections(sections: &[(String, String)]) -> String {
    sections
        .iter()
        .map(|(name, text)| format!("--- From {name} ---\n{text}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Downloads every attachment of a tender and extracts its text.
///
/// Attachments are handled one at a time, in list order. Extraction runs on
/// the blocking pool. A download failure costs only that attachment's section.
pub struct AttachmentProcessor {
    downloader: Downloader,
    extractor: Arc<DocumentExtractor>,
    sink: Arc<dyn EventSink>,
}

impl AttachmentProcessor {
    pub fn new(downloader: Downloader, extractor: Arc<DocumentExtractor>) -> Self {
        Self {
            downloader,
            extractor,
            sink: Arc::new(TracingSink),
        }
    }

    /// Where extraction events go in addition to the record's diagnostics.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Fill `record`'s extracted text and diagnostics.
    pub async fn process(&self, record: &mut TenderRecord) {
        let mut sections = Vec::with_capacity(record.attachments.len());
        let mut diagnostics = Vec::new();

        for url in &record.attachments {
            let name = attachment_name(url);
            let blob = match self.downloader.fetch(url).await {
                Ok(blob) => blob,
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "attachment download failed");
                    diagnostics.push(Diagnostic::new(
                        url.as_str(),
                        DocumentFormat::from_name(&name),
                        DiagnosticKind::Download,
                        e.to_string(),
                    ));
                    continue;
                }
            };

            let extractor = Arc::clone(&self.extractor);
            let sink = Arc::clone(&self.sink);
            let extracted = tokio::task::spawn_blocking(move || {
                let collected = CollectingSink::new();
                let text = extractor.extract(&blob, &Tee::new(sink.as_ref(), &collected));
                (text, collected.diagnostics())
            })
            .await;

            match extracted {
                Ok((text, found)) => {
                    tracing::info!(attachment = %name, chars = text.chars().count(), "attachment extracted");
                    sections.push((name, text));
                    diagnostics.extend(found);
                }
                Err(e) => {
                    tracing::warn!(attachment = %name, error = %e, "extraction task failed");
                    diagnostics.push(Diagnostic::new(
                        name.as_str(),
                        DocumentFormat::from_name(&name),
                        DiagnosticKind::Parse,
                        format!("extraction task failed: {e}"),
                    ));
                }
            }
        }

        record.attach_text(combine_sections(&sections), diagnostics);
    }
}
