//! Page-oriented extraction with a recognition fallback.
//!
//! Embedded page text is tried first. When it fails to parse or yields only
//! whitespace, every page is rasterized and run through the OCR engine, and
//! that result replaces the primary one entirely.

use tender_core::{
    BackendError, Diagnostic, DiagnosticKind, DocumentBlob, DocumentFormat, EventSink,
    ExtractedText, ExtractionEvent, ExtractionOutcome, OcrEngine, PdfBackend, Provenance,
    normalize,
};

pub fn extract_pages(
    pdf: &dyn PdfBackend,
    ocr: &dyn OcrEngine,
    dpi: u32,
    blob: &DocumentBlob,
    sink: &dyn EventSink,
) -> ExtractionOutcome {
    let reason = match embedded_text(pdf, blob.data()) {
        Ok(text) if !text.is_blank() => return ExtractionOutcome::Extracted(text),
        Ok(_) => "no embedded text".to_string(),
        Err(e) => {
            sink.emit(ExtractionEvent::Diagnostic(Diagnostic::new(
                blob.name(),
                DocumentFormat::Pdf,
                DiagnosticKind::Parse,
                e.to_string(),
            )));
            format!("embedded text unreadable: {e}")
        }
    };

    sink.emit(ExtractionEvent::OcrFallback {
        source: blob.name().to_string(),
        reason,
    });

    match recognized_text(pdf, ocr, dpi, blob, sink) {
        Ok(text) => ExtractionOutcome::Extracted(text),
        Err(e) => {
            let diagnostic = Diagnostic::new(
                blob.name(),
                DocumentFormat::Pdf,
                DiagnosticKind::Recognition,
                e.to_string(),
            );
            sink.emit(ExtractionEvent::Diagnostic(diagnostic.clone()));
            ExtractionOutcome::Failed(diagnostic)
        }
    }
}

/// One `Page` segment per page that has text after normalization.
fn embedded_text(pdf: &dyn PdfBackend, data: &[u8]) -> Result<ExtractedText, BackendError> {
    let pages = pdf.page_texts(data)?;
    let total = pages.len();
    let mut text = ExtractedText::new();
    for (i, raw) in pages.iter().enumerate() {
        let page = normalize(raw);
        if !page.is_empty() {
            text.push(Provenance::Page { number: i + 1, total }, page);
        }
    }
    Ok(text)
}

/// One `OcrPage` segment per page the engine finds text on. A page that fails
/// to render or recognise is reported and skipped; only an unopenable
/// document fails the whole pass.
fn recognized_text(
    pdf: &dyn PdfBackend,
    ocr: &dyn OcrEngine,
    dpi: u32,
    blob: &DocumentBlob,
    sink: &dyn EventSink,
) -> Result<ExtractedText, BackendError> {
    let mut text = ExtractedText::new();
    pdf.render_pages(blob.data(), dpi, &mut |number, total, rendered| {
        sink.emit(ExtractionEvent::OcrPage {
            source: blob.name().to_string(),
            page: number,
            total,
        });
        match rendered.and_then(|page| ocr.recognize(&page)) {
            Ok(raw) => {
                let page = normalize(&raw);
                if !page.is_empty() {
                    text.push(Provenance::OcrPage { number, total }, page);
                }
            }
            Err(e) => sink.emit(ExtractionEvent::Diagnostic(Diagnostic::new(
                blob.name(),
                DocumentFormat::Pdf,
                DiagnosticKind::Recognition,
                format!("page {number}/{total} via {}: {e}", ocr.name()),
            ))),
        }
    })?;
    Ok(text)
}
