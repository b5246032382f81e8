use mupdf::{Colorspace, Document, ImageFormat, Matrix, Page, TextPageFlags};

use tender_core::{BackendError, PdfBackend, RenderedPage};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so that the other extraction paths do not transitively
/// depend on it.
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

fn open(data: &[u8]) -> Result<Document, BackendError> {
    Document::from_bytes(data, "pdf").map_err(|e| BackendError::OpenError(e.to_string()))
}

/// Text objects of one page, line by line in block order.
fn page_text(page: &Page) -> Result<String, BackendError> {
    let text_page = page
        .to_text_page(TextPageFlags::empty())
        .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

    let mut text = String::new();
    for block in text_page.blocks() {
        for line in block.lines() {
            let line_text: String = line
                .chars()
                .map(|c| c.char().unwrap_or('\u{FFFD}'))
                .collect();
            text.push_str(&line_text);
            text.push('\n');
        }
    }
    Ok(text)
}

fn render_png(page: &Page, scale: f32) -> Result<Vec<u8>, BackendError> {
    let matrix = Matrix::new_scale(scale, scale);
    let pixmap = page
        .to_pixmap(&matrix, &Colorspace::device_rgb(), false, true)
        .map_err(|e| BackendError::RenderError(e.to_string()))?;
    let mut png = Vec::new();
    pixmap
        .write_to(&mut png, ImageFormat::PNG)
        .map_err(|e| BackendError::RenderError(e.to_string()))?;
    Ok(png)
}

impl PdfBackend for MupdfBackend {
    fn page_texts(&self, data: &[u8]) -> Result<Vec<String>, BackendError> {
        let document = open(data)?;

        let mut pages_text = Vec::new();
        for page_result in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            pages_text.push(page_text(&page)?);
        }
        Ok(pages_text)
    }

    fn render_pages(
        &self,
        data: &[u8],
        dpi: u32,
        on_page: &mut dyn FnMut(usize, usize, Result<RenderedPage, BackendError>),
    ) -> Result<(), BackendError> {
        let document = open(data)?;
        let total = document
            .page_count()
            .map_err(|e| BackendError::OpenError(e.to_string()))?;
        let total = usize::try_from(total).unwrap_or(0);

        // PDF user space is 72 units per inch.
        let scale = dpi as f32 / 72.0;

        for index in 0..total {
            let number = index + 1;
            let rendered = document
                .load_page(index as i32)
                .map_err(|e| BackendError::RenderError(e.to_string()))
                .and_then(|page| render_png(&page, scale))
                .map(|png| RenderedPage { number, total, png });
            if let Err(e) = &rendered {
                tracing::debug!(page = number, total, error = %e, "page render failed");
            }
            on_page(number, total, rendered);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_yield_no_text() {
        let backend = MupdfBackend::new();
        // MuPDF may refuse the stream outright or "repair" it into an empty document.
        match backend.page_texts(b"definitely not a pdf") {
            Ok(pages) => assert!(pages.iter().all(|p| p.trim().is_empty())),
            Err(e) => assert!(matches!(
                e,
                BackendError::OpenError(_) | BackendError::ExtractionError(_)
            )),
        }
    }

    #[test]
    fn empty_stream_renders_no_pages() {
        let backend = MupdfBackend::new();
        let mut seen = 0;
        let _ = backend.render_pages(b"", 300, &mut |_, _, _| seen += 1);
        assert_eq!(seen, 0);
    }
}
