use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open document: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("failed to render page: {0}")]
    RenderError(String),
    #[error("text recognition failed: {0}")]
    RecognitionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A page rasterized to an encoded (PNG) image.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 1-based page number.
    pub number: usize,
    pub total: usize,
    pub png: Vec<u8>,
}

/// Backend for page-oriented documents (the PDF family).
///
/// Both operations open the byte stream independently; a failure in one
/// says nothing about the other.
pub trait PdfBackend: Send + Sync {
    /// Embedded text of every page, in page order. One entry per page, possibly empty.
    fn page_texts(&self, data: &[u8]) -> Result<Vec<String>, BackendError>;

    /// Rasterize every page at `dpi`, handing each result to `on_page` in page order.
    ///
    /// Returns `Err` only when the document cannot be opened; per-page render
    /// failures are passed to the callback as `Err` and the walk continues.
    fn render_pages(
        &self,
        data: &[u8],
        dpi: u32,
        on_page: &mut dyn FnMut(usize, usize, Result<RenderedPage, BackendError>),
    ) -> Result<(), BackendError>;
}

/// Optical character recognition over a single page image.
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Recognise the text in an encoded page image.
    fn recognize(&self, page: &RenderedPage) -> Result<String, BackendError>;
}
