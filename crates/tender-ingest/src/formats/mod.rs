//! One extractor per document format. Each returns normalized segments and
//! leaves failure reporting to the dispatcher.

pub mod docx;
pub mod pdf;
pub mod table;
pub mod text;
