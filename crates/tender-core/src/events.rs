//! Structured progress and diagnostic events emitted while extracting documents.
//!
//! Extractors never print or count anything themselves; they emit events to an
//! [`EventSink`] handed down the call chain.

use std::sync::Mutex;

use crate::extraction::Diagnostic;
use crate::format::DocumentFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionEvent {
    /// Dispatch of a document started.
    Started {
        source: String,
        format: DocumentFormat,
    },
    /// An archive member is about to be dispatched.
    ArchiveMember { archive: String, member: String },
    /// The page-oriented extractor found no text and switched to recognition.
    OcrFallback { source: String, reason: String },
    /// A page went through the recognition engine.
    OcrPage {
        source: String,
        page: usize,
        total: usize,
    },
    /// Dispatch of a document finished.
    Finished {
        source: String,
        format: DocumentFormat,
        chars: usize,
    },
    Diagnostic(Diagnostic),
}

/// Receiver of [`ExtractionEvent`]s.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ExtractionEvent);
}

impl<F> EventSink for F
where
    F: Fn(ExtractionEvent) + Send + Sync,
{
    fn emit(&self, event: ExtractionEvent) {
        self(event)
    }
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: ExtractionEvent) {
        match event {
            ExtractionEvent::Started { source, format } => {
                tracing::debug!(%source, %format, "extracting");
            }
            ExtractionEvent::ArchiveMember { archive, member } => {
                tracing::debug!(%archive, %member, "archive member");
            }
            ExtractionEvent::OcrFallback { source, reason } => {
                tracing::info!(%source, %reason, "no embedded text, switching to OCR");
            }
            ExtractionEvent::OcrPage {
                source,
                page,
                total,
            } => {
                tracing::debug!(%source, page, total, "OCR page");
            }
            ExtractionEvent::Finished {
                source,
                format,
                chars,
            } => {
                tracing::info!(%source, %format, chars, "extraction finished");
            }
            ExtractionEvent::Diagnostic(d) => match d.kind {
                crate::DiagnosticKind::Unsupported => {
                    tracing::info!(source = %d.source, format = %d.format, cause = %d.cause, "unsupported document");
                }
                _ => {
                    tracing::warn!(source = %d.source, format = %d.format, kind = %d.kind, cause = %d.cause, "extraction diagnostic");
                }
            },
        }
    }
}

/// Keeps every event in memory. Used to attach diagnostics to a tender record,
/// and in tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ExtractionEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ExtractionEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ExtractionEvent::Diagnostic(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    /// Drain the collected events, leaving the sink empty.
    pub fn take(&self) -> Vec<ExtractionEvent> {
        self.events
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: ExtractionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Sends every event to two sinks, in order.
pub struct Tee<'a> {
    first: &'a dyn EventSink,
    second: &'a dyn EventSink,
}

impl<'a> Tee<'a> {
    pub fn new(first: &'a dyn EventSink, second: &'a dyn EventSink) -> Self {
        Self { first, second }
    }
}

impl EventSink for Tee<'_> {
    fn emit(&self, event: ExtractionEvent) {
        self.first.emit(event.clone());
        self.second.emit(event);
    }
}
