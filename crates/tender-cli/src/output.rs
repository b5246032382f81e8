use std::io::Write;

use owo_colors::OwoColorize;

use tender_core::{Diagnostic, DiagnosticKind, ExtractionOutcome, TenderRecord};
use tender_scrape::DeliveryReport;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// First `max` characters of `s`, with an ellipsis if cut.
fn shorten(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}...", s.chars().take(max).collect::<String>())
    } else {
        s.to_string()
    }
}

pub fn print_diagnostics(
    w: &mut dyn Write,
    diagnostics: &[Diagnostic],
    color: ColorMode,
) -> std::io::Result<()> {
    for d in diagnostics {
        let label = match (d.kind, color.enabled()) {
            (DiagnosticKind::Unsupported, true) => "SKIPPED".dimmed().to_string(),
            (DiagnosticKind::Unsupported, false) => "SKIPPED".to_string(),
            (_, true) => "WARNING".yellow().to_string(),
            (_, false) => "WARNING".to_string(),
        };
        writeln!(w, "{} {}", label, d)?;
    }
    Ok(())
}

/// Text of a single local document followed by what went wrong, if anything.
pub fn print_extraction(
    w: &mut dyn Write,
    name: &str,
    outcome: &ExtractionOutcome,
    diagnostics: &[Diagnostic],
    color: ColorMode,
) -> std::io::Result<()> {
    let text = outcome.text();
    let status = match outcome {
        ExtractionOutcome::Extracted(_) => format!("{} characters", text.chars().count()),
        ExtractionOutcome::Unsupported { format } => format!("unsupported format ({format})"),
        ExtractionOutcome::Failed(_) => "extraction failed".to_string(),
    };

    if color.enabled() {
        writeln!(w, "{} {} ({})", "EXTRACTED:".bold().cyan(), name.bold(), status)?;
    } else {
        writeln!(w, "EXTRACTED: {} ({})", name, status)?;
    }
    writeln!(w)?;
    if !text.is_empty() {
        writeln!(w, "{}", text)?;
        writeln!(w)?;
    }
    print_diagnostics(w, diagnostics, color)
}

/// One line per tender: title, URL and attachment count.
pub fn print_tender_list(
    w: &mut dyn Write,
    target_date: &str,
    records: &[TenderRecord],
    excluded: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(
            w,
            "{} {} relevant tenders posted on {} ({} excluded by keyword)",
            "FOUND:".bold().cyan(),
            records.len(),
            target_date.bold(),
            excluded
        )?;
    } else {
        writeln!(
            w,
            "FOUND: {} relevant tenders posted on {} ({} excluded by keyword)",
            records.len(),
            target_date,
            excluded
        )?;
    }
    writeln!(w)?;

    for (i, record) in records.iter().enumerate() {
        let title = shorten(&record.title, 80);
        if color.enabled() {
            writeln!(w, "[{}] {}", i + 1, title.bold())?;
            writeln!(w, "    {}", record.url.dimmed())?;
        } else {
            writeln!(w, "[{}] {}", i + 1, title)?;
            writeln!(w, "    {}", record.url)?;
        }
        writeln!(w, "    {} attachment(s)", record.attachments.len())?;
    }
    Ok(())
}

/// Progress line after a tender's attachments have been processed.
pub fn print_tender_extracted(
    w: &mut dyn Write,
    index: usize,
    total: usize,
    record: &TenderRecord,
    color: ColorMode,
) -> std::io::Result<()> {
    let chars = record.extracted_text().chars().count();
    let title = shorten(&record.title, 50);
    if color.enabled() {
        writeln!(
            w,
            "[{}/{}] {} \"{}\" ({} chars)",
            index + 1,
            total,
            "EXTRACTED".green(),
            title,
            chars
        )?;
    } else {
        writeln!(
            w,
            "[{}/{}] EXTRACTED \"{}\" ({} chars)",
            index + 1,
            total,
            title,
            chars
        )?;
    }
    print_diagnostics(w, record.diagnostics(), color)
}

pub fn print_delivery_report(
    w: &mut dyn Write,
    report: &DeliveryReport,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    for (url, error) in &report.failed {
        if color.enabled() {
            writeln!(w, "{} {} ({})", "NOT DELIVERED".red(), url, error)?;
        } else {
            writeln!(w, "NOT DELIVERED {} ({})", url, error)?;
        }
    }
    let summary = format!(
        "Delivered {} of {} records",
        report.sent,
        report.sent + report.failed.len()
    );
    if color.enabled() {
        if report.failed.is_empty() {
            writeln!(w, "{}", summary.bold().green())?;
        } else {
            writeln!(w, "{}", summary.bold().yellow())?;
        }
    } else {
        writeln!(w, "{}", summary)?;
    }
    Ok(())
}
