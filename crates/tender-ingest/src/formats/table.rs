use std::io::Cursor;

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use chrono::NaiveTime;

use tender_core::{ExtractedText, normalize};

use crate::FormatError;

/// Comma-separated values, first row as header.
pub fn extract_delimited(data: &[u8]) -> Result<ExtractedText, FormatError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(ExtractedText::body(normalize(&render_table(&header, &rows))))
}

/// First worksheet of an Office Open XML workbook, first row as header.
pub fn extract_spreadsheet(data: &[u8]) -> Result<ExtractedText, FormatError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(data))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(FormatError::NoWorksheet)??;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let header = rows.next().unwrap_or_default();
    let body: Vec<Vec<String>> = rows.collect();
    Ok(ExtractedText::body(normalize(&render_table(&header, &body))))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::DateTime(dt) if dt.is_datetime() => match dt.as_datetime() {
            Some(at) if at.time() == NaiveTime::MIN => at.format("%Y-%m-%d").to_string(),
            Some(at) => at.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.to_string(),
        },
        other => other.to_string(),
    }
}

/// Plain-text grid: every cell right-aligned to its column's widest value,
/// header first, no row index. Short rows are padded with empty cells.
pub fn render_table(header: &[String], rows: &[Vec<String>]) -> String {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let mut widths = vec![0usize; columns];
    for line in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
        for (i, cell) in line.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    std::iter::once(header)
        .chain(rows.iter().map(Vec::as_slice))
        .map(|line| {
            (0..columns)
                .map(|i| {
                    let cell = line.get(i).map(String::as_str).unwrap_or("");
                    format!("{:>width$}", cell, width = widths[i])
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
    const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    /// Two-sheet workbook: `Name, Amount, Deadline` plus one row whose
    /// deadline is serial 46312 styled as a date, then a second sheet.
    fn workbook() -> Vec<u8> {
        let parts = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#.to_string(),
            ),
            (
                "xl/workbook.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="{NS}" xmlns:r="{REL_NS}"><sheets><sheet name="Offres" sheetId="1" r:id="rId1"/><sheet name="Annexe" sheetId="2" r:id="rId2"/></sheets></workbook>"#
                ),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_NS}/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="{REL_NS}/worksheet" Target="worksheets/sheet2.xml"/></Relationships>"#
                ),
            ),
            (
                "xl/sharedStrings.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><sst xmlns="{NS}" count="5" uniqueCount="5"><si><t>Name</t></si><si><t>Amount</t></si><si><t>Deadline</t></si><si><t>Acme</t></si><si><t>SECONDSHEET</t></si></sst>"#
                ),
            ),
            (
                "xl/styles.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><styleSheet xmlns="{NS}"><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14" applyNumberFormat="1"/></cellXfs></styleSheet>"#
                ),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="{NS}"><dimension ref="A1:C2"/><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c></row><row r="2"><c r="A2" t="s"><v>3</v></c><c r="B2"><v>100</v></c><c r="C2" s="1"><v>46312</v></c></row></sheetData></worksheet>"#
                ),
            ),
            (
                "xl/worksheets/sheet2.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="{NS}"><dimension ref="A1"/><sheetData><row r="1"><c r="A1" t="s"><v>4</v></c></row></sheetData></worksheet>"#
                ),
            ),
        ];

        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            for (name, body) in parts {
                zip.start_file(name, SimpleFileOptions::default()).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn spreadsheet_first_sheet_with_dates() {
        let text = extract_spreadsheet(&workbook()).unwrap().render();
        assert_eq!(text, "Name Amount Deadline\nAcme 100 2026-10-17");
        assert!(!text.contains("SECONDSHEET"));
        assert!(!text.contains("46312"));
    }

    #[test]
    fn csv_header_and_rows() {
        let text = extract_delimited(b"Name,Amount\nAcme,100\n").unwrap();
        assert_eq!(text.render(), "Name Amount\nAcme 100");
    }

    #[test]
    fn csv_ragged_rows_are_tolerated() {
        let text = extract_delimited(b"Lot,Objet,Caution\n1,Etude\n2,Audit,5000\n").unwrap();
        let rendered = text.render();
        assert!(rendered.contains("1 Etude"));
        assert!(rendered.contains("2 Audit 5000"));
    }

    #[test]
    fn empty_csv_is_blank() {
        assert!(extract_delimited(b"").unwrap().is_blank());
    }

    #[test]
    fn columns_right_aligned() {
        let header = vec!["Name".to_string(), "Amount".to_string()];
        let rows = vec![vec!["Acme".to_string(), "100".to_string()]];
        assert_eq!(render_table(&header, &rows), "Name  Amount\nAcme     100");
    }

    #[test]
    fn arabic_cells_measured_in_chars() {
        let header = vec!["الاسم".to_string()];
        let rows = vec![vec!["ab".to_string()]];
        assert_eq!(render_table(&header, &rows), "الاسم\n   ab");
    }

    #[test]
    fn not_a_workbook_is_an_error() {
        assert!(extract_spreadsheet(b"PK\x03\x04 truncated").is_err());
    }
}
