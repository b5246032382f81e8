use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;

use tender_core::{ExtractedText, normalize};

use crate::FormatError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Paragraph text of an Office Open XML word-processing document, one
/// paragraph per line, empty paragraphs dropped.
///
/// The bytes go through a named temporary file that is removed on every path.
pub fn extract_paragraphs(data: &[u8]) -> Result<ExtractedText, FormatError> {
    extract_paragraphs_in(data, &std::env::temp_dir())
}

/// [`extract_paragraphs`] with the scratch file created under `dir`.
pub fn extract_paragraphs_in(data: &[u8], dir: &Path) -> Result<ExtractedText, FormatError> {
    let mut scratch = tempfile::Builder::new()
        .prefix("tender-")
        .suffix(".docx")
        .tempfile_in(dir)?;
    scratch.write_all(data)?;
    scratch.flush()?;

    let paragraphs = read_paragraphs(scratch.path())?;
    let text = paragraphs
        .iter()
        .map(|p| normalize(p))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    Ok(ExtractedText::body(text))
}

fn read_paragraphs(path: &Path) -> Result<Vec<String>, FormatError> {
    let mut archive = zip::ZipArchive::new(File::open(path)?)?;
    let mut part = archive.by_name(DOCUMENT_PART)?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    parse_paragraphs(&xml)
}

/// Walk `w:p` elements in document order, collecting the text of their runs.
/// Tabs and breaks inside runs become whitespace.
pub fn parse_paragraphs(xml: &str) -> Result<Vec<String>, FormatError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    // Text boxes nest paragraphs inside paragraphs.
    let mut open: Vec<String> = Vec::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        let event = reader.read_event().map_err(|source| FormatError::Xml {
            source,
            offset: reader.buffer_position() as u64,
        })?;
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"r" => in_run = true,
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => {
                let ws = match e.local_name().as_ref() {
                    b"tab" if in_run => Some('\t'),
                    b"br" | b"cr" if in_run => Some('\n'),
                    _ => None,
                };
                if let (Some(c), Some(current)) = (ws, open.last_mut()) {
                    current.push(c);
                }
            }
            Event::Text(t) if in_text => {
                let text = t.unescape().map_err(|e| FormatError::Xml {
                    source: e.into(),
                    offset: reader.buffer_position() as u64,
                })?;
                if let Some(current) = open.last_mut() {
                    current.push_str(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(done) = open.pop() {
                        paragraphs.push(done);
                    }
                }
                b"r" => in_run = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zip::write::SimpleFileOptions;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>Avis d&apos;appel</w:t></w:r><w:r><w:t xml:space="preserve"> d'offres</w:t></w:r></w:p>
    <w:p></w:p>
    <w:p><w:r><w:t>Lot</w:t><w:tab/><w:t>1</w:t></w:r></w:p>
    <w:p><w:r><w:t>مناقصة</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    fn docx_with(document: &str) -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            zip.start_file("[Content_Types].xml", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"<Types/>").unwrap();
            zip.start_file(DOCUMENT_PART, SimpleFileOptions::default())
                .unwrap();
            zip.write_all(document.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn paragraphs_in_order_without_empties() {
        let text = extract_paragraphs(&docx_with(BODY)).unwrap();
        assert_eq!(text.render(), "Avis d'appel d'offres\nLot 1\nمناقصة");
    }

    #[test]
    fn paragraph_properties_do_not_leak_tabs() {
        let paragraphs = parse_paragraphs(BODY).unwrap();
        assert_eq!(paragraphs[0], "Avis d'appel d'offres");
        assert_eq!(paragraphs[2], "Lot\t1");
    }

    #[test]
    fn missing_document_part_is_an_error() {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            zip.start_file("other.xml", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"<x/>").unwrap();
            zip.finish().unwrap();
        }
        assert!(matches!(
            extract_paragraphs(&buf.into_inner()),
            Err(FormatError::Zip(_))
        ));
    }

    #[test]
    fn malformed_xml_reports_offset() {
        let err = parse_paragraphs("<w:p><w:r><w:t>ok</w:x></w:p>").unwrap_err();
        assert!(matches!(err, FormatError::Xml { .. }));
        assert!(err.offset().is_some());
    }

    #[test]
    fn scratch_file_removed_on_every_path() {
        let dir = tempfile::Builder::new()
            .prefix("docx-scratch")
            .tempdir()
            .unwrap();
        let mut no_part = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut no_part);
            zip.start_file("other.xml", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"<x/>").unwrap();
            zip.finish().unwrap();
        }

        assert!(extract_paragraphs_in(&docx_with(BODY), dir.path()).is_ok());
        assert!(extract_paragraphs_in(b"plain text pretending", dir.path()).is_err());
        assert!(extract_paragraphs_in(&no_part.into_inner(), dir.path()).is_err());
        assert!(extract_paragraphs_in(&docx_with("<w:p><w:t>x</w:q>"), dir.path()).is_err());

        let left: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(left.is_empty(), "scratch files left behind: {left:?}");
    }

    #[test]
    fn not_a_zip_is_an_error() {
        assert!(extract_paragraphs(b"plain text pretending").is_err());
    }
}
