use crate::config::Strategy;
use crate::error::CrewError;
use crate::extraction::{DocumentExtractor, Grid, PageContent};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// DOCX extraction backend.
///
/// Word rosters carry an explicit table grid, so this backend only produces
/// `tables` (for the grid-table strategy) and paragraph `lines`. A DOCX has no
/// page geometry in its source form; everything lands on page 1.
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        DocxExtractor
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentExtractor for DocxExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<PageContent>, CrewError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| CrewError::UnreadableDocument(format!("failed to open DOCX as ZIP: {e}")))?;

        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| CrewError::UnreadableDocument(format!("word/document.xml not found: {e}")))?
            .read_to_string(&mut xml)?;

        let (tables, lines) = parse_document_xml(&xml)?;
        Ok(vec![PageContent {
            page_number: 1,
            tokens: Vec::new(),
            lines,
            tables,
        }])
    }

    fn backend_name(&self) -> &str {
        "docx"
    }

    fn supports(&self, strategy: Strategy) -> bool {
        matches!(strategy, Strategy::GridTable | Strategy::RecognizedText)
    }
}

#[derive(Default)]
struct TableBuilder {
    rows: Grid,
    row: Vec<String>,
    cell: String,
    span: usize,
}

/// Walk `w:body`, collecting `w:tbl` grids and the text of paragraphs outside tables.
///
/// Horizontally merged cells (`w:gridSpan`) are padded with empty cells so
/// column indices stay aligned with the header row.
fn parse_document_xml(xml: &str) -> Result<(Vec<Grid>, Vec<String>), CrewError> {
    let mut reader = Reader::from_str(xml);

    let mut tables: Vec<Grid> = Vec::new();
    let mut lines: Vec<String> = Vec::new();
    let mut stack: Vec<TableBuilder> = Vec::new();
    let mut paragraph = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"tbl" => stack.push(TableBuilder::default()),
                b"tr" => {
                    if let Some(t) = stack.last_mut() {
                        t.row.clear();
                    }
                }
                b"tc" => {
                    if let Some(t) = stack.last_mut() {
                        t.cell.clear();
                        t.span = 1;
                    }
                }
                b"p" => paragraph.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" | b"br" => paragraph.push(' '),
                b"gridSpan" => {
                    if let (Some(t), Some(span)) = (stack.last_mut(), grid_span(&e)) {
                        t.span = span.max(1);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map(|c| c.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                paragraph.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let text = paragraph.trim().to_string();
                    paragraph.clear();
                    match stack.last_mut() {
                        Some(t) => {
                            if !text.is_empty() {
                                if !t.cell.is_empty() {
                                    t.cell.push(' ');
                                }
                                t.cell.push_str(&text);
                            }
                        }
                        None => {
                            if !text.is_empty() {
                                lines.push(text);
                            }
                        }
                    }
                }
                b"tc" => {
                    if let Some(t) = stack.last_mut() {
                        let cell = std::mem::take(&mut t.cell);
                        t.row.push(cell);
                        for _ in 1..t.span {
                            t.row.push(String::new());
                        }
                    }
                }
                b"tr" => {
                    if let Some(t) = stack.last_mut() {
                        let row = std::mem::take(&mut t.row);
                        t.rows.push(row);
                    }
                }
                b"tbl" => {
                    if let Some(t) = stack.pop() {
                        if !t.rows.is_empty() {
                            tables.push(t.rows);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CrewError::UnreadableDocument(format!(
                    "invalid word/document.xml: {e}"
                )))
            }
            _ => {}
        }
    }

    Ok((tables, lines))
}

fn grid_span(e: &BytesStart<'_>) -> Option<usize> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"val")
        .and_then(|a| std::str::from_utf8(&a.value).ok()?.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Roster March</w:t></w:r></w:p>
    <w:tbl>
      <w:tr>
        <w:tc><w:p><w:r><w:t>Pilot</w:t></w:r></w:p></w:tc>
        <w:tc><w:p><w:r><w:t>1</w:t></w:r></w:p></w:tc>
        <w:tc><w:p><w:r><w:t>2</w:t></w:r></w:p></w:tc>
        <w:tc><w:p><w:r><w:t>3</w:t></w:r></w:p></w:tc>
      </w:tr>
      <w:tr>
        <w:tc><w:p><w:r><w:t xml:space="preserve">Berg </w:t></w:r><w:r><w:t>(KVB)</w:t></w:r></w:p></w:tc>
        <w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>A</w:t></w:r></w:p></w:tc>
        <w:tc><w:p><w:r><w:t>A</w:t></w:r></w:p></w:tc>
      </w:tr>
    </w:tbl>
  </w:body>
</w:document>"#;

    #[test]
    fn test_parse_document_xml_tables_and_lines() {
        let (tables, lines) = parse_document_xml(DOC).unwrap();
        assert_eq!(lines, vec!["Roster March"]);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0][0], vec!["Pilot", "1", "2", "3"]);
        // gridSpan=2 pads so that the trailing "A" stays under day 3
        assert_eq!(tables[0][1], vec!["Berg (KVB)", "A", "", "A"]);
    }

    #[test]
    fn test_extract_pages_from_zip() {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            zip.start_file("word/document.xml", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(DOC.as_bytes()).unwrap();
            zip.finish().unwrap();
        }

        let pages = DocxExtractor::new().extract_pages(&buf).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].tables.len(), 1);
    }

    #[test]
    fn test_not_a_zip() {
        let err = DocxExtractor::new().extract_pages(b"%PDF-1.4").unwrap_err();
        assert!(matches!(err, CrewError::UnreadableDocument(_)));
    }
}
