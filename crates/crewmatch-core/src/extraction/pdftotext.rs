use crate::config::Strategy;
use crate::error::CrewError;
use crate::extraction::{run_tool, tool_available, DocumentExtractor, PageContent, PositionedToken};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::ffi::OsStr;
use std::io::Write;

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// `pdftotext -bbox` yields one box per word, which is what the geometric
/// strategies cluster. `pdftotext -layout` is run as well so text-based
/// strategies have lines to work with on born-digital PDFs.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        tool_available("pdftotext", "-v")
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentExtractor for PdftotextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, CrewError> {
        if !pdf_bytes.starts_with(b"%PDF") {
            return Err(CrewError::UnreadableDocument(
                "input is not a PDF (missing %PDF header)".into(),
            ));
        }

        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| CrewError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| CrewError::Extraction(e.to_string()))?;
        let tmp_path = tmpfile.path().as_os_str();

        let bbox = run_tool("pdftotext", &[OsStr::new("-bbox"), tmp_path, OsStr::new("-")])?;
        let word_pages = parse_bbox_words(&String::from_utf8_lossy(&bbox))?;

        let layout = run_tool("pdftotext", &[OsStr::new("-layout"), tmp_path, OsStr::new("-")])?;
        let layout = String::from_utf8_lossy(&layout);
        // pdftotext uses form feed \x0c as page separator
        let mut line_pages: Vec<Vec<String>> = layout
            .split('\x0c')
            .map(|page| page.lines().map(|l| l.to_string()).collect())
            .collect();

        let pages = word_pages
            .into_iter()
            .enumerate()
            .map(|(i, tokens)| PageContent {
                page_number: i + 1,
                tokens,
                lines: line_pages.get_mut(i).map(std::mem::take).unwrap_or_default(),
                tables: Vec::new(),
            })
            .collect();

        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }

    fn supports(&self, strategy: Strategy) -> bool {
        strategy != Strategy::GridTable
    }
}

/// Parse `pdftotext -bbox` XHTML into one token list per `<page>`.
fn parse_bbox_words(xml: &str) -> Result<Vec<Vec<PositionedToken>>, CrewError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = false;

    let mut pages: Vec<Vec<PositionedToken>> = Vec::new();
    let mut current: Option<PositionedToken> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"page" => pages.push(Vec::new()),
                b"word" => current = word_box(&e),
                _ => {}
            },
            Ok(Event::Empty(e)) if e.name().as_ref() == b"page" => pages.push(Vec::new()),
            Ok(Event::Text(t)) => {
                if let Some(word) = current.as_mut() {
                    let text = t
                        .unescape()
                        .map(|c| c.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                    word.text.push_str(&text);
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"word" => {
                if let Some(word) = current.take() {
                    let text = word.text.trim();
                    if !text.is_empty() {
                        let word = PositionedToken {
                            text: text.to_string(),
                            ..word
                        };
                        match pages.last_mut() {
                            Some(page) => page.push(word),
                            None => pages.push(vec![word]),
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CrewError::Extraction(format!(
                    "invalid pdftotext -bbox output at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(pages)
}

fn word_box(tag: &BytesStart<'_>) -> Option<PositionedToken> {
    let mut x_min = None;
    let mut y_min = None;
    let mut x_max = None;
    let mut y_max = None;

    for attr in tag.attributes().flatten() {
        let value: Option<f32> = std::str::from_utf8(&attr.value)
            .ok()
            .and_then(|v| v.parse().ok());
        match attr.key.as_ref() {
            b"xMin" => x_min = value,
            b"yMin" => y_min = value,
            b"xMax" => x_max = value,
            b"yMax" => y_max = value,
            _ => {}
        }
    }

    Some(PositionedToken::new(String::new(), x_min?, x_max?, y_min?, y_max?))
}
