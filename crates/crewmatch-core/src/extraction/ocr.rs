use crate::config::Strategy;
use crate::error::CrewError;
use crate::extraction::{run_tool, tool_available, DocumentExtractor, PageContent, PositionedToken};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Default DPI for rendering PDF pages before recognition.
pub const DEFAULT_OCR_DPI: u32 = 300;

/// OCR backend for scanned rosters.
///
/// PDF pages are rendered with `pdftoppm`; each image is recognized by
/// `tesseract` in TSV mode, which gives both word boxes (tokens) and the
/// recognized text lines.
pub struct OcrExtractor {
    dpi: u32,
    language: String,
}

impl OcrExtractor {
    pub fn new() -> Self {
        Self::with_options(DEFAULT_OCR_DPI, "eng")
    }

    pub fn with_options(dpi: u32, language: impl Into<String>) -> Self {
        OcrExtractor {
            dpi,
            language: language.into(),
        }
    }

    pub fn is_available() -> bool {
        tool_available("tesseract", "--version")
    }

    fn render_pdf(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, CrewError> {
        let prefix = out_dir.join("page");
        let dpi = self.dpi.to_string();
        run_tool(
            "pdftoppm",
            &[
                OsStr::new("-r"),
                OsStr::new(&dpi),
                OsStr::new("-png"),
                pdf.as_os_str(),
                prefix.as_os_str(),
            ],
        )?;

        // pdftoppm names pages page-1.png, page-01.png ... depending on count;
        // sort by the numeric suffix.
        let mut images: Vec<(u32, PathBuf)> = std::fs::read_dir(out_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|e| e == "png"))
            .filter_map(|p| {
                let stem = p.file_stem()?.to_str()?;
                let n = stem.rsplit('-').next()?.parse().ok()?;
                Some((n, p))
            })
            .collect();
        images.sort();
        Ok(images.into_iter().map(|(_, p)| p).collect())
    }

    fn recognize(&self, image: &Path, page_number: usize) -> Result<PageContent, CrewError> {
        let tsv = run_tool(
            "tesseract",
            &[
                image.as_os_str(),
                OsStr::new("stdout"),
                OsStr::new("-l"),
                OsStr::new(&self.language),
                OsStr::new("tsv"),
            ],
        )?;
        parse_tesseract_tsv(&tsv, page_number)
    }
}

impl Default for OcrExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentExtractor for OcrExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<PageContent>, CrewError> {
        let dir = tempfile::tempdir().map_err(|e| CrewError::Extraction(e.to_string()))?;

        let images = match sniff_image(bytes) {
            Some(ext) => {
                let path = dir.path().join(format!("scan.{ext}"));
                std::fs::write(&path, bytes)?;
                vec![path]
            }
            None if bytes.starts_with(b"%PDF") => {
                let pdf = dir.path().join("roster.pdf");
                std::fs::write(&pdf, bytes)?;
                let out = dir.path().join("pages");
                std::fs::create_dir(&out)?;
                self.render_pdf(&pdf, &out)?
            }
            None => {
                return Err(CrewError::UnreadableDocument(
                    "OCR input must be a PDF, PNG, JPEG or TIFF".into(),
                ))
            }
        };

        let mut pages = Vec::with_capacity(images.len());
        for (i, image) in images.iter().enumerate() {
            tracing::debug!(page = i + 1, image = %image.display(), "recognizing page");
            pages.push(self.recognize(image, i + 1)?);
        }
        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "tesseract"
    }

    fn supports(&self, strategy: Strategy) -> bool {
        strategy != Strategy::GridTable
    }
}

fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG") {
        Some("png")
    } else if bytes.starts_with(b"\xFF\xD8") {
        Some("jpg")
    } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        Some("tif")
    } else {
        None
    }
}

/// Parse tesseract TSV output. Word rows (level 5) become tokens; words
/// sharing a (block, paragraph, line) key are joined into a text line.
fn parse_tesseract_tsv(tsv: &[u8], page_number: usize) -> Result<PageContent, CrewError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .has_headers(true)
        .from_reader(tsv);

    let headers = reader.headers()?.clone();
    let col = |name: &str| -> Result<usize, CrewError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CrewError::Extraction(format!("tesseract TSV missing column '{name}'")))
    };
    let (level, block, par, line) = (col("level")?, col("block_num")?, col("par_num")?, col("line_num")?);
    let (left, top, width, height) = (col("left")?, col("top")?, col("width")?, col("height")?);
    let text = col("text")?;

    let mut tokens = Vec::new();
    let mut lines: BTreeMap<(u32, u32, u32), Vec<String>> = BTreeMap::new();

    for record in reader.records() {
        let record = record?;
        if record.get(level) != Some("5") {
            continue;
        }
        let word = record.get(text).unwrap_or("").trim();
        if word.is_empty() {
            continue;
        }
        let num = |i: usize| record.get(i).and_then(|v| v.trim().parse::<f32>().ok()).unwrap_or(0.0);
        let key = |i: usize| record.get(i).and_then(|v| v.trim().parse::<u32>().ok()).unwrap_or(0);

        let (x, y) = (num(left), num(top));
        tokens.push(PositionedToken::new(word, x, x + num(width), y, y + num(height)));
        lines
            .entry((key(block), key(par), key(line)))
            .or_default()
            .push(word.to_string());
    }

    Ok(PageContent {
        page_number,
        tokens,
        lines: lines.into_values().map(|words| words.join(" ")).collect(),
        tables: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t1000\t800\t-1\t
4\t1\t1\t1\t1\t0\t10\t10\t300\t20\t-1\t
5\t1\t1\t1\t1\t1\t10\t10\t40\t20\t91.2\tBerg
5\t1\t1\t1\t1\t2\t60\t10\t50\t20\t90.0\t(KVB)
5\t1\t1\t1\t1\t3\t120\t10\t10\t20\t88.1\t3
5\t1\t1\t1\t1\t4\t135\t10\t10\t20\t87.5\tA
5\t1\t1\t1\t2\t1\t10\t40\t40\t20\t91.2\tHolm
5\t1\t1\t1\t2\t2\t60\t40\t50\t20\t-1\t
";

    #[test]
    fn test_parse_tesseract_tsv() {
        let page = parse_tesseract_tsv(TSV.as_bytes(), 2).unwrap();
        assert_eq!(page.page_number, 2);
        assert_eq!(page.tokens.len(), 5);
        assert_eq!(page.tokens[1].text, "(KVB)");
        assert_eq!(page.tokens[1].right, 110.0);
        assert_eq!(page.lines, vec!["Berg (KVB) 3 A", "Holm"]);
    }

    #[test]
    fn test_sniff_image() {
        assert_eq!(sniff_image(b"\x89PNG\r\n"), Some("png"));
        assert_eq!(sniff_image(b"\xFF\xD8\xFF"), Some("jpg"));
        assert_eq!(sniff_image(b"%PDF-1.7"), None);
    }

    #[test]
    fn test_unknown_input_rejected() {
        let err = OcrExtractor::new().extract_pages(b"hello").unwrap_err();
        assert!(matches!(err, CrewError::UnreadableDocument(_)));
    }
}
