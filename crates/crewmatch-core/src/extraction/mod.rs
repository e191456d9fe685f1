pub mod docx;
pub mod ocr;
pub mod pdftotext;
pub mod sheet;

use crate::config::Strategy;
use crate::error::CrewError;
use crate::tables::TableFormat;
use std::path::Path;
use std::process::Command;

/// A unit of text with its bounding box in page coordinates (origin top-left).
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken {
    pub text: String,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl PositionedToken {
    pub fn new(text: impl Into<String>, left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self {
            text: text.into(),
            left,
            right,
            top,
            bottom,
        }
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// A table exposed by the document itself (DOCX table, spreadsheet).
pub type Grid = Vec<Vec<String>>;

/// Content extracted from a single page (or sheet) of a roster document.
///
/// Backends fill whichever representations they can: positioned tokens for
/// PDFs, text lines for recognized scans, grids for DOCX and spreadsheets.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub page_number: usize,
    pub tokens: Vec<PositionedToken>,
    pub lines: Vec<String>,
    pub tables: Vec<Grid>,
}

/// Trait for roster document extraction backends.
pub trait DocumentExtractor: Send + Sync {
    /// Extract content from document bytes, returning one PageContent per page.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<PageContent>, CrewError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;

    /// Whether this backend fills the page representation `strategy` reads.
    fn supports(&self, _strategy: Strategy) -> bool {
        true
    }
}

/// Pick a backend for a roster file from its extension and the strategy the
/// profile asks for. Scanned input always goes through OCR. A strategy the
/// backend cannot feed (grids from a PDF, word boxes from a spreadsheet) is a
/// profile error, not an empty roster.
pub fn extractor_for_path(
    path: &Path,
    strategy: Strategy,
) -> Result<Box<dyn DocumentExtractor>, CrewError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let extractor: Box<dyn DocumentExtractor> = match ext.as_str() {
        "docx" => Box::new(docx::DocxExtractor::new()),
        "csv" => Box::new(sheet::SheetExtractor::new(TableFormat::Csv)),
        "xlsx" => Box::new(sheet::SheetExtractor::new(TableFormat::Xlsx)),
        "png" | "jpg" | "jpeg" | "tif" | "tiff" => Box::new(ocr::OcrExtractor::new()),
        "pdf" if strategy == Strategy::RecognizedText => Box::new(ocr::OcrExtractor::new()),
        "pdf" => Box::new(pdftotext::PdftotextExtractor::new()),
        _ => {
            return Err(CrewError::UnreadableDocument(format!(
                "unsupported roster file '{}' (expected pdf, docx, csv, xlsx or an image)",
                path.display()
            )))
        }
    };

    if !extractor.supports(strategy) {
        return Err(CrewError::ProfileInvalid(format!(
            "strategy '{strategy}' cannot read '{}': the {} backend does not produce what it needs",
            path.display(),
            extractor.backend_name()
        )));
    }
    Ok(extractor)
}

/// Run an external tool and return its stdout.
pub(crate) fn run_tool(tool: &str, args: &[&std::ffi::OsStr]) -> Result<Vec<u8>, CrewError> {
    let output = Command::new(tool).args(args).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CrewError::ToolNotFound {
                tool: tool.to_string(),
            }
        } else {
            CrewError::Extraction(format!("{tool} failed: {e}"))
        }
    })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(CrewError::ToolFailed {
            tool: tool.to_string(),
            code,
            stderr,
        });
    }

    Ok(output.stdout)
}

/// Check if an external tool is on the PATH.
pub fn tool_available(tool: &str, version_flag: &str) -> bool {
    Command::new(tool)
        .arg(version_flag)
        .output()
        .map(|o| o.status.success() || !o.stderr.is_empty())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_centers() {
        let t = PositionedToken::new("A", 40.0, 56.0, 100.0, 110.0);
        assert_eq!(t.center_x(), 48.0);
        assert_eq!(t.center_y(), 105.0);
    }

    #[test]
    fn test_extractor_for_path_by_extension() {
        let pick = |p: &str, s| extractor_for_path(Path::new(p), s).map(|e| e.backend_name().to_string());
        assert_eq!(pick("roster.pdf", Strategy::SameRow).unwrap(), "pdftotext");
        assert_eq!(pick("roster.PDF", Strategy::RecognizedText).unwrap(), "tesseract");
        assert_eq!(pick("roster.docx", Strategy::GridTable).unwrap(), "docx");
        assert_eq!(pick("roster.xlsx", Strategy::GridTable).unwrap(), "xlsx");
        assert_eq!(pick("scan.png", Strategy::SameRow).unwrap(), "tesseract");
        assert!(matches!(
            pick("roster.txt", Strategy::SameRow),
            Err(CrewError::UnreadableDocument(_))
        ));
    }

    #[test]
    fn test_backend_strategy_mismatch_is_a_profile_error() {
        let pick = |p: &str, s| extractor_for_path(Path::new(p), s).map(|e| e.backend_name().to_string());
        for (path, strategy, backend) in [
            ("roster.pdf", Strategy::GridTable, "pdftotext"),
            ("roster.docx", Strategy::SameRow, "docx"),
            ("roster.csv", Strategy::NearestRowAbove, "csv"),
            ("roster.xlsx", Strategy::RecognizedText, "xlsx"),
            ("scan.png", Strategy::GridTable, "tesseract"),
        ] {
            match pick(path, strategy) {
                Err(CrewError::ProfileInvalid(msg)) => {
                    assert!(msg.contains(backend), "{msg}");
                    assert!(msg.contains(&strategy.to_string()), "{msg}");
                }
                other => panic!("{path} with {strategy}: expected ProfileInvalid, got {other:?}"),
            }
        }

        assert_eq!(pick("roster.docx", Strategy::RecognizedText).unwrap(), "docx");
        assert_eq!(pick("scan.png", Strategy::NearestRowAbove).unwrap(), "tesseract");
    }
}
