use crate::config::Strategy;
use crate::error::CrewError;
use crate::extraction::{DocumentExtractor, PageContent};
use crate::tables::{read_grids, TableFormat};

/// Tabular roster extracts (CSV or XLSX). Each worksheet becomes one page
/// holding a single grid.
pub struct SheetExtractor {
    format: TableFormat,
}

impl SheetExtractor {
    pub fn new(format: TableFormat) -> Self {
        SheetExtractor { format }
    }
}

impl DocumentExtractor for SheetExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<PageContent>, CrewError> {
        let sheets = read_grids(bytes, self.format).map_err(CrewError::UnreadableDocument)?;

        Ok(sheets
            .into_iter()
            .enumerate()
            .map(|(i, grid)| PageContent {
                page_number: i + 1,
                tokens: Vec::new(),
                lines: Vec::new(),
                tables: vec![grid],
            })
            .collect())
    }

    fn backend_name(&self) -> &str {
        match self.format {
            TableFormat::Csv => "csv",
            TableFormat::Xlsx => "xlsx",
        }
    }

    fn supports(&self, strategy: Strategy) -> bool {
        strategy == Strategy::GridTable
    }
}
