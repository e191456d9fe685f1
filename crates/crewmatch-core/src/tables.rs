//! Role and restriction tables in, pairing tables out.
//!
//! Tables are CSV or XLSX with a header row. Headers are matched
//! case-insensitively and every pilot code is validated at load time, so a
//! malformed table fails up front with the table it came from.

use std::io::Cursor;
use std::path::Path;

use calamine::{Reader, Xlsx};
use serde::{Deserialize, Serialize};

use crate::error::CrewError;
use crate::extraction::Grid;
use crate::model::{Pairing, PilotCode, RestrictionSet, Role, RoleMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    Csv,
    Xlsx,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, CrewError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(TableFormat::Csv),
            Some("xlsx") => Ok(TableFormat::Xlsx),
            _ => Err(CrewError::UnsupportedTableFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Read every sheet of a table file as a grid of trimmed strings. CSV input
/// is a single sheet.
pub(crate) fn read_grids(bytes: &[u8], format: TableFormat) -> Result<Vec<Grid>, String> {
    match format {
        TableFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .trim(csv::Trim::All)
                .from_reader(bytes);
            let grid = reader
                .records()
                .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
                .collect::<Result<Grid, _>>()
                .map_err(|e| format!("invalid csv: {e}"))?;
            Ok(vec![grid])
        }
        TableFormat::Xlsx => {
            let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(bytes))
                .map_err(|e| format!("failed to open xlsx: {e}"))?;
            let mut grids = Vec::new();
            for name in workbook.sheet_names() {
                let range = workbook
                    .worksheet_range(&name)
                    .map_err(|e| format!("failed to read sheet '{name}': {e}"))?;
                grids.push(
                    range
                        .rows()
                        .map(|row| row.iter().map(cell_text).collect())
                        .collect(),
                );
            }
            Ok(grids)
        }
    }
}

fn cell_text(cell: &calamine::Data) -> String {
    match cell {
        calamine::Data::String(s) => s.trim().to_string(),
        calamine::Data::Float(f) => f.to_string(),
        calamine::Data::Int(i) => i.to_string(),
        calamine::Data::Empty => String::new(),
        _ => cell.to_string(),
    }
}

/// A header row plus the data rows under it, with their 1-based line numbers.
struct Table {
    header: Vec<String>,
    rows: Vec<(usize, Vec<String>)>,
}

impl Table {
    /// The first sheet; the first non-empty row is the header, empty rows are skipped.
    fn from_bytes(bytes: &[u8], format: TableFormat) -> Result<Table, String> {
        let grid = read_grids(bytes, format)?
            .into_iter()
            .next()
            .ok_or_else(|| "workbook has no sheets".to_string())?;

        let mut rows = grid
            .into_iter()
            .enumerate()
            .map(|(i, row)| (i + 1, row))
            .filter(|(_, row)| row.iter().any(|cell| !cell.is_empty()));
        let (_, header) = rows.next().ok_or_else(|| "table is empty".to_string())?;
        Ok(Table {
            header,
            rows: rows.collect(),
        })
    }

    fn column(&self, name: &str) -> Result<usize, String> {
        self.header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("missing '{name}' column (found: {})", self.header.join(", ")))
    }
}

fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or("")
}

fn pilot_cell(row: &[String], col: usize, line: usize, what: &str) -> Result<PilotCode, String> {
    let raw = cell(row, col);
    PilotCode::parse(raw).ok_or_else(|| format!("row {line}: invalid {what} code '{raw}'"))
}

/// Parse a roles table with `Pilot` and `Role` columns.
///
/// Roles other than PIC/SIC are kept in `RoleMap::unrecognized`.
pub fn parse_role_map(bytes: &[u8], format: TableFormat) -> Result<RoleMap, CrewError> {
    let table = Table::from_bytes(bytes, format).map_err(CrewError::RoleTable)?;
    let pilot_col = table.column("Pilot").map_err(CrewError::RoleTable)?;
    let role_col = table.column("Role").map_err(CrewError::RoleTable)?;

    let mut roles = RoleMap::new();
    for (line, row) in &table.rows {
        let pilot = pilot_cell(row, pilot_col, *line, "pilot").map_err(CrewError::RoleTable)?;
        let raw_role = cell(row, role_col);
        match Role::from_str_loose(raw_role) {
            Some(role) => roles.insert(pilot, role),
            None => {
                tracing::warn!(pilot = %pilot, role = raw_role, "unrecognized role, pilot will not be paired");
                roles.insert_unrecognized(pilot, raw_role.to_string());
            }
        }
    }

    tracing::debug!(roles = roles.len(), unrecognized = roles.unrecognized.len(), "role table loaded");
    Ok(roles)
}

/// Parse a restrictions table with `PIC` and `SIC` columns.
pub fn parse_restrictions(bytes: &[u8], format: TableFormat) -> Result<RestrictionSet, CrewError> {
    let table = Table::from_bytes(bytes, format).map_err(CrewError::RestrictionTable)?;
    let pic_col = table.column("PIC").map_err(CrewError::RestrictionTable)?;
    let sic_col = table.column("SIC").map_err(CrewError::RestrictionTable)?;

    let mut restrictions = RestrictionSet::new();
    for (line, row) in &table.rows {
        let pic = pilot_cell(row, pic_col, *line, "PIC").map_err(CrewError::RestrictionTable)?;
        let sic = pilot_cell(row, sic_col, *line, "SIC").map_err(CrewError::RestrictionTable)?;
        restrictions.insert(pic, sic);
    }

    tracing::debug!(restrictions = restrictions.len(), "restriction table loaded");
    Ok(restrictions)
}

pub fn load_role_map(path: &Path) -> Result<RoleMap, CrewError> {
    let (bytes, format) = read_table_file(path).map_err(CrewError::RoleTable)?;
    parse_role_map(&bytes, format)
}

pub fn load_restrictions(path: &Path) -> Result<RestrictionSet, CrewError> {
    let (bytes, format) = read_table_file(path).map_err(CrewError::RestrictionTable)?;
    parse_restrictions(&bytes, format)
}

/// Format and contents of a table file. Failures are described with the path
/// so the caller can wrap them in the error for its table kind.
fn read_table_file(path: &Path) -> Result<(Vec<u8>, TableFormat), String> {
    let format = TableFormat::from_path(path).map_err(|e| e.to_string())?;
    let bytes = std::fs::read(path).map_err(|e| format!("cannot read '{}': {e}", path.display()))?;
    Ok((bytes, format))
}

/// Render pairings as CSV with a `PIC,SIC` header, one pairing per line.
pub fn pairings_to_csv(pairings: &[Pairing]) -> Result<String, CrewError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(["PIC", "SIC"])?;
    for pairing in pairings {
        writer.write_record([pairing.pic.as_str(), pairing.sic.as_str()])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CrewError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| CrewError::PairingTable(e.to_string()))
}

/// Parse CSV produced by [`pairings_to_csv`].
pub fn parse_pairings_csv(text: &str) -> Result<Vec<Pairing>, CrewError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes())
        .deserialize::<Pairing>()
        .map(|row| row.map_err(|e| CrewError::PairingTable(e.to_string())))
        .collect()
}
