use super::{MarkerSite, PageScan};
use crate::extraction::Grid;
use crate::model::Day;
use std::collections::BTreeSet;

/// Explicit table grids (DOCX tables, spreadsheet sheets). The header row
/// gives the day of every column directly, so a marker cell is credited to
/// its own column's day without any positional matching.
pub(crate) fn extract(tables: &[Grid], scan: &mut PageScan<'_>) {
    for (table_index, grid) in tables.iter().enumerate() {
        let Some((header_index, day_columns)) = header_row(grid) else {
            scan.diagnostics.tables_without_days += 1;
            tracing::debug!(page = scan.page_number, table = table_index, "table has no day header");
            continue;
        };
        scan.days.extend(day_columns.iter().map(|(_, day)| *day));
        let header_width = distinct_days(&day_columns);
        let day_cols: BTreeSet<usize> = day_columns.iter().map(|(col, _)| *col).collect();

        for (row_index, row) in grid.iter().enumerate().skip(header_index + 1) {
            // repeated header rows (multi-page tables)
            if distinct_days(&day_cells(row)) == header_width {
                continue;
            }

            let marked: Vec<Day> = day_columns
                .iter()
                .filter(|(col, _)| row.get(*col).is_some_and(|cell| scan.matcher.is_marker(cell)))
                .map(|(_, day)| *day)
                .collect();
            if marked.is_empty() {
                continue;
            }

            let row_text = row.join(" ");
            let pilots = scan.matcher.codes_in(
                row.iter()
                    .enumerate()
                    .filter(|(col, _)| !day_cols.contains(col))
                    .map(|(_, cell)| cell.as_str()),
            );
            if pilots.is_empty() {
                scan.pilotless_row(row_index, &row_text, marked.len());
                continue;
            }

            for day in marked {
                let site = MarkerSite {
                    row_index,
                    row_text: &row_text,
                    marker_x: None,
                    distance: None,
                };
                scan.credit(site, &pilots, day);
            }
        }
    }
}

fn day_cells(row: &[String]) -> Vec<(usize, Day)> {
    row.iter()
        .enumerate()
        .filter_map(|(col, cell)| Day::parse(cell).map(|day| (col, day)))
        .collect()
}

fn distinct_days(cells: &[(usize, Day)]) -> usize {
    cells.iter().map(|(_, day)| *day).collect::<BTreeSet<_>>().len()
}

/// The first row with the most distinct day cells.
fn header_row(grid: &Grid) -> Option<(usize, Vec<(usize, Day)>)> {
    let (index, cells) = grid
        .iter()
        .enumerate()
        .map(|(i, row)| (i, day_cells(row)))
        .rev()
        .max_by_key(|(_, cells)| distinct_days(cells))?;
    (!cells.is_empty()).then_some((index, cells))
}
