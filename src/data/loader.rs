//! Flattens every sheet of a workbook into one [`SalesTable`].
//!
//! Each sheet is one store. Only the first two columns are read, by
//! position, as (date, sales); header text is ignored. Rows whose sales
//! cell is missing are dropped.

use std::path::Path;

use log::{debug, info, warn};

use super::table::{SalesRecord, SalesTable};
use super::workbook::{ExcelWorkbook, SheetRows, WorkbookSource};
use crate::error::{AnalysisError, Result};

/// Loads a workbook file.
///
/// # Errors
///
/// - [`AnalysisError::FileNotFound`] if `path` does not resolve
/// - [`AnalysisError::Workbook`] if the file or a sheet cannot be read
/// - [`AnalysisError::Parse`] if a sheet has fewer than two columns or a
///   sales cell holds something other than a number
pub fn load_workbook(path: &Path, has_header: bool) -> Result<SalesTable> {
    let mut workbook = ExcelWorkbook::open(path)?;
    load_sales(&mut workbook, has_header)
}

/// Reads every sheet of `source` and concatenates the records.
///
/// # Examples
///
/// ```
/// use u_anova::data::{load_sales, Cell, MemoryWorkbook};
///
/// let mut wb = MemoryWorkbook::new();
/// wb.add_sheet("Centro", vec![
///     vec![Cell::Text("Día".into()), Cell::Text("Importe".into())],
///     vec![Cell::Text("2024-01-02".into()), Cell::Number(1500.0)],
///     vec![Cell::Text("2024-01-03".into()), Cell::Empty],
/// ]);
/// let table = load_sales(&mut wb, true).unwrap();
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.records()[0].store, "Centro");
/// assert_eq!(table.dropped_missing(), 1);
/// ```
pub fn load_sales<S: WorkbookSource>(source: &mut S, has_header: bool) -> Result<SalesTable> {
    let sheets = source.sheet_names();
    info!("reading {} sheet(s)", sheets.len());

    let mut records = Vec::new();
    let mut dropped = 0;
    for sheet in &sheets {
        let rows = source.read_sheet(sheet)?;
        let before = records.len();
        dropped += flatten_sheet(sheet, &rows, has_header, &mut records)?;
        debug!("sheet '{}': {} record(s)", sheet, records.len() - before);
    }

    if dropped > 0 {
        warn!("dropped {dropped} row(s) with missing sales");
    }
    Ok(SalesTable::new(records, sheets, dropped))
}

/// Appends the records of one sheet; returns how many rows were dropped.
fn flatten_sheet(
    sheet: &str,
    rows: &SheetRows,
    has_header: bool,
    out: &mut Vec<SalesRecord>,
) -> Result<usize> {
    let Some(width) = rows.rows.iter().map(Vec::len).max() else {
        warn!("sheet '{sheet}' is empty");
        return Ok(0);
    };
    if width < 2 {
        return Err(AnalysisError::Parse {
            sheet: sheet.to_string(),
            row: rows.first_row,
            message: format!("expected at least two columns (date, sales), found {width}"),
        });
    }

    let skip = usize::from(has_header);
    let mut dropped = 0;
    for (offset, row) in rows.rows.iter().enumerate().skip(skip) {
        let date_cell = row.first();
        let sales_cell = row.get(1);
        let sales = match sales_cell.map(|c| c.as_sales()).transpose() {
            Ok(v) => v.flatten(),
            Err(message) => {
                return Err(AnalysisError::Parse {
                    sheet: sheet.to_string(),
                    row: rows.first_row + offset,
                    message,
                })
            }
        };
        match sales {
            Some(sales) => out.push(SalesRecord {
                date: date_cell.and_then(|c| c.as_date()),
                sales,
                store: sheet.to_string(),
            }),
            None => dropped += 1,
        }
    }
    Ok(dropped)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::data::{Cell, MemoryWorkbook};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn row_count_is_sum_of_valid_rows(
            sheets in proptest::collection::vec(
                proptest::collection::vec(proptest::option::of(0.0_f64..1e5), 2..=20),
                2..=6,
            )
        ) {
            let mut wb = MemoryWorkbook::new();
            let mut expected = 0;
            for (i, values) in sheets.iter().enumerate() {
                let mut rows = vec![vec![Cell::Text("Fecha".into()), Cell::Text("Ventas".into())]];
                for v in values {
                    let cell = match v {
                        Some(x) => {
                            expected += 1;
                            Cell::Number(*x)
                        }
                        None => Cell::Empty,
                    };
                    rows.push(vec![Cell::Text("2024-05-01".into()), cell]);
                }
                wb.add_sheet(format!("Tienda {i}"), rows);
            }
            let total_rows: usize = sheets.iter().map(Vec::len).sum();
            let t = load_sales(&mut wb, true).expect("load");
            prop_assert_eq!(t.len(), expected);
            prop_assert_eq!(t.dropped_missing(), total_rows - expected);
        }
    }
}
