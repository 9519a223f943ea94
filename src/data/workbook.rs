//! Workbook access.
//!
//! The loader reads sheets through [`WorkbookSource`], so the same code runs
//! against spreadsheet files ([`ExcelWorkbook`], backed by `calamine`) and
//! in-memory tables ([`MemoryWorkbook`]).

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use log::debug;

use super::cell::Cell;
use crate::error::{AnalysisError, Result};

/// Rows of one sheet in reading order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRows {
    /// 1-based spreadsheet row number of `rows[0]`.
    pub first_row: usize,
    pub rows: Vec<Vec<Cell>>,
}

/// A workbook made of named sheets.
pub trait WorkbookSource {
    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Reads every used row of a sheet.
    fn read_sheet(&mut self, name: &str) -> Result<SheetRows>;
}

/// Spreadsheet file (`.xlsx`, `.xlsm`, `.xls`, `.ods`).
pub struct ExcelWorkbook {
    path: PathBuf,
    inner: Sheets<BufReader<File>>,
}

impl ExcelWorkbook {
    /// Opens a workbook file.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::FileNotFound`] if the path does not resolve to a
    /// file, [`AnalysisError::Workbook`] for any other read failure.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(AnalysisError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let inner = open_workbook_auto(path).map_err(|source| match source {
            calamine::Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound => {
                AnalysisError::FileNotFound {
                    path: path.to_path_buf(),
                }
            }
            source => AnalysisError::Workbook {
                path: path.to_path_buf(),
                source,
            },
        })?;
        debug!("opened workbook {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }
}

impl WorkbookSource for ExcelWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> Result<SheetRows> {
        let range = self
            .inner
            .worksheet_range(name)
            .map_err(|source| AnalysisError::Workbook {
                path: self.path.clone(),
                source,
            })?;
        let first_row = range.start().map_or(1, |(row, _)| row as usize + 1);
        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();
        Ok(SheetRows { first_row, rows })
    }
}

fn cell_from_data(data: &Data) -> Cell {
    #[allow(unreachable_patterns)]
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => Cell::Date(ts.date()),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Error(format!("{e:?}")),
        _ => Cell::Empty,
    }
}

/// Workbook held in memory, mainly for tests and programmatic use.
///
/// # Examples
///
/// ```
/// use u_anova::data::{Cell, MemoryWorkbook, WorkbookSource};
///
/// let mut wb = MemoryWorkbook::new();
/// wb.add_sheet("Centro", vec![
///     vec![Cell::Text("Fecha".into()), Cell::Text("Ventas".into())],
///     vec![Cell::Text("2024-01-02".into()), Cell::Number(1500.0)],
/// ]);
/// assert_eq!(wb.sheet_names(), vec!["Centro".to_string()]);
/// assert_eq!(wb.read_sheet("Centro").unwrap().rows.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<(String, Vec<Vec<Cell>>)>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sheet; rows start at spreadsheet row 1.
    pub fn add_sheet(&mut self, name: impl Into<String>, rows: Vec<Vec<Cell>>) -> &mut Self {
        self.sheets.push((name.into(), rows));
        self
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<SheetRows> {
        self.sheets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, rows)| SheetRows {
                first_row: 1,
                rows: rows.clone(),
            })
            .ok_or_else(|| AnalysisError::Parse {
                sheet: name.to_string(),
                row: 0,
                message: "sheet does not exist".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let err = ExcelWorkbook::open(Path::new("no/such/ventas.xlsx"))
            .err()
            .expect("open should fail");
        assert!(matches!(err, AnalysisError::FileNotFound { .. }));
    }

    #[test]
    fn unreadable_file_is_workbook_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ventas.xlsx");
        std::fs::write(&path, b"definitely not a zip archive").expect("write");
        let err = ExcelWorkbook::open(&path)
            .and_then(|mut wb| {
                let names = wb.sheet_names();
                match names.first() {
                    Some(name) => wb.read_sheet(name).map(|_| ()),
                    None => Err(AnalysisError::InsufficientData("no sheets".into())),
                }
            })
            .expect_err("garbage must not load");
        assert!(matches!(
            err,
            AnalysisError::Workbook { .. } | AnalysisError::InsufficientData(_)
        ));
    }

    #[test]
    fn memory_workbook_keeps_order() {
        let mut wb = MemoryWorkbook::new();
        wb.add_sheet("Sur", vec![]).add_sheet("Norte", vec![]);
        assert_eq!(wb.sheet_names(), vec!["Sur".to_string(), "Norte".to_string()]);
        assert!(wb.read_sheet("Este").is_err());
    }
}
