//! Sales data: workbook access, loading and grouping.
//!
//! # Layout
//!
//! - [`Cell`] — backend-independent cell value with date/sales parsing
//! - [`WorkbookSource`] — sheet-oriented workbook access
//!   ([`ExcelWorkbook`] for files, [`MemoryWorkbook`] for in-memory data)
//! - [`load_sales`] / [`load_workbook`] — flatten every sheet into a [`SalesTable`]
//! - [`GroupStatistics`], [`MonthPeriod`] — per-store and per-month summaries

mod cell;
mod loader;
mod table;
mod workbook;

pub use cell::{date_from_serial, Cell};
pub use loader::{load_sales, load_workbook};
pub use table::{GroupStatistics, MonthPeriod, SalesRecord, SalesTable, StoreGroup};
pub use workbook::{ExcelWorkbook, MemoryWorkbook, SheetRows, WorkbookSource};
