//! Workbook cell values and their interpretation as dates and sales figures.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// A single decoded workbook cell, independent of the spreadsheet backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    /// Spreadsheet error value such as `#N/A` or `#DIV/0!`.
    Error(String),
}

/// Largest serial accepted as a date (9999-12-31 in the 1900 date system).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Slashed and dashed layouts are month-first; the day-first variants only
/// match when the first field cannot be a month.
const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

impl Cell {
    /// Interprets the cell as a sales amount.
    ///
    /// `Ok(None)` marks a missing value (empty cell, blank text, spreadsheet
    /// error, NaN); such rows are dropped by the loader. Text that is not a
    /// number and boolean cells are rejected.
    pub fn as_sales(&self) -> Result<Option<f64>, String> {
        match self {
            Cell::Empty | Cell::Error(_) => Ok(None),
            Cell::Number(v) if v.is_nan() => Ok(None),
            Cell::Number(v) if v.is_infinite() => Err(format!("non-finite sales value {v}")),
            Cell::Number(v) => Ok(Some(*v)),
            Cell::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(None);
                }
                match s.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(Some(v)),
                    Ok(v) if v.is_nan() => Ok(None),
                    _ => Err(format!("'{s}' is not a sales amount")),
                }
            }
            Cell::Bool(b) => Err(format!("boolean '{b}' is not a sales amount")),
            Cell::Date(d) => Err(format!("date '{d}' is not a sales amount")),
        }
    }

    /// Interprets the cell as a calendar date.
    ///
    /// Numbers are read as spreadsheet serials in the 1900 date system;
    /// text is tried as ISO, then month-first, then day-first. Anything else is
    /// `None`.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::Number(serial) => date_from_serial(*serial),
            Cell::Text(s) => parse_date_text(s.trim()),
            _ => None,
        }
    }
}

/// Converts a 1900-system spreadsheet serial (fractional part is the time of
/// day) to a date. The 1899-12-30 epoch absorbs the phantom 1900-02-29, so
/// serials from 61 (1900-03-01) onward are exact.
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn sales_from_numbers_and_text() {
        assert_eq!(Cell::Number(1520.5).as_sales(), Ok(Some(1520.5)));
        assert_eq!(Cell::Text(" 980.25 ".into()).as_sales(), Ok(Some(980.25)));
        assert!(Cell::Text("n/d".into()).as_sales().is_err());
        assert!(Cell::Bool(true).as_sales().is_err());
        assert!(Cell::Number(f64::INFINITY).as_sales().is_err());
    }

    #[test]
    fn missing_sales() {
        assert_eq!(Cell::Empty.as_sales(), Ok(None));
        assert_eq!(Cell::Text("   ".into()).as_sales(), Ok(None));
        assert_eq!(Cell::Error("#N/A".into()).as_sales(), Ok(None));
        assert_eq!(Cell::Number(f64::NAN).as_sales(), Ok(None));
    }

    #[test]
    fn serial_dates() {
        assert_eq!(date_from_serial(1.0), Some(ymd(1899, 12, 31)));
        assert_eq!(date_from_serial(45_292.0), Some(ymd(2024, 1, 1)));
        // time of day is truncated
        assert_eq!(date_from_serial(45_292.75), Some(ymd(2024, 1, 1)));
        assert_eq!(date_from_serial(0.0), None);
        assert_eq!(date_from_serial(f64::NAN), None);
    }

    #[test]
    fn text_dates() {
        assert_eq!(Cell::Text("2024-03-15".into()).as_date(), Some(ymd(2024, 3, 15)));
        assert_eq!(Cell::Text("15/03/2024".into()).as_date(), Some(ymd(2024, 3, 15)));
        assert_eq!(
            Cell::Text("2024-03-15T08:30:00".into()).as_date(),
            Some(ymd(2024, 3, 15))
        );
        assert_eq!(Cell::Text("marzo".into()).as_date(), None);
        assert_eq!(Cell::Empty.as_date(), None);
        assert_eq!(Cell::Date(ymd(2023, 7, 1)).as_date(), Some(ymd(2023, 7, 1)));
    }

    #[test]
    fn slashed_text_dates_are_month_first() {
        assert_eq!(Cell::Text("03/04/2024".into()).as_date(), Some(ymd(2024, 3, 4)));
        assert_eq!(Cell::Text("12/25/2024".into()).as_date(), Some(ymd(2024, 12, 25)));
        assert_eq!(
            Cell::Text("12/25/2024 17:45:00".into()).as_date(),
            Some(ymd(2024, 12, 25))
        );
        // day-first only when the first field exceeds 12
        assert_eq!(Cell::Text("25/12/2024".into()).as_date(), Some(ymd(2024, 12, 25)));
        assert_eq!(Cell::Text("13/13/2024".into()).as_date(), None);
    }
}
