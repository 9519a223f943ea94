//! The unified sales table and its groupings.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use u_numflow::stats;

/// One observation: a day's sales for a store.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    /// `None` when the date cell could not be read as a date.
    pub date: Option<NaiveDate>,
    pub sales: f64,
    /// Name of the sheet the record came from.
    pub store: String,
}

/// All records of a workbook, concatenated in sheet order.
///
/// # Invariants
///
/// - Every `sales` value is finite (missing values were dropped on load)
/// - No deduplication: the table is the plain union of every sheet's rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesTable {
    records: Vec<SalesRecord>,
    sheets: Vec<String>,
    dropped_missing: usize,
}

/// Sales values of one store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreGroup {
    pub store: String,
    pub values: Vec<f64>,
}

/// Count, mean and sample standard deviation of a group of observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupStatistics {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n-1 denominator); `None` when count < 2.
    pub std_dev: Option<f64>,
}

impl GroupStatistics {
    /// Summarises a group. Returns `None` for an empty group.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_anova::data::GroupStatistics;
    ///
    /// let s = GroupStatistics::from_values(&[2.0, 4.0, 6.0]).unwrap();
    /// assert_eq!(s.count, 3);
    /// assert!((s.mean - 4.0).abs() < 1e-12);
    /// assert!((s.std_dev.unwrap() - 2.0).abs() < 1e-12);
    ///
    /// let single = GroupStatistics::from_values(&[5.0]).unwrap();
    /// assert!(single.std_dev.is_none());
    /// ```
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mean = stats::mean(values)?;
        let std_dev = if values.len() < 2 {
            None
        } else {
            stats::std_dev(values)
        };
        Some(Self {
            count: values.len(),
            mean,
            std_dev,
        })
    }
}

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthPeriod {
    pub year: i32,
    pub month: u32,
}

impl MonthPeriod {
    /// Truncates a date to its month.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl SalesTable {
    /// Builds a table from records already cleaned of missing sales.
    ///
    /// `sheets` lists every sheet that was read, including empty ones.
    pub fn new(records: Vec<SalesRecord>, sheets: Vec<String>, dropped_missing: usize) -> Self {
        Self {
            records,
            sheets,
            dropped_missing,
        }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sheets read from the workbook, in workbook order.
    pub fn sheets(&self) -> &[String] {
        &self.sheets
    }

    /// Rows removed on load because their sales cell was missing.
    pub fn dropped_missing(&self) -> usize {
        self.dropped_missing
    }

    /// First `n` records.
    pub fn head(&self, n: usize) -> &[SalesRecord] {
        &self.records[..n.min(self.records.len())]
    }

    /// Distinct store labels that have at least one record, sorted.
    pub fn stores(&self) -> Vec<&str> {
        let mut stores: Vec<&str> = self.records.iter().map(|r| r.store.as_str()).collect();
        stores.sort_unstable();
        stores.dedup();
        stores
    }

    /// Sales values partitioned by store, sorted by store label.
    pub fn groups(&self) -> Vec<StoreGroup> {
        let mut by_store: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for r in &self.records {
            by_store.entry(r.store.as_str()).or_default().push(r.sales);
        }
        by_store
            .into_iter()
            .map(|(store, values)| StoreGroup {
                store: store.to_string(),
                values,
            })
            .collect()
    }

    /// Records of one store in table order.
    pub fn store_records<'a>(&'a self, store: &'a str) -> impl Iterator<Item = &'a SalesRecord> + 'a {
        self.records.iter().filter(move |r| r.store == store)
    }

    /// Sales of one store grouped by calendar month, in month order.
    ///
    /// Records without a readable date are left out.
    pub fn monthly(&self, store: &str) -> Vec<(MonthPeriod, Vec<f64>)> {
        let mut by_month: BTreeMap<MonthPeriod, Vec<f64>> = BTreeMap::new();
        for r in self.store_records(store) {
            if let Some(date) = r.date {
                by_month.entry(MonthPeriod::of(date)).or_default().push(r.sales);
            }
        }
        by_month.into_iter().collect()
    }

    /// Number of records of `store` whose date could not be read.
    pub fn undated(&self, store: &str) -> usize {
        self.store_records(store).filter(|r| r.date.is_none()).count()
    }

    /// Sales values and store labels as parallel vectors, in table order.
    pub fn columns(&self) -> (Vec<f64>, Vec<&str>) {
        self.records
            .iter()
            .map(|r| (r.sales, r.store.as_str()))
            .unzip()
    }
}
