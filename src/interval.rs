//! t-based confidence intervals on monthly mean sales.
//!
//! For a month with n ≥ 2 observations and a positive sample standard
//! deviation s, the interval at confidence c is
//!
//! x̄ ± t_{(1+c)/2, n−1} · s/√n
//!
//! Months that do not meet those conditions are kept in the output but
//! marked as lacking data instead of carrying an interval.

use crate::data::{GroupStatistics, MonthPeriod};
use crate::distribution::t_quantile;

/// Interval at one confidence level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    /// Confidence level in (0, 1), e.g. 0.95.
    pub level: f64,
    /// Two-sided t critical value.
    pub t_critical: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Intervals for one month.
#[derive(Debug, Clone, PartialEq)]
pub enum MonthlyEstimate {
    /// Enough observations: one interval per requested level, in order.
    Intervals {
        standard_error: f64,
        intervals: Vec<ConfidenceInterval>,
    },
    /// Fewer than 2 observations, or a missing/zero standard deviation.
    InsufficientData,
}

/// Summary and intervals of one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyInterval {
    pub period: MonthPeriod,
    pub stats: GroupStatistics,
    pub estimate: MonthlyEstimate,
}

impl MonthlyInterval {
    pub fn has_interval(&self) -> bool {
        matches!(self.estimate, MonthlyEstimate::Intervals { .. })
    }
}

/// Confidence intervals on the mean at each of `levels`.
///
/// # Returns
///
/// `None` when the group has fewer than 2 observations, a missing or zero
/// standard deviation, or a level outside (0, 1).
///
/// # Examples
///
/// ```
/// use u_anova::data::GroupStatistics;
/// use u_anova::interval::mean_intervals;
///
/// let stats = GroupStatistics::from_values(&[98.0, 102.0, 100.0, 101.0, 99.0]).unwrap();
/// let (se, cis) = mean_intervals(&stats, &[0.95, 0.99]).unwrap();
/// assert!((se - 0.7071).abs() < 1e-4);
/// assert!(cis[1].width() > cis[0].width());
/// ```
pub fn mean_intervals(
    stats: &GroupStatistics,
    levels: &[f64],
) -> Option<(f64, Vec<ConfidenceInterval>)> {
    if stats.count < 2 {
        return None;
    }
    let sd = stats.std_dev.filter(|s| s.is_finite() && *s > 0.0)?;
    let n = stats.count as f64;
    let se = sd / n.sqrt();
    let df = n - 1.0;

    let intervals = levels
        .iter()
        .map(|&level| {
            if !(level > 0.0 && level < 1.0) {
                return None;
            }
            let t_critical = t_quantile(0.5 + level / 2.0, df)?;
            Some(ConfidenceInterval {
                level,
                t_critical,
                lower: stats.mean - t_critical * se,
                upper: stats.mean + t_critical * se,
            })
        })
        .collect::<Option<Vec<_>>>()?;
    Some((se, intervals))
}

/// Summarises every month and attaches intervals where the data allow.
pub fn monthly_intervals(
    months: &[(MonthPeriod, Vec<f64>)],
    levels: &[f64],
) -> Vec<MonthlyInterval> {
    months
        .iter()
        .filter_map(|(period, values)| {
            let stats = GroupStatistics::from_values(values)?;
            let estimate = match mean_intervals(&stats, levels) {
                Some((standard_error, intervals)) => MonthlyEstimate::Intervals {
                    standard_error,
                    intervals,
                },
                None => MonthlyEstimate::InsufficientData,
            };
            Some(MonthlyInterval {
                period: *period,
                stats,
                estimate,
            })
        })
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn ninety_nine_is_at_least_as_wide_as_ninety_five(
            values in proptest::collection::vec(0.0_f64..1e5, 2..=31),
        ) {
            let stats = GroupStatistics::from_values(&values).expect("stats");
            if let Some((_, cis)) = mean_intervals(&stats, &[0.95, 0.99]) {
                prop_assert!(cis[1].width() >= cis[0].width());
                prop_assert!(cis[1].lower <= cis[0].lower);
                prop_assert!(cis[1].upper >= cis[0].upper);
            }
        }
    }
}
