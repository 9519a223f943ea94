//! Ordinary least squares on a single categorical factor.
//!
//! Fits y = β₀ + Σⱼ βⱼ·dⱼ + ε where dⱼ is the indicator of level j and the
//! first level (in sorted label order) is the reference absorbed by the
//! intercept. β₀ is the reference level's mean and βⱼ the difference between
//! level j's mean and the reference mean.
//!
//! # Examples
//!
//! ```
//! use u_anova::regression::fit_one_factor;
//!
//! let y = [1.0, 2.0, 3.0, 11.0, 12.0, 13.0];
//! let labels = ["a", "a", "a", "b", "b", "b"];
//! let fit = fit_one_factor(&y, &labels).unwrap();
//! assert_eq!(fit.levels, vec!["a".to_string(), "b".to_string()]);
//! assert!((fit.coefficients[0] - 2.0).abs() < 1e-9);  // mean of "a"
//! assert!((fit.coefficients[1] - 10.0).abs() < 1e-9); // "b" − "a"
//! ```

use std::collections::BTreeMap;

use u_numflow::matrix::Matrix;
use u_numflow::stats;

/// Result of a one-factor OLS fit.
#[derive(Debug, Clone)]
pub struct FactorFit {
    /// Factor levels in sorted order; `levels[0]` is the reference.
    pub levels: Vec<String>,
    /// Observations per level, aligned with `levels`.
    pub level_counts: Vec<usize>,
    /// [β₀, β₁, ..., β_{k-1}] (intercept first).
    pub coefficients: Vec<f64>,
    /// Fitted values ŷᵢ (the level mean of each observation).
    pub fitted: Vec<f64>,
    /// Residuals yᵢ - ŷᵢ.
    pub residuals: Vec<f64>,
    /// Total sum of squares about the grand mean.
    pub ss_total: f64,
    /// Residual sum of squares.
    pub ss_residual: f64,
    /// Σ yᵢ², the magnitude scale used for zero tests on sums of squares.
    pub sum_sq_y: f64,
    /// Number of observations.
    pub n: usize,
}

impl FactorFit {
    /// Number of factor levels.
    pub fn k(&self) -> usize {
        self.levels.len()
    }

    /// Residual degrees of freedom, n - k.
    pub fn df_residual(&self) -> usize {
        self.n - self.k()
    }

    /// Model (explained) sum of squares, SS_total - SS_residual, floored at 0.
    pub fn ss_model(&self) -> f64 {
        (self.ss_total - self.ss_residual).max(0.0)
    }

    /// Estimated mean of every level, aligned with `levels`.
    pub fn level_means(&self) -> Vec<f64> {
        let b0 = self.coefficients[0];
        std::iter::once(b0)
            .chain(self.coefficients[1..].iter().map(|&b| b0 + b))
            .collect()
    }
}

/// Fits `y` on the categorical factor `labels` by OLS.
///
/// # Algorithm
///
/// Builds the treatment-coded design matrix X = [1 | d₁ | ... | d_{k-1}]
/// and solves the normal equations X'Xβ = X'y by Cholesky decomposition.
///
/// # Returns
///
/// `None` if lengths differ, n ≤ k (no residual degrees of freedom), any
/// value is non-finite, or the normal equations are singular.
///
/// # References
///
/// Draper & Smith (1998). "Applied Regression Analysis", 3rd edition, ch. 14
/// (indicator variables).
pub fn fit_one_factor<L: AsRef<str>>(y: &[f64], labels: &[L]) -> Option<FactorFit> {
    let n = y.len();
    if n != labels.len() || n == 0 || y.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for l in labels {
        *counts.entry(l.as_ref()).or_default() += 1;
    }
    let k = counts.len();
    if n <= k {
        return None;
    }
    let column: BTreeMap<&str, usize> = counts.keys().enumerate().map(|(j, &l)| (l, j)).collect();

    // X (n × k, row-major): intercept, then one indicator per non-reference level
    let mut x_data = Vec::with_capacity(n * k);
    for l in labels {
        let j = column[l.as_ref()];
        x_data.push(1.0);
        x_data.extend((1..k).map(|c| if c == j { 1.0 } else { 0.0 }));
    }
    let x_mat = Matrix::new(n, k, x_data).ok()?;

    let xt = x_mat.transpose();
    let xtx = xt.mul_mat(&x_mat).ok()?;
    let xty = xt.mul_vec(y).ok()?;
    let coefficients = xtx.cholesky_solve(&xty).ok()?;

    let fitted = x_mat.mul_vec(&coefficients).ok()?;
    let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(&yi, &fi)| yi - fi).collect();

    let y_mean = stats::mean(y)?;
    let ss_total: f64 = y.iter().map(|&yi| (yi - y_mean).powi(2)).sum();
    let ss_residual: f64 = residuals.iter().map(|r| r * r).sum();
    let sum_sq_y: f64 = y.iter().map(|v| v * v).sum();

    Some(FactorFit {
        levels: counts.keys().map(|l| l.to_string()).collect(),
        level_counts: counts.values().copied().collect(),
        coefficients,
        fitted,
        residuals,
        ss_total,
        ss_residual,
        sum_sq_y,
        n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficients_are_mean_contrasts() {
        let y = [10.0, 12.0, 20.0, 22.0, 24.0, 5.0, 7.0];
        let labels = ["b", "b", "c", "c", "c", "a", "a"];
        let fit = fit_one_factor(&y, &labels).expect("should fit");
        assert_eq!(fit.levels, vec!["a", "b", "c"]);
        assert_eq!(fit.level_counts, vec![2, 2, 3]);
        assert!((fit.coefficients[0] - 6.0).abs() < 1e-9);
        assert!((fit.coefficients[1] - 5.0).abs() < 1e-9);
        assert!((fit.coefficients[2] - 16.0).abs() < 1e-9);
        let means = fit.level_means();
        assert!((means[2] - 22.0).abs() < 1e-9);
    }

    #[test]
    fn fitted_values_are_group_means() {
        let y = [1.0, 3.0, 10.0, 14.0];
        let labels = ["x", "x", "y", "y"];
        let fit = fit_one_factor(&y, &labels).expect("should fit");
        let expected = [2.0, 2.0, 12.0, 12.0];
        for (f, e) in fit.fitted.iter().zip(expected) {
            assert!((f - e).abs() < 1e-9);
        }
        // residuals sum to zero within each level
        assert!((fit.residuals[0] + fit.residuals[1]).abs() < 1e-9);
        assert!((fit.ss_residual - (2.0 + 8.0)).abs() < 1e-9);
        assert_eq!(fit.df_residual(), 2);
    }

    #[test]
    fn decomposition_adds_up() {
        let y = [3.0, 4.0, 5.0, 9.0, 8.0, 10.0, 1.0, 2.0];
        let labels = ["p", "p", "p", "q", "q", "q", "r", "r"];
        let fit = fit_one_factor(&y, &labels).expect("should fit");
        assert!((fit.ss_model() + fit.ss_residual - fit.ss_total).abs() < 1e-8);
    }

    #[test]
    fn single_level_is_intercept_only() {
        let fit = fit_one_factor(&[1.0, 2.0, 3.0], &["a", "a", "a"]).expect("should fit");
        assert_eq!(fit.coefficients.len(), 1);
        assert!((fit.coefficients[0] - 2.0).abs() < 1e-12);
        assert!(fit.ss_model() < 1e-12);
    }

    #[test]
    fn edge_cases() {
        assert!(fit_one_factor::<&str>(&[], &[]).is_none());
        assert!(fit_one_factor(&[1.0, 2.0], &["a"]).is_none());
        assert!(fit_one_factor(&[1.0, 2.0], &["a", "b"]).is_none()); // n = k
        assert!(fit_one_factor(&[1.0, f64::NAN, 2.0], &["a", "a", "b"]).is_none());
    }
}
