//! ANOVA table for a one-factor linear model.
//!
//! With a single categorical factor the Type II sum of squares of the factor
//! equals the reduction in residual SS from the intercept-only model to the
//! full model: SS_factor = SS_total − SS_residual.
//!
//! # References
//!
//! - Langsrud (2003). "ANOVA for unbalanced data: Use Type II instead of
//!   Type III sums of squares". Statistics and Computing, 13, 163–167.
//! - Montgomery (2017). "Design and Analysis of Experiments", 9th ed., ch. 3.

use crate::regression::FactorFit;
use crate::testing::f_test;

/// One row pair (factor, residual) of a Type II ANOVA table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnovaResult {
    pub ss_between: f64,
    pub ss_within: f64,
    pub df_between: usize,
    pub df_within: usize,
    pub ms_between: f64,
    pub ms_within: f64,
    /// `+∞` when groups differ but have no spread; `0` when nothing varies.
    pub f_statistic: f64,
    /// P(F(df_between, df_within) > f_statistic).
    pub p_value: f64,
}

impl AnovaResult {
    /// `true` iff the equal-means hypothesis is rejected, i.e. p < alpha.
    ///
    /// The comparison is strict: p exactly equal to alpha does not reject.
    pub fn rejects_null(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Builds the ANOVA table from a one-factor fit.
///
/// # Returns
///
/// `None` if the fit has fewer than 2 levels.
///
/// # Examples
///
/// ```
/// use u_anova::anova::anova_type2;
/// use u_anova::regression::fit_one_factor;
///
/// let y = [10.0, 11.0, 12.0, 20.0, 21.0, 22.0, 30.0, 31.0, 32.0];
/// let labels = ["a", "a", "a", "b", "b", "b", "c", "c", "c"];
/// let fit = fit_one_factor(&y, &labels).unwrap();
/// let table = anova_type2(&fit).unwrap();
/// assert_eq!((table.df_between, table.df_within), (2, 6));
/// assert!((table.f_statistic - 300.0).abs() < 1e-6);
/// assert!(table.rejects_null(0.05));
/// ```
pub fn anova_type2(fit: &FactorFit) -> Option<AnovaResult> {
    let k = fit.k();
    if k < 2 {
        return None;
    }
    let df_between = k - 1;
    let df_within = fit.df_residual();

    let ss_between = fit.ss_model();
    let ss_within = fit.ss_residual.max(0.0);
    let ms_between = ss_between / df_between as f64;
    let ms_within = ss_within / df_within as f64;

    let (f_statistic, p_value) = f_test(
        ms_between,
        ms_within,
        fit.sum_sq_y,
        df_between as f64,
        df_within as f64,
    );

    Some(AnovaResult {
        ss_between,
        ss_within,
        df_between,
        df_within,
        ms_between,
        ms_within,
        f_statistic,
        p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::fit_one_factor;
    use crate::testing::one_way_anova;

    #[test]
    fn matches_classic_one_way_anova() {
        let a = [23.0, 25.0, 21.0, 22.0];
        let b = [30.0, 28.0, 33.0];
        let c = [19.0, 20.0, 18.0, 24.0, 21.0];
        let y: Vec<f64> = a.iter().chain(&b).chain(&c).copied().collect();
        let labels: Vec<&str> = std::iter::repeat("a")
            .take(a.len())
            .chain(std::iter::repeat("b").take(b.len()))
            .chain(std::iter::repeat("c").take(c.len()))
            .collect();

        let fit = fit_one_factor(&y, &labels).expect("should fit");
        let table = anova_type2(&fit).expect("should compute");
        let classic = one_way_anova(&[&a, &b, &c]).expect("should compute");

        assert_eq!(table.df_between, classic.df_between);
        assert_eq!(table.df_within, classic.df_within);
        assert!((table.ss_between - classic.ss_between).abs() < 1e-8);
        assert!((table.ss_within - classic.ss_within).abs() < 1e-8);
        assert!((table.f_statistic - classic.f_statistic).abs() < 1e-8);
        assert!((table.p_value - classic.p_value).abs() < 1e-10);
    }

    #[test]
    fn identical_stores_give_zero_f() {
        let y = [100.0; 9];
        let labels = ["x", "x", "x", "y", "y", "y", "z", "z", "z"];
        let fit = fit_one_factor(&y, &labels).expect("should fit");
        let table = anova_type2(&fit).expect("should compute");
        assert_eq!(table.f_statistic, 0.0);
        assert_eq!(table.p_value, 1.0);
        assert!(!table.rejects_null(0.05));
    }

    #[test]
    fn constant_but_distinct_groups_give_infinite_f() {
        let y = [1.0, 1.0, 5.0, 5.0];
        let labels = ["a", "a", "b", "b"];
        let fit = fit_one_factor(&y, &labels).expect("should fit");
        let table = anova_type2(&fit).expect("should compute");
        assert!(table.f_statistic.is_infinite());
        assert_eq!(table.p_value, 0.0);
        assert!(table.rejects_null(0.05));
    }

    #[test]
    fn boundary_p_equal_to_alpha_does_not_reject() {
        let table = AnovaResult {
            ss_between: 1.0,
            ss_within: 1.0,
            df_between: 1,
            df_within: 1,
            ms_between: 1.0,
            ms_within: 1.0,
            f_statistic: 1.0,
            p_value: 0.05,
        };
        assert!(!table.rejects_null(0.05));
        assert!(table.rejects_null(0.050_000_1));
    }

    #[test]
    fn single_level_has_no_table() {
        let fit = fit_one_factor(&[1.0, 2.0, 3.0], &["a", "a", "a"]).expect("should fit");
        assert!(anova_type2(&fit).is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::regression::fit_one_factor;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn p_value_decreases_in_f(
            base in proptest::collection::vec(-10.0_f64..10.0, 4..=10),
            shift1 in 0.5_f64..5.0,
            extra in 0.5_f64..5.0,
        ) {
            // Same residual structure, larger separation between the two groups
            let n = base.len();
            let labels: Vec<&str> = (0..n).map(|i| if i < n / 2 { "a" } else { "b" }).collect();
            let y_at = |shift: f64| -> Vec<f64> {
                base.iter()
                    .enumerate()
                    .map(|(i, &v)| if i < n / 2 { v } else { v + shift })
                    .collect()
            };
            let t1 = fit_one_factor(&y_at(shift1), &labels).and_then(|f| anova_type2(&f));
            let t2 = fit_one_factor(&y_at(shift1 + extra), &labels).and_then(|f| anova_type2(&f));
            if let (Some(t1), Some(t2)) = (t1, t2) {
                // p saturates at zero in the far tail; compare only above it
                let separated = t2.f_statistic > 1.01 * t1.f_statistic + 1e-6;
                if t1.f_statistic.is_finite() && separated && t1.p_value > 1e-10 {
                    prop_assert!(t2.p_value < t1.p_value,
                        "F {} -> {} but p {} -> {}", t1.f_statistic, t2.f_statistic, t1.p_value, t2.p_value);
                }
            }
        }

        #[test]
        fn sums_of_squares_are_non_negative(
            values in proptest::collection::vec(0.0_f64..1e4, 6..=30),
        ) {
            let labels: Vec<&str> = (0..values.len()).map(|i| ["p", "q", "r"][i % 3]).collect();
            if let Some(t) = fit_one_factor(&values, &labels).and_then(|f| anova_type2(&f)) {
                prop_assert!(t.ss_between >= 0.0);
                prop_assert!(t.ss_within >= 0.0);
                prop_assert!((0.0..=1.0).contains(&t.p_value));
            }
        }
    }
}
