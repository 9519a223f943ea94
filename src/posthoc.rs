//! Tukey's honestly significant difference (HSD) test.
//!
//! All k(k−1)/2 pairwise mean comparisons with the family-wise error rate
//! controlled through the studentized range distribution. Unequal group
//! sizes use the Tukey-Kramer standard error.
//!
//! # Pair convention
//!
//! Groups are ordered by label; each pair is (group1, group2) with
//! group1 < group2 and `mean_diff = mean(group2) − mean(group1)`.
//!
//! # References
//!
//! - Tukey (1953). "The problem of multiple comparisons". Unpublished
//!   manuscript, Princeton University.
//! - Kramer (1956). "Extension of multiple range tests to group means with
//!   unequal numbers of replications". Biometrics, 12(3), 307–310.

use crate::distribution::{studentized_range_cdf, studentized_range_quantile};

/// One pairwise comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct TukeyPair {
    pub group1: String,
    pub group2: String,
    /// mean(group2) − mean(group1).
    pub mean_diff: f64,
    /// Family-wise adjusted p-value.
    pub p_adj: f64,
    /// Lower bound of the simultaneous confidence interval for `mean_diff`.
    pub lower: f64,
    /// Upper bound of the simultaneous confidence interval for `mean_diff`.
    pub upper: f64,
    /// `true` iff `p_adj < alpha`.
    pub reject: bool,
}

impl TukeyPair {
    /// `true` if this pair compares `a` and `b`, in either order.
    pub fn involves(&self, a: &str, b: &str) -> bool {
        (self.group1 == a && self.group2 == b) || (self.group1 == b && self.group2 == a)
    }
}

/// Result of Tukey's HSD over all store pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct TukeyHsd {
    pub alpha: f64,
    /// Number of groups.
    pub k: usize,
    /// Error degrees of freedom, N − k.
    pub df: usize,
    /// Pooled within-group variance (MSE).
    pub mse: f64,
    /// Studentized range quantile at 1 − alpha.
    pub q_critical: f64,
    pub pairs: Vec<TukeyPair>,
}

impl TukeyHsd {
    /// Looks up the comparison between `a` and `b` regardless of order.
    pub fn find(&self, a: &str, b: &str) -> Option<&TukeyPair> {
        self.pairs.iter().find(|p| p.involves(a, b))
    }

    /// Pairs whose difference is significant at `alpha`.
    pub fn rejected(&self) -> impl Iterator<Item = &TukeyPair> {
        self.pairs.iter().filter(|p| p.reject)
    }
}

/// Runs Tukey's HSD on labelled groups.
///
/// # Algorithm
///
/// For groups i < j (by label):
/// - SE = √(MSE/2 · (1/nᵢ + 1/nⱼ))
/// - q = |x̄ⱼ − x̄ᵢ| / SE, p_adj = P(Q_{k, N−k} > q)
/// - interval = (x̄ⱼ − x̄ᵢ) ± q_{1−α} · SE
///
/// When MSE is zero a non-zero difference gets p = 0 and a zero difference
/// p = 1.
///
/// # Returns
///
/// `None` if fewer than 2 groups, an empty group, duplicate labels,
/// N − k < 2, alpha ∉ (0, 1), or non-finite values.
///
/// # Examples
///
/// ```
/// use u_anova::posthoc::tukey_hsd;
///
/// let a = [10.0, 11.0, 9.0, 10.5];
/// let b = [10.2, 9.8, 10.9, 10.1];
/// let c = [15.0, 16.0, 14.5, 15.5];
/// let hsd = tukey_hsd(&[("a", &a), ("b", &b), ("c", &c)], 0.05).unwrap();
/// assert_eq!(hsd.pairs.len(), 3);
/// assert!(!hsd.find("a", "b").unwrap().reject);
/// assert!(hsd.find("c", "a").unwrap().reject);
/// ```
pub fn tukey_hsd(groups: &[(&str, &[f64])], alpha: f64) -> Option<TukeyHsd> {
    let k = groups.len();
    if k < 2 || !(alpha > 0.0 && alpha < 1.0) {
        return None;
    }
    if groups
        .iter()
        .any(|(_, g)| g.is_empty() || g.iter().any(|v| !v.is_finite()))
    {
        return None;
    }

    let mut sorted: Vec<(&str, &[f64])> = groups.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    if sorted.windows(2).any(|w| w[0].0 == w[1].0) {
        return None;
    }

    let n: usize = sorted.iter().map(|(_, g)| g.len()).sum();
    if n < k + 2 {
        return None;
    }
    let df = n - k;

    let means: Vec<f64> = sorted
        .iter()
        .map(|(_, g)| g.iter().sum::<f64>() / g.len() as f64)
        .collect();
    let ss_within: f64 = sorted
        .iter()
        .zip(&means)
        .map(|((_, g), &m)| g.iter().map(|&x| (x - m).powi(2)).sum::<f64>())
        .sum();
    let mse = ss_within / df as f64;

    let (kf, dff) = (k as f64, df as f64);
    let q_critical = studentized_range_quantile(1.0 - alpha, kf, dff)?;

    let mut pairs = Vec::with_capacity(k * (k - 1) / 2);
    for i in 0..k {
        for j in (i + 1)..k {
            let (ni, nj) = (sorted[i].1.len() as f64, sorted[j].1.len() as f64);
            let mean_diff = means[j] - means[i];
            let se = (mse / 2.0 * (1.0 / ni + 1.0 / nj)).sqrt();

            let scale = means[i].abs().max(means[j].abs()).max(1.0);
            let p_adj = if se > 0.0 {
                let q = mean_diff.abs() / se;
                1.0 - studentized_range_cdf(q, kf, dff)?
            } else if mean_diff.abs() > 1e-12 * scale {
                0.0
            } else {
                1.0
            };
            let p_adj = p_adj.clamp(0.0, 1.0);

            pairs.push(TukeyPair {
                group1: sorted[i].0.to_string(),
                group2: sorted[j].0.to_string(),
                mean_diff,
                p_adj,
                lower: mean_diff - q_critical * se,
                upper: mean_diff + q_critical * se,
                reject: p_adj < alpha,
            });
        }
    }

    Some(TukeyHsd {
        alpha,
        k,
        df,
        mse,
        q_critical,
        pairs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_follow_label_order() {
        let z = [5.0, 6.0, 7.0];
        let a = [1.0, 2.0, 3.0];
        let m = [3.0, 4.0, 5.0];
        let hsd = tukey_hsd(&[("z", &z), ("a", &a), ("m", &m)], 0.05).expect("should compute");
        let order: Vec<(&str, &str)> = hsd
            .pairs
            .iter()
            .map(|p| (p.group1.as_str(), p.group2.as_str()))
            .collect();
        assert_eq!(order, vec![("a", "m"), ("a", "z"), ("m", "z")]);
        // group2 − group1
        let az = hsd.find("z", "a").expect("pair");
        assert!((az.mean_diff - 4.0).abs() < 1e-12);
    }

    #[test]
    fn matches_reference_values() {
        // Balanced design, k = 3, n = 5 each, MSE = 2.5, df = 12
        let a = [10.0, 12.0, 11.0, 9.0, 13.0];
        let b = [14.0, 16.0, 15.0, 13.0, 17.0];
        let c = [10.5, 12.5, 11.5, 9.5, 13.5];
        let hsd = tukey_hsd(&[("a", &a), ("b", &b), ("c", &c)], 0.05).expect("should compute");
        assert_eq!(hsd.df, 12);
        assert!((hsd.mse - 2.5).abs() < 1e-12);
        assert!((hsd.q_critical - 3.773).abs() < 5e-3, "q_crit = {}", hsd.q_critical);

        let ab = hsd.find("a", "b").expect("pair");
        // SE = √(2.5/5) ≈ 0.7071, q = 4/0.7071 ≈ 5.657
        assert!(ab.reject);
        assert!(ab.p_adj < 0.01, "p = {}", ab.p_adj);
        let half_width = hsd.q_critical * (0.5_f64).sqrt();
        assert!((ab.upper - ab.lower - 2.0 * half_width).abs() < 1e-9);

        let ac = hsd.find("a", "c").expect("pair");
        assert!(!ac.reject);
        assert!(ac.p_adj > 0.7, "p = {}", ac.p_adj);
        assert!(ac.lower < 0.0 && ac.upper > 0.0);
    }

    #[test]
    fn interval_excludes_zero_iff_rejected() {
        let a = [1.0, 2.0, 3.0, 2.0];
        let b = [2.5, 3.5, 2.0, 3.0];
        let c = [6.0, 7.0, 6.5, 8.0];
        let hsd = tukey_hsd(&[("a", &a), ("b", &b), ("c", &c)], 0.05).expect("should compute");
        for p in &hsd.pairs {
            let excludes_zero = p.lower > 0.0 || p.upper < 0.0;
            assert_eq!(excludes_zero, p.reject, "{p:?}");
        }
    }

    #[test]
    fn zero_variance_groups() {
        let a = [1.0, 1.0, 1.0];
        let b = [1.0, 1.0, 1.0];
        let c = [4.0, 4.0, 4.0];
        let hsd = tukey_hsd(&[("a", &a), ("b", &b), ("c", &c)], 0.05).expect("should compute");
        assert_eq!(hsd.find("a", "b").expect("pair").p_adj, 1.0);
        assert_eq!(hsd.find("a", "c").expect("pair").p_adj, 0.0);
        assert_eq!(hsd.rejected().count(), 2);
    }

    #[test]
    fn edge_cases() {
        let a: &[f64] = &[1.0, 2.0];
        let empty: &[f64] = &[];
        let single: &[f64] = &[3.0];
        assert!(tukey_hsd(&[("a", a)], 0.05).is_none());
        assert!(tukey_hsd(&[("a", a), ("b", empty)], 0.05).is_none());
        assert!(tukey_hsd(&[("a", a), ("a", a)], 0.05).is_none());
        assert!(tukey_hsd(&[("a", a), ("b", a)], 1.0).is_none());
        // N − k = 1
        assert!(tukey_hsd(&[("a", a), ("b", single)], 0.05).is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn pair_count_and_antisymmetry(
            groups in proptest::collection::vec(
                proptest::collection::vec(-100.0_f64..100.0, 2..=8),
                2..=5,
            )
        ) {
            let labels: Vec<String> = (0..groups.len()).map(|i| format!("t{i}")).collect();
            let input: Vec<(&str, &[f64])> = labels
                .iter()
                .zip(&groups)
                .map(|(l, g)| (l.as_str(), g.as_slice()))
                .collect();
            if let Some(hsd) = tukey_hsd(&input, 0.05) {
                let k = groups.len();
                prop_assert_eq!(hsd.pairs.len(), k * (k - 1) / 2);
                for p in &hsd.pairs {
                    prop_assert!(p.group1 < p.group2);
                    prop_assert!((0.0..=1.0).contains(&p.p_adj));
                    prop_assert!(p.lower <= p.mean_diff && p.mean_diff <= p.upper);
                    prop_assert_eq!(p.reject, p.p_adj < 0.05);
                }
            }
        }
    }
}
