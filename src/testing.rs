//! Hypothesis tests used to check the assumptions of a one-way ANOVA.
//!
//! - [`one_way_anova`] — classic between/within decomposition over raw groups
//! - [`levene_test`] — homogeneity of variance (Brown-Forsythe median variant)
//! - [`shapiro_wilk_test`] — normality (Royston's AS R94 approximation)
//!
//! # Examples
//!
//! ```
//! use u_anova::testing::{levene_test, shapiro_wilk_test};
//!
//! let g1 = [4.9, 5.0, 5.0, 5.1, 5.0];
//! let g2 = [0.0, 3.0, 5.0, 7.0, 10.0];
//! let r = levene_test(&[&g1, &g2]).unwrap();
//! assert!(r.p_value < 0.05);
//!
//! let sw = shapiro_wilk_test(&[-1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5]).unwrap();
//! assert!(sw.p_value > 0.05);
//! ```

use u_numflow::special;
use u_numflow::stats;

/// Result of an F-type hypothesis test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    /// Test statistic.
    pub statistic: f64,
    /// Numerator degrees of freedom.
    pub df1: f64,
    /// Denominator degrees of freedom.
    pub df2: f64,
    /// Upper-tail p-value.
    pub p_value: f64,
}

/// Result of the Shapiro-Wilk normality test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapiroWilkResult {
    /// The W statistic (0 < W ≤ 1). Values close to 1 suggest normality.
    pub w: f64,
    /// Small values reject the null hypothesis of normality.
    pub p_value: f64,
    /// `true` above [`SW_MAX_EXACT_N`] observations, where Royston's p-value
    /// approximation is no longer calibrated. W itself is still valid.
    pub approximate_p: bool,
}

/// Between/within decomposition of raw groups.
#[derive(Debug, Clone, PartialEq)]
pub struct OneWayAnova {
    pub ss_between: f64,
    pub ss_within: f64,
    pub df_between: usize,
    pub df_within: usize,
    pub f_statistic: f64,
    pub p_value: f64,
    pub group_means: Vec<f64>,
    pub grand_mean: f64,
}

/// Relative tolerance under which a sum of squares counts as zero.
pub(crate) const SS_ZERO_REL: f64 = 1e-20;

/// F statistic and upper-tail p-value from mean squares.
///
/// - No variation at all (both mean squares zero): F = 0, p = 1.
/// - No within-group variation but distinct means: F = +∞, p = 0.
pub(crate) fn f_test(ms_between: f64, ms_within: f64, scale: f64, df1: f64, df2: f64) -> (f64, f64) {
    let tol = scale.max(1.0) * SS_ZERO_REL;
    let between_zero = ms_between <= tol;
    let within_zero = ms_within <= tol;
    match (between_zero, within_zero) {
        (true, _) => (0.0, 1.0),
        (false, true) => (f64::INFINITY, 0.0),
        (false, false) => {
            let f = ms_between / ms_within;
            let p = 1.0 - special::f_distribution_cdf(f, df1, df2);
            (f, p.clamp(0.0, 1.0))
        }
    }
}

/// One-way ANOVA on raw groups: H₀: all group means are equal.
///
/// # Algorithm
///
/// SS_between = Σ nᵢ (x̄ᵢ - x̄)², SS_within = Σ Σ (xᵢⱼ - x̄ᵢ)²,
/// F = [SS_between / (k-1)] / [SS_within / (N-k)].
///
/// # Returns
///
/// `None` if fewer than 2 groups, any group is empty, N ≤ k, or any value
/// is non-finite.
///
/// # References
///
/// Fisher (1925). "Statistical Methods for Research Workers".
pub fn one_way_anova(groups: &[&[f64]]) -> Option<OneWayAnova> {
    let k = groups.len();
    if k < 2 {
        return None;
    }
    if groups
        .iter()
        .any(|g| g.is_empty() || g.iter().any(|v| !v.is_finite()))
    {
        return None;
    }

    let n: usize = groups.iter().map(|g| g.len()).sum();
    if n <= k {
        return None;
    }

    let group_means: Vec<f64> = groups
        .iter()
        .map(|g| stats::mean(g))
        .collect::<Option<_>>()?;
    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    let mut scale = 0.0;
    for (g, &m) in groups.iter().zip(&group_means) {
        ss_between += g.len() as f64 * (m - grand_mean).powi(2);
        ss_within += g.iter().map(|&x| (x - m).powi(2)).sum::<f64>();
        scale += g.iter().map(|&x| x * x).sum::<f64>();
    }

    let df_between = k - 1;
    let df_within = n - k;
    let (f_statistic, p_value) = f_test(
        ss_between / df_between as f64,
        ss_within / df_within as f64,
        scale,
        df_between as f64,
        df_within as f64,
    );

    Some(OneWayAnova {
        ss_between,
        ss_within,
        df_between,
        df_within,
        f_statistic,
        p_value,
        group_means,
        grand_mean,
    })
}

/// Levene test for equality of variances: H₀: all groups have equal variance.
///
/// Uses the median-centred (Brown-Forsythe) variant, which stays robust
/// when the data are not normal.
///
/// # Algorithm
///
/// 1. zᵢⱼ = |xᵢⱼ - median(groupᵢ)|
/// 2. One-way ANOVA on the zᵢⱼ
///
/// # Returns
///
/// `None` if fewer than 2 groups, any group has fewer than 2 observations,
/// or non-finite values.
///
/// # References
///
/// - Levene (1960). "Robust tests for equality of variances". In
///   Olkin (Ed.), Contributions to Probability and Statistics.
/// - Brown & Forsythe (1974). "Robust tests for the equality of variances".
///   JASA, 69(346), 364–367.
pub fn levene_test(groups: &[&[f64]]) -> Option<TestResult> {
    if groups.len() < 2 || groups.iter().any(|g| g.len() < 2) {
        return None;
    }
    if groups.iter().any(|g| g.iter().any(|v| !v.is_finite())) {
        return None;
    }

    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let median = stats::median(g)?;
            Some(g.iter().map(|&x| (x - median).abs()).collect())
        })
        .collect::<Option<_>>()?;

    let refs: Vec<&[f64]> = deviations.iter().map(Vec::as_slice).collect();
    let anova = one_way_anova(&refs)?;

    Some(TestResult {
        statistic: anova.f_statistic,
        df1: anova.df_between as f64,
        df2: anova.df_within as f64,
        p_value: anova.p_value,
    })
}

// ---------------------------------------------------------------------------
// Shapiro-Wilk
// ---------------------------------------------------------------------------

/// Shapiro-Wilk normality test: H₀: data is normally distributed.
///
/// # Algorithm
///
/// Royston (1992, 1995), AS R94:
/// 1. Approximate the coefficients aᵢ from Blom's normal scores
/// 2. W = (Σ aᵢ (x₍ₙ₊₁₋ᵢ₎ - x₍ᵢ₎))² / Σ (xᵢ - x̄)²
/// 3. Normalise log(1 - W) and read the p-value off the upper normal tail
///
/// n = 3 uses the exact distribution. Samples larger than
/// [`SW_MAX_EXACT_N`] are still tested, with `approximate_p` set.
///
/// # Returns
///
/// `None` if n < 3, all values identical, or non-finite values.
///
/// # References
///
/// - Shapiro & Wilk (1965). "An analysis of variance test for normality".
///   Biometrika, 52(3–4), 591–611.
/// - Royston (1992). "Approximating the Shapiro-Wilk W-test for
///   non-normality". Statistics and Computing, 2, 117–119.
/// - Royston (1995). "Remark AS R94: A remark on Algorithm AS 181".
///   Applied Statistics, 44(4), 547–551.
pub fn shapiro_wilk_test(data: &[f64]) -> Option<ShapiroWilkResult> {
    let n = data.len();
    if n < 3 || data.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mut x = data.to_vec();
    x.sort_by(f64::total_cmp);
    if x[n - 1] - x[0] < 1e-300 {
        return None;
    }

    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|&v| (v - mean).powi(2)).sum();
    if ss < 1e-300 {
        return None;
    }

    if n == 3 {
        let a = std::f64::consts::FRAC_1_SQRT_2;
        let w = ((a * (x[2] - x[0])).powi(2) / ss).clamp(0.75, 1.0);
        let p = 1.0 - (6.0 / std::f64::consts::PI) * w.sqrt().acos();
        return Some(ShapiroWilkResult {
            w,
            p_value: p.clamp(0.0, 1.0),
            approximate_p: false,
        });
    }

    let a = sw_coefficients(n)?;
    let numerator: f64 = a
        .iter()
        .enumerate()
        .map(|(i, &ai)| ai * (x[n - 1 - i] - x[i]))
        .sum();
    let w = numerator * numerator / ss;
    if !(0.0..=1.0 + 1e-10).contains(&w) {
        return None;
    }
    let w = w.min(1.0);

    Some(ShapiroWilkResult {
        w,
        p_value: sw_p_value(w, n).clamp(0.0, 1.0),
        approximate_p: n > SW_MAX_EXACT_N,
    })
}

/// Largest sample for which the AS R94 p-value is calibrated.
pub const SW_MAX_EXACT_N: usize = 5000;

// Royston polynomial coefficients (AS R94)
const SW_C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const SW_C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const SW_C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const SW_C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const SW_C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const SW_C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const SW_G: [f64; 2] = [-2.273, 0.459];

// c[0] + c[1]·x + c[2]·x² + ... (Horner)
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

// Upper-half coefficients a₁..a_{n/2} (a₁ pairs the extremes).
fn sw_coefficients(n: usize) -> Option<Vec<f64>> {
    let half = n / 2;
    let nf = n as f64;

    let m: Vec<f64> = (1..=half)
        .map(|i| -special::inverse_normal_cdf((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let a1 = poly(&SW_C1, rsn) + m[0] / ssumm2;
    let mut a = vec![0.0; half];

    // n ≤ 5 corrects one coefficient, larger samples correct two.
    let corrected = if n <= 5 { 1 } else { 2 };
    let (fac_sq, one_minus) = if corrected == 1 {
        (summ2 - 2.0 * m[0] * m[0], 1.0 - 2.0 * a1 * a1)
    } else {
        let a2 = poly(&SW_C2, rsn) + m[1] / ssumm2;
        a[1] = a2;
        (
            summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1],
            1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2,
        )
    };
    if fac_sq <= 0.0 || one_minus <= 0.0 {
        return None;
    }
    let fac = (fac_sq / one_minus).sqrt();
    a[0] = a1;
    for i in corrected..half {
        a[i] = m[i] / fac;
    }
    Some(a)
}

fn sw_p_value(w: f64, n: usize) -> f64 {
    let nf = n as f64;
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return 1.0;
    }
    let y = w1.ln();

    let (z_input, mu, sigma) = if n <= 11 {
        let gamma = poly(&SW_G, nf);
        if y >= gamma {
            return 0.0;
        }
        (-(gamma - y).ln(), poly(&SW_C3, nf), poly(&SW_C4, nf).exp())
    } else {
        let ln_n = nf.ln();
        (y, poly(&SW_C5, ln_n), poly(&SW_C6, ln_n).exp())
    };
    if sigma < 1e-300 {
        return 0.0;
    }
    1.0 - special::standard_normal_cdf((z_input - mu) / sigma)
}
