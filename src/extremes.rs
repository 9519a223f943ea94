//! Highest- versus lowest-average store.
//!
//! Ranks stores by mean sales and, when the omnibus test was significant,
//! pulls the Tukey comparison of the two extremes out of the post-hoc table.
//! The pair is located by store label, and its `mean_diff` is negated when
//! the table stores it as (bottom, top).

use crate::data::StoreGroup;
use crate::posthoc::TukeyHsd;

/// Mean sales of one store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreMean {
    pub store: String,
    pub mean: f64,
    pub count: usize,
}

/// Outcome of the pairwise check between the extreme stores.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtremesVerdict {
    /// The omnibus test was not significant; no pairwise test is run.
    NotPerformed,
    /// The post-hoc table holds no row for the two stores.
    NotFound,
    Compared {
        /// Tukey `mean_diff`, negated when group1 is the bottom store.
        mean_diff: f64,
        p_adj: f64,
        /// `p_adj < alpha`.
        significant: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtremesComparison {
    /// All stores, highest mean first.
    pub ranking: Vec<StoreMean>,
    pub top: StoreMean,
    pub bottom: StoreMean,
    pub verdict: ExtremesVerdict,
}

/// Mean sales per store, sorted descending (ties by label).
///
/// Empty groups are skipped.
pub fn rank_stores(groups: &[StoreGroup]) -> Vec<StoreMean> {
    let mut ranking: Vec<StoreMean> = groups
        .iter()
        .filter(|g| !g.values.is_empty())
        .map(|g| StoreMean {
            store: g.store.clone(),
            mean: g.values.iter().sum::<f64>() / g.values.len() as f64,
            count: g.values.len(),
        })
        .collect();
    ranking.sort_by(|a, b| b.mean.total_cmp(&a.mean).then_with(|| a.store.cmp(&b.store)));
    ranking
}

/// Compares the highest- and lowest-average stores.
///
/// `tukey` should be the post-hoc table when `significant` is `true`; when
/// `significant` is `false` it is ignored and the verdict is
/// [`ExtremesVerdict::NotPerformed`].
///
/// # Returns
///
/// `None` when there is no store to rank.
///
/// # Examples
///
/// ```
/// use u_anova::data::StoreGroup;
/// use u_anova::extremes::{compare_extremes, rank_stores, ExtremesVerdict};
///
/// let groups = vec![
///     StoreGroup { store: "Norte".into(), values: vec![10.0, 12.0] },
///     StoreGroup { store: "Sur".into(), values: vec![30.0, 31.0] },
/// ];
/// let cmp = compare_extremes(rank_stores(&groups), false, None, 0.05).unwrap();
/// assert_eq!(cmp.top.store, "Sur");
/// assert_eq!(cmp.bottom.store, "Norte");
/// assert_eq!(cmp.verdict, ExtremesVerdict::NotPerformed);
/// ```
pub fn compare_extremes(
    ranking: Vec<StoreMean>,
    significant: bool,
    tukey: Option<&TukeyHsd>,
    alpha: f64,
) -> Option<ExtremesComparison> {
    let top = ranking.first()?.clone();
    let bottom = ranking.last()?.clone();

    let verdict = if !significant {
        ExtremesVerdict::NotPerformed
    } else {
        match tukey.and_then(|t| t.find(&top.store, &bottom.store)) {
            Some(pair) => {
                let mean_diff = if pair.group1 == bottom.store {
                    -pair.mean_diff
                } else {
                    pair.mean_diff
                };
                ExtremesVerdict::Compared {
                    mean_diff,
                    p_adj: pair.p_adj,
                    significant: pair.p_adj < alpha,
                }
            }
            None => ExtremesVerdict::NotFound,
        }
    };

    Some(ExtremesComparison {
        ranking,
        top,
        bottom,
        verdict,
    })
}
