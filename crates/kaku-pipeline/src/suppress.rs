//! Greedy spatial non-maximum suppression.
//!
//! Walks the candidates from highest to lowest score and keeps a
//! candidate only if it lies strictly farther than `min_distance` from
//! every candidate already kept. Quadratic in the candidate count.

use tracing::{debug, info};

use crate::types::Corner;

/// Sort candidates by descending score.
///
/// The sort is stable: equal scores keep their scan order.
pub fn sort_by_score(candidates: &mut [Corner]) {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Filter score-sorted `candidates` so no two survivors are within
/// `min_distance` of each other.
///
/// The first (highest-scoring) candidate always survives. An empty
/// input yields an empty output.
#[must_use = "returns the surviving corners"]
pub fn suppress(candidates: &[Corner], min_distance: f64) -> Vec<Corner> {
    let Some(&best) = candidates.first() else {
        info!("no corners found");
        return Vec::new();
    };

    let mut kept = vec![best];
    for &candidate in candidates {
        if kept.iter().all(|k| candidate.distance(*k) > min_distance) {
            kept.push(candidate);
        }
    }

    debug!(
        candidates = candidates.len(),
        survivors = kept.len(),
        min_distance,
        "suppressed"
    );
    kept
}
