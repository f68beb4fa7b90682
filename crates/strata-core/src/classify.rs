//! Stratum classification of a single element against one profile.

use crate::horizon::is_absent;

/// Unit index of an element with vertical coordinate `mean_z`, given the
/// boundary sequence of its profile (shallowest first).
///
/// Scans from boundary 0 and advances while `mean_z < boundary` or the
/// boundary is absent. Returns the index of the first present boundary with
/// `mean_z >= boundary`, or `boundaries.len()` (the deepest unit) when there
/// is none. The comparison is literal: with z increasing upward, boundaries
/// listed shallow to deep are decreasing elevations.
pub fn classify(mean_z: f64, boundaries: &[f64]) -> usize {
    let mut i = 0;
    while i < boundaries.len() && (mean_z < boundaries[i] || is_absent(boundaries[i])) {
        i += 1;
    }
    i
}
