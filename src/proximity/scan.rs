//! All-pairs proximity scan.

use crate::distance::haversine_km;
use crate::models::LocationRecord;

/// Keep records with at least one other record within `threshold_km`.
///
/// Records are identified by position, so two distinct features at the same
/// coordinate are both kept (they are within any non-negative threshold).
pub fn filter_proximate(records: &[LocationRecord], threshold_km: f64) -> Vec<LocationRecord> {
    // NaN compares false, so it also selects nothing
    if !(threshold_km >= 0.0) {
        return Vec::new();
    }

    let mut keep = vec![false; records.len()];

    for i in 0..records.len() {
        for j in (i + 1)..records.len() {
            if keep[i] && keep[j] {
                continue;
            }
            if haversine_km(records[i].coordinate, records[j].coordinate) <= threshold_km {
                keep[i] = true;
                keep[j] = true;
            }
        }
    }

    records
        .iter()
        .zip(keep)
        .filter_map(|(r, k)| k.then(|| r.clone()))
        .collect()
}
