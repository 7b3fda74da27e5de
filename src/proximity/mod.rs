//! Proximity filtering: keep only features that have a neighbour within a threshold.
//!
//! Two implementations share one contract. Given records and a threshold in
//! kilometers, the output holds every record that is within the threshold of at
//! least one *other* record, each exactly once, in input order. Isolated records
//! are dropped.

mod index;
mod scan;

pub use index::ProximityIndex;
pub use scan::filter_proximate;

use serde::Deserialize;

use crate::models::LocationRecord;

/// Which algorithm decides proximity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProximityStrategy {
    /// O(n²) scan over every unordered pair
    #[default]
    AllPairs,
    /// R-tree candidate search plus exact distance check
    Indexed,
}

impl ProximityStrategy {
    /// Pick the indexed strategy once the record count exceeds `index_above`
    pub fn for_len(len: usize, index_above: usize) -> Self {
        if len > index_above {
            ProximityStrategy::Indexed
        } else {
            ProximityStrategy::AllPairs
        }
    }

    pub fn apply(&self, records: &[LocationRecord], threshold_km: f64) -> Vec<LocationRecord> {
        match self {
            ProximityStrategy::AllPairs => filter_proximate(records, threshold_km),
            ProximityStrategy::Indexed => {
                ProximityIndex::build(records).filter_proximate(threshold_km)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, OsmType};

    fn record(id: i64, lat: f64, lon: f64) -> LocationRecord {
        LocationRecord::new(
            Coordinate::new(lat, lon).unwrap(),
            format!("place {}", id),
            "parks",
            OsmType::Node,
            id,
        )
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(ProximityStrategy::for_len(10, 256), ProximityStrategy::AllPairs);
        assert_eq!(ProximityStrategy::for_len(256, 256), ProximityStrategy::AllPairs);
        assert_eq!(ProximityStrategy::for_len(257, 256), ProximityStrategy::Indexed);
    }

    #[test]
    fn test_strategies_agree() {
        // Deterministic scatter over roughly 1 km around Evanston
        let mut records = Vec::new();
        let mut seed: u64 = 7;
        for id in 0..200 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let dlat = ((seed >> 33) % 1000) as f64 / 100_000.0;
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let dlon = ((seed >> 33) % 1000) as f64 / 100_000.0;
            records.push(record(id, 42.05 + dlat, -87.70 + dlon));
        }

        for threshold in [0.0, 0.01, 0.05, 0.0947, 0.5] {
            let scan = ProximityStrategy::AllPairs.apply(&records, threshold);
            let indexed = ProximityStrategy::Indexed.apply(&records, threshold);
            assert_eq!(scan, indexed, "threshold {}", threshold);
        }
    }
}
