//! R-tree backed proximity filter for larger result sets.

use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};
use tracing::debug;

use crate::distance::{haversine_km, EARTH_RADIUS_KM};
use crate::models::LocationRecord;

/// Indexed point: [lon, lat] with the record's position in the input slice
type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Slack applied to search envelopes so rounding never drops a true neighbour
const ENVELOPE_SLACK: f64 = 1e-9;

/// Spatial index over location records
pub struct ProximityIndex<'a> {
    records: &'a [LocationRecord],
    tree: RTree<IndexedPoint>,
}

impl<'a> ProximityIndex<'a> {
    pub fn build(records: &'a [LocationRecord]) -> Self {
        let points: Vec<IndexedPoint> = records
            .iter()
            .enumerate()
            .map(|(idx, r)| GeomWithData::new([r.coordinate.lon, r.coordinate.lat], idx))
            .collect();

        let tree = RTree::bulk_load(points);
        debug!("Proximity index built with {} entries", tree.size());

        Self { records, tree }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Same contract as [`super::filter_proximate`]
    pub fn filter_proximate(&self, threshold_km: f64) -> Vec<LocationRecord> {
        if !(threshold_km >= 0.0) {
            return Vec::new();
        }

        let mut keep = vec![false; self.records.len()];

        for (i, record) in self.records.iter().enumerate() {
            if keep[i] {
                continue;
            }
            for envelope in search_envelopes(record, threshold_km) {
                let hit = self
                    .tree
                    .locate_in_envelope_intersecting(&envelope)
                    .filter(|p| p.data != i)
                    .find(|p| {
                        let (a, b) = (i.min(p.data), i.max(p.data));
                        haversine_km(self.records[a].coordinate, self.records[b].coordinate)
                            <= threshold_km
                    });

                if let Some(p) = hit {
                    keep[i] = true;
                    keep[p.data] = true;
                    break;
                }
            }
        }

        self.records
            .iter()
            .zip(keep)
            .filter_map(|(r, k)| k.then(|| r.clone()))
            .collect()
    }
}

/// Degree envelopes guaranteed to contain every point within `threshold_km`.
///
/// Returns two envelopes when the search window crosses the antimeridian.
fn search_envelopes(record: &LocationRecord, threshold_km: f64) -> Vec<AABB<[f64; 2]>> {
    let lat = record.coordinate.lat;
    let lon = record.coordinate.lon;

    let angular = threshold_km / EARTH_RADIUS_KM;
    let dlat = angular.to_degrees() * (1.0 + ENVELOPE_SLACK) + ENVELOPE_SLACK;
    let min_lat = (lat - dlat).max(-90.0);
    let max_lat = (lat + dlat).min(90.0);

    // hav(d) >= cos(lat1) * cos(lat2) * hav(dlon), with lat2 bounded by the band
    let far_lat = min_lat.abs().max(max_lat.abs()).to_radians();
    let denom = lat.to_radians().cos() * far_lat.cos();
    let ratio = if denom > 0.0 {
        (angular / 2.0).sin().powi(2) / denom
    } else {
        f64::INFINITY
    };

    if ratio >= 1.0 {
        return vec![AABB::from_corners([-180.0, min_lat], [180.0, max_lat])];
    }

    let dlon = (2.0 * ratio.sqrt().asin()).to_degrees() * (1.0 + ENVELOPE_SLACK) + ENVELOPE_SLACK;
    if dlon >= 180.0 {
        return vec![AABB::from_corners([-180.0, min_lat], [180.0, max_lat])];
    }

    let west = lon - dlon;
    let east = lon + dlon;
    let mut envelopes = vec![AABB::from_corners(
        [west.max(-180.0), min_lat],
        [east.min(180.0), max_lat],
    )];
    if west < -180.0 {
        envelopes.push(AABB::from_corners([west + 360.0, min_lat], [180.0, max_lat]));
    }
    if east > 180.0 {
        envelopes.push(AABB::from_corners([-180.0, min_lat], [east - 360.0, max_lat]));
    }
    envelopes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, OsmType};

    fn record(name: &str, lat: f64, lon: f64) -> LocationRecord {
        LocationRecord::new(
            Coordinate::new(lat, lon).unwrap(),
            name,
            "parks",
            OsmType::Node,
            0,
        )
    }

    fn names(records: &[LocationRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_pair_kept_far_point_dropped() {
        let records = vec![
            record("A", 42.0600, -87.7000),
            record("B", 42.0605, -87.7000),
            record("C", 42.1600, -87.7000),
        ];
        let index = ProximityIndex::build(&records);
        assert_eq!(index.len(), 3);
        assert_eq!(names(&index.filter_proximate(0.0947)), vec!["A", "B"]);
    }

    #[test]
    fn test_isolated_and_empty() {
        let single = vec![record("A", 1.0, 1.0)];
        assert!(ProximityIndex::build(&single).filter_proximate(5.0).is_empty());

        let empty: Vec<LocationRecord> = Vec::new();
        let index = ProximityIndex::build(&empty);
        assert!(index.is_empty());
        assert!(index.filter_proximate(5.0).is_empty());
    }

    #[test]
    fn test_across_antimeridian() {
        // ~22 m apart on either side of 180°
        let records = vec![
            record("East", 0.0, 179.9999),
            record("West", 0.0, -179.9999),
            record("Far", 0.0, 0.0),
        ];
        let kept = ProximityIndex::build(&records).filter_proximate(0.05);
        assert_eq!(names(&kept), vec!["East", "West"]);
    }

    #[test]
    fn test_near_pole() {
        // Same latitude, opposite meridians, ~2.2 km apart through the pole
        let records = vec![record("A", 89.99, 0.0), record("B", 89.99, 180.0)];
        let kept = ProximityIndex::build(&records).filter_proximate(3.0);
        assert_eq!(names(&kept), vec!["A", "B"]);
    }

    #[test]
    fn test_envelope_contains_threshold_circle() {
        let r = record("A", 60.0, 10.0);
        let envelopes = search_envelopes(&r, 1.0);
        assert_eq!(envelopes.len(), 1);
        let lower = envelopes[0].lower();
        let upper = envelopes[0].upper();
        // 1 km is ~0.009° of latitude and ~0.018° of longitude at 60°N
        assert!(upper[1] - 60.0 >= 0.0089);
        assert!(upper[0] - 10.0 >= 0.0179);
        assert!(60.0 - lower[1] >= 0.0089);
        assert!(10.0 - lower[0] >= 0.0179);
    }
}
