//! Geographic value types and the located feature record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when constructing geographic values from untrusted input
#[derive(Debug, Error, PartialEq)]
pub enum CoordinateError {
    #[error("latitude {0} is outside -90..=90")]
    Latitude(f64),
    #[error("longitude {0} is outside -180..=180")]
    Longitude(f64),
    #[error("bounding box minimum exceeds maximum ({0})")]
    InvertedBox(&'static str),
    #[error("bounding box must have 4 comma-separated numbers: \"{0}\"")]
    Malformed(String),
}

/// Type of OSM object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsmType {
    Node,
    Way,
    Relation,
}

impl fmt::Display for OsmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsmType::Node => write!(f, "node"),
            OsmType::Way => write!(f, "way"),
            OsmType::Relation => write!(f, "relation"),
        }
    }
}

/// Geographic point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting values outside the valid geographic range
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::Latitude(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::Longitude(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Create a coordinate from data already known to be in range (provider output)
    pub fn new_unchecked(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(c: Coordinate) -> Self {
        geo::Point::new(c.lon, c.lat)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Rectangular query region, in Overpass order (south, west, north, east)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
    ) -> Result<Self, CoordinateError> {
        Coordinate::new(min_lat, min_lon)?;
        Coordinate::new(max_lat, max_lon)?;
        if min_lat > max_lat {
            return Err(CoordinateError::InvertedBox("latitude"));
        }
        if min_lon > max_lon {
            return Err(CoordinateError::InvertedBox("longitude"));
        }
        Ok(Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new_unchecked(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

/// Parse bbox string "minLat,minLon,maxLat,maxLon"
impl FromStr for BoundingBox {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| CoordinateError::Malformed(s.to_string()))?;

        match parts.as_slice() {
            [min_lat, min_lon, max_lat, max_lon] => {
                Self::new(*min_lat, *min_lon, *max_lat, *max_lon)
            }
            _ => Err(CoordinateError::Malformed(s.to_string())),
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}

/// A named feature extracted from a provider response.
///
/// Lives for a single search: created from the response, filtered, rendered, dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub coordinate: Coordinate,

    /// Display name (the feature's `name` tag)
    pub name: String,

    /// Registry label whose tag filter matched the feature
    pub category: String,

    pub osm_type: OsmType,
    pub osm_id: i64,
}

impl LocationRecord {
    pub fn new(
        coordinate: Coordinate,
        name: impl Into<String>,
        category: impl Into<String>,
        osm_type: OsmType,
        osm_id: i64,
    ) -> Self {
        Self {
            coordinate,
            name: name.into(),
            category: category.into(),
            osm_type,
            osm_id,
        }
    }

    /// Unique source identifier: "{osm_type}/{osm_id}"
    pub fn source_id(&self) -> String {
        format!("{}/{}", self.osm_type, self.osm_id)
    }
}
