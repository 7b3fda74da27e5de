//! Map rendering: marker placement and output of a viewable artifact.

mod leaflet;

pub use leaflet::LeafletMap;

use std::path::Path;
use thiserror::Error;

use crate::models::Coordinate;

/// Output file used when no name is supplied
pub const DEFAULT_MAP_NAME: &str = "search_results_map.html";

/// Initial zoom when none is configured
pub const DEFAULT_ZOOM: u8 = 15;

/// Marker color for features whose category has no registry color
pub const FALLBACK_COLOR: &str = "blue";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write map to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize markers: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub coordinate: Coordinate,
    pub popup: String,
    pub color: String,
    /// Category label, shown in the legend
    pub category: String,
}

/// A map canvas that collects markers and writes itself out.
pub trait MapRenderer {
    fn add_marker(&mut self, marker: Marker);

    fn save(&self, path: &Path) -> Result<(), RenderError>;
}

/// `<label>_<label>_map.html` from the resolved labels
pub fn default_map_name<'a>(labels: impl IntoIterator<Item = &'a String>) -> String {
    let labels: Vec<&str> = labels.into_iter().map(|s| s.as_str()).collect();
    if labels.is_empty() {
        return DEFAULT_MAP_NAME.to_string();
    }
    format!("{}_map.html", labels.join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_default_map_name() {
        let labels: BTreeSet<String> = ["restaurants", "parks"].iter().map(|s| s.to_string()).collect();
        assert_eq!(default_map_name(&labels), "parks_restaurants_map.html");
        assert_eq!(default_map_name(&BTreeSet::new()), DEFAULT_MAP_NAME);
    }
}
