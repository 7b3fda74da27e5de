//! Self-contained Leaflet HTML map writer.

use chrono::Utc;
use geo::{BoundingRect, MultiPoint, Point};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use super::{MapRenderer, Marker, RenderError};
use crate::models::Coordinate;

const LEAFLET_VERSION: &str = "1.9.4";
const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

/// Marker as embedded in the page script
#[derive(Serialize)]
struct MarkerJson<'a> {
    lat: f64,
    lon: f64,
    popup: String,
    color: &'a str,
}

#[derive(Serialize)]
struct LegendJson<'a> {
    label: &'a str,
    color: &'a str,
}

/// Leaflet map canvas centered on a coordinate at a fixed zoom.
pub struct LeafletMap {
    center: Coordinate,
    zoom: u8,
    fit_bounds: bool,
    markers: Vec<Marker>,
}

impl LeafletMap {
    pub fn new(center: Coordinate, zoom: u8) -> Self {
        Self {
            center,
            zoom,
            fit_bounds: false,
            markers: Vec::new(),
        }
    }

    /// Zoom to the markers' extent once the page loads
    pub fn with_fit_bounds(mut self, fit_bounds: bool) -> Self {
        self.fit_bounds = fit_bounds;
        self
    }

    /// Marker extent as [[south, west], [north, east]]
    fn bounds(&self) -> Option<[[f64; 2]; 2]> {
        let points: MultiPoint<f64> = self
            .markers
            .iter()
            .map(|m| Point::from(m.coordinate))
            .collect::<Vec<_>>()
            .into();
        let rect = points.bounding_rect()?;
        Some([[rect.min().y, rect.min().x], [rect.max().y, rect.max().x]])
    }

    /// Render the full HTML document
    pub fn to_html(&self) -> Result<String, RenderError> {
        let markers: Vec<MarkerJson> = self
            .markers
            .iter()
            .map(|m| MarkerJson {
                lat: m.coordinate.lat,
                lon: m.coordinate.lon,
                popup: escape_html(&m.popup),
                color: &m.color,
            })
            .collect();
        // One legend row per category drawn, sorted by label
        let legend: Vec<LegendJson> = self
            .markers
            .iter()
            .map(|m| (m.category.as_str(), m.color.as_str()))
            .collect::<BTreeMap<_, _>>()
            .into_iter()
            .map(|(label, color)| LegendJson { label, color })
            .collect();
        let bounds = if self.fit_bounds { self.bounds() } else { None };

        let markers_json = script_json(&markers)?;
        let legend_json = script_json(&legend)?;
        let bounds_json = script_json(&bounds)?;

        Ok(format!(
            r#"<!DOCTYPE html>
<!-- generated by poimap at {generated} -->
<html>
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<title>Search results</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@{version}/dist/leaflet.css" />
<script src="https://unpkg.com/leaflet@{version}/dist/leaflet.js"></script>
<style>
  html, body, #map {{ height: 100%; margin: 0; }}
  .legend {{ background: white; padding: 6px 8px; border-radius: 4px; font: 13px sans-serif; }}
  .legend i {{ display: inline-block; width: 12px; height: 12px; border-radius: 6px; margin-right: 6px; }}
</style>
</head>
<body>
<div id="map"></div>
<script>
  var map = L.map("map").setView([{lat}, {lon}], {zoom});
  L.tileLayer("{tiles}", {{ maxZoom: 19, attribution: '{attribution}' }}).addTo(map);

  var markers = {markers};
  markers.forEach(function (m) {{
    L.circleMarker([m.lat, m.lon], {{
      radius: 8, color: m.color, fillColor: m.color, fillOpacity: 0.8
    }}).bindPopup(m.popup).addTo(map);
  }});

  var bounds = {bounds};
  if (bounds) {{ map.fitBounds(bounds, {{ padding: [20, 20] }}); }}

  var legend = {legend};
  if (legend.length) {{
    var control = L.control({{ position: "bottomright" }});
    control.onAdd = function () {{
      var div = L.DomUtil.create("div", "legend");
      legend.forEach(function (e) {{
        var row = document.createElement("div");
        var swatch = document.createElement("i");
        swatch.style.background = e.color;
        row.appendChild(swatch);
        row.appendChild(document.createTextNode(e.label));
        div.appendChild(row);
      }});
      return div;
    }};
    control.addTo(map);
  }}
</script>
</body>
</html>
"#,
            generated = Utc::now().to_rfc3339(),
            version = LEAFLET_VERSION,
            lat = self.center.lat,
            lon = self.center.lon,
            zoom = self.zoom,
            tiles = TILE_URL,
            attribution = ATTRIBUTION,
            markers = markers_json,
            bounds = bounds_json,
            legend = legend_json,
        ))
    }
}

impl MapRenderer for LeafletMap {
    fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    fn save(&self, path: &Path) -> Result<(), RenderError> {
        let html = self.to_html()?;
        fs::write(path, html).map_err(|source| RenderError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!("Wrote {} markers to {}", self.markers.len(), path.display());
        Ok(())
    }
}

/// JSON safe to inline in a `<script>` element
fn script_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
