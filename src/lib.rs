//! Poimap - find nearby points of interest in OpenStreetMap and plot them
//!
//! This library provides the category resolver, distance and proximity logic,
//! the Overpass client and the map renderer used by the `poimap` binary.

pub mod config;
pub mod distance;
pub mod models;
pub mod overpass;
pub mod proximity;
pub mod render;
pub mod resolver;
pub mod search;

pub use models::{BoundingBox, Category, CategoryRegistry, Coordinate, LocationRecord, OsmType};
pub use search::{run_search, SearchError, SearchOutcome, SearchRequest, SearchSettings};
