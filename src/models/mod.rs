//! Core data models for the point-of-interest search.

pub mod category;
pub mod location;

pub use category::{Category, CategoryRegistry, RegistryError, TagClause, TagFilter};
pub use location::{BoundingBox, Coordinate, CoordinateError, LocationRecord, OsmType};
