//! Overpass API integration: query building, response parsing and the HTTP client.

mod client;
mod query;
mod response;

pub use client::{
    GeodataProvider, OverpassClient, ProviderError, DEFAULT_ENDPOINT, DEFAULT_USER_AGENT,
};
pub use query::{OverpassQuery, DEFAULT_SERVER_TIMEOUT_SECS};
pub use response::{extract_locations, Element, Member, OverpassResponse};
