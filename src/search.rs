//! End-to-end search: resolve categories, query the provider, filter by
//! proximity and render the surviving features.

use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::distance::feet_to_km;
use crate::models::{BoundingBox, CategoryRegistry, Coordinate, LocationRecord};
use crate::overpass::{extract_locations, GeodataProvider, OverpassQuery, ProviderError};
use crate::proximity::ProximityStrategy;
use crate::render::{MapRenderer, Marker, RenderError, FALLBACK_COLOR};
use crate::resolver::{CategoryResolver, MatchMode};

/// Tuning knobs that do not change per request
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub match_mode: MatchMode,
    pub zoom: u8,
    pub index_above: usize,
    pub server_timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::Substring,
            zoom: crate::render::DEFAULT_ZOOM,
            index_above: 256,
            server_timeout_secs: crate::overpass::DEFAULT_SERVER_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub text: String,
    pub bbox: BoundingBox,
    pub proximity_threshold_feet: f64,
    pub output_path: PathBuf,
}

/// How a search that did not fail ended
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    MapSaved {
        path: PathBuf,
        categories: BTreeSet<String>,
        markers: usize,
    },
    /// Nothing survived extraction and proximity filtering; no file written
    NoFeatures { categories: BTreeSet<String> },
}

impl SearchOutcome {
    pub fn user_message(&self) -> String {
        match self {
            SearchOutcome::MapSaved { path, .. } => format!(
                "Map saved as '{}'. Open this file in a browser to view the results.",
                path.display()
            ),
            SearchOutcome::NoFeatures { .. } => {
                "No features found within the specified proximity.".to_string()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no valid categories found in input")]
    NoValidCategories,
    #[error("too many requests")]
    TooManyRequests,
    #[error("invalid synonym pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error(transparent)]
    Provider(ProviderError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<ProviderError> for SearchError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::TooManyRequests => SearchError::TooManyRequests,
            other => SearchError::Provider(other),
        }
    }
}

impl SearchError {
    /// Console text for this failure
    pub fn user_message(&self) -> String {
        match self {
            SearchError::NoValidCategories => "No valid categories found in input.".to_string(),
            SearchError::TooManyRequests => {
                "Too many requests, please wait before making another request.".to_string()
            }
            other => format!("An error occurred: {}", other),
        }
    }
}

/// Run one search.
///
/// `new_renderer` builds the map canvas from the initial center and zoom; it is
/// only called when there is something to draw.
pub async fn run_search<P, R, F>(
    provider: &P,
    registry: &CategoryRegistry,
    settings: &SearchSettings,
    request: &SearchRequest,
    new_renderer: F,
) -> Result<SearchOutcome, SearchError>
where
    P: GeodataProvider,
    R: MapRenderer,
    F: FnOnce(Coordinate, u8) -> R,
{
    let resolver = CategoryResolver::new(registry, settings.match_mode)?;
    let categories = resolver.resolve(&request.text);
    if categories.is_empty() {
        warn!("No categories matched {:?}", request.text);
        return Err(SearchError::NoValidCategories);
    }
    info!("Searching for categories: {:?}", categories);

    let fragments = resolver.fragments(&categories);
    let query = OverpassQuery::new(request.bbox, &fragments)
        .with_timeout(settings.server_timeout_secs);
    let response = provider.execute(&query).await?;

    let locations = extract_locations(&response, registry, &categories);
    let threshold_km = feet_to_km(request.proximity_threshold_feet);
    let strategy = ProximityStrategy::for_len(locations.len(), settings.index_above);
    let nearby = strategy.apply(&locations, threshold_km);
    info!(
        "{} of {} locations are within {:.4} km of another ({:?})",
        nearby.len(),
        locations.len(),
        threshold_km,
        strategy
    );

    let Some(first) = nearby.first() else {
        return Ok(SearchOutcome::NoFeatures { categories });
    };

    debug!("Centering map on {} at zoom {}", first.coordinate, settings.zoom);
    let mut renderer = new_renderer(first.coordinate, settings.zoom);
    for record in &nearby {
        renderer.add_marker(marker_for(record, &resolver));
    }
    renderer.save(&request.output_path)?;

    Ok(SearchOutcome::MapSaved {
        path: request.output_path.clone(),
        categories,
        markers: nearby.len(),
    })
}

fn marker_for(record: &LocationRecord, resolver: &CategoryResolver<'_>) -> Marker {
    Marker {
        coordinate: record.coordinate,
        popup: record.name.clone(),
        color: resolver
            .color(&record.category)
            .unwrap_or(FALLBACK_COLOR)
            .to_string(),
        category: record.category.clone(),
    }
}
