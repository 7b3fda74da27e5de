//! Overpass JSON response model and location extraction.

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::models::{CategoryRegistry, Coordinate, LocationRecord, OsmType};

/// Body of an `[out:json]` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Runtime errors and warnings reported by the server
    #[serde(default)]
    pub remark: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: HashMap<String, String>,
    },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<i64>,
        #[serde(default)]
        tags: HashMap<String, String>,
    },
    Relation {
        id: i64,
        #[serde(default)]
        members: Vec<Member>,
        #[serde(default)]
        tags: HashMap<String, String>,
    },
    /// Areas, counts and anything else this crate does not query for
    #[serde(other)]
    Other,
}

/// Relation member reference
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Member {
    #[serde(rename = "type")]
    pub member_type: OsmType,
    #[serde(rename = "ref")]
    pub reference: i64,
    #[serde(default)]
    pub role: String,
}

impl Element {
    fn tags(&self) -> Option<&HashMap<String, String>> {
        match self {
            Element::Node { tags, .. } | Element::Way { tags, .. } | Element::Relation { tags, .. } => {
                Some(tags)
            }
            Element::Other => None,
        }
    }
}

/// Turn a response into named, categorised location records.
///
/// Nodes sit at their own position and ways at their first resolvable node.
/// Relations sit at their first node member present in the response, or failing
/// that at the first resolvable node of their first resolvable way member. Elements
/// without a `name` tag, without a coordinate, or matching none of `labels`
/// (typically nodes pulled in by recursion) are skipped.
pub fn extract_locations(
    response: &OverpassResponse,
    registry: &CategoryRegistry,
    labels: &BTreeSet<String>,
) -> Vec<LocationRecord> {
    let positions: HashMap<i64, Coordinate> = response
        .elements
        .iter()
        .filter_map(|e| match e {
            Element::Node { id, lat, lon, .. } => Some((*id, Coordinate::new_unchecked(*lat, *lon))),
            _ => None,
        })
        .collect();
    let way_nodes: HashMap<i64, &[i64]> = response
        .elements
        .iter()
        .filter_map(|e| match e {
            Element::Way { id, nodes, .. } => Some((*id, nodes.as_slice())),
            _ => None,
        })
        .collect();
    let first_node = |nodes: &[i64]| nodes.iter().find_map(|n| positions.get(n)).copied();

    let mut locations = Vec::new();
    let mut skipped = 0usize;

    for element in &response.elements {
        let Some(tags) = element.tags() else {
            continue;
        };
        let Some(name) = tags.get("name").filter(|n| !n.trim().is_empty()) else {
            continue;
        };
        let Some(category) = registry.classify(tags, labels) else {
            skipped += 1;
            continue;
        };

        let located = match element {
            Element::Node { id, lat, lon, .. } => {
                Some((OsmType::Node, *id, Coordinate::new_unchecked(*lat, *lon)))
            }
            Element::Way { id, nodes, .. } => {
                first_node(nodes.as_slice()).map(|c| (OsmType::Way, *id, c))
            }
            Element::Relation { id, members, .. } => members
                .iter()
                .filter(|m| m.member_type == OsmType::Node)
                .find_map(|m| positions.get(&m.reference).copied())
                .or_else(|| {
                    members
                        .iter()
                        .filter(|m| m.member_type == OsmType::Way)
                        .filter_map(|m| way_nodes.get(&m.reference))
                        .find_map(|nodes| first_node(*nodes))
                })
                .map(|c| (OsmType::Relation, *id, c)),
            Element::Other => None,
        };

        match located {
            Some((osm_type, id, coordinate)) => locations.push(LocationRecord::new(
                coordinate,
                name.clone(),
                category.label.clone(),
                osm_type,
                id,
            )),
            None => skipped += 1,
        }
    }

    debug!(
        "Extracted {} locations from {} elements ({} named elements skipped)",
        locations.len(),
        response.elements.len(),
        skipped
    );
    locations
}
