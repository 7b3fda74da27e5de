//! Category registry: synonym lists, Overpass tag fragments and marker colors.

use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("category with empty label")]
    EmptyLabel,
    #[error("category '{0}' has no synonyms")]
    NoSynonyms(String),
    #[error("category '{0}' has an empty query fragment")]
    EmptyFragment(String),
    #[error("category '{label}' has an unparseable query fragment: {fragment}")]
    BadFragment { label: String, fragment: String },
    #[error("duplicate category label '{0}'")]
    DuplicateLabel(String),
    #[error("color '{color}' is used by both '{first}' and '{second}'")]
    DuplicateColor {
        color: String,
        first: String,
        second: String,
    },
}

/// A semantic category such as "restaurants"
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
    pub label: String,
    pub synonyms: Vec<String>,
    /// Overpass tag filter, e.g. `["leisure"="park"]`
    pub query_fragment: String,
    pub color: String,
}

impl Category {
    pub fn new(label: &str, synonyms: &[&str], query_fragment: &str, color: &str) -> Self {
        Self {
            label: label.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
            query_fragment: query_fragment.to_string(),
            color: color.to_string(),
        }
    }
}

/// One `[...]` clause of an Overpass tag filter
#[derive(Debug, Clone)]
pub enum TagClause {
    /// `["key"="value"]`
    Exact { key: String, value: String },
    /// `["key"~"pattern"]`, unanchored like Overpass
    Regex { key: String, pattern: Regex },
}

impl TagClause {
    fn parse(inner: &str) -> Option<Self> {
        let (key, op, value) = if let Some((k, v)) = inner.split_once("\"=\"") {
            (k, '=', v)
        } else if let Some((k, v)) = inner.split_once("\"~\"") {
            (k, '~', v)
        } else {
            return None;
        };

        let key = key.strip_prefix('"')?;
        let value = value.strip_suffix('"')?;
        if key.is_empty() || value.is_empty() || key.contains('"') || value.contains('"') {
            return None;
        }

        match op {
            '=' => Some(TagClause::Exact {
                key: key.to_string(),
                value: value.to_string(),
            }),
            _ => Some(TagClause::Regex {
                key: key.to_string(),
                pattern: Regex::new(value).ok()?,
            }),
        }
    }

    fn matches(&self, tags: &HashMap<String, String>) -> bool {
        match self {
            TagClause::Exact { key, value } => tags.get(key).is_some_and(|v| v == value),
            TagClause::Regex { key, pattern } => {
                tags.get(key).is_some_and(|v| pattern.is_match(v))
            }
        }
    }
}

/// Parsed Overpass tag filter: one or more clauses, all of which must hold
#[derive(Debug, Clone)]
pub struct TagFilter {
    clauses: Vec<TagClause>,
}

impl TagFilter {
    pub fn parse(fragment: &str) -> Option<Self> {
        let mut rest = fragment.trim();
        let mut clauses = Vec::new();

        while !rest.is_empty() {
            let body = rest.strip_prefix('[')?;
            // Clause ends at the first `]` outside a quoted string
            let mut quoted = false;
            let end = body.char_indices().find_map(|(i, c)| match c {
                '"' => {
                    quoted = !quoted;
                    None
                }
                ']' if !quoted => Some(i),
                _ => None,
            })?;
            clauses.push(TagClause::parse(&body[..end])?);
            rest = body[end + 1..].trim_start();
        }

        if clauses.is_empty() {
            return None;
        }
        Some(Self { clauses })
    }

    pub fn clauses(&self) -> &[TagClause] {
        &self.clauses
    }

    pub fn matches(&self, tags: &HashMap<String, String>) -> bool {
        self.clauses.iter().all(|c| c.matches(tags))
    }
}

/// Fixed mapping from category label to synonyms, tag fragment and color.
///
/// Built once and passed to whoever needs it; never mutated after construction.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
    filters: Vec<TagFilter>,
    by_label: HashMap<String, usize>,
}

impl CategoryRegistry {
    /// Build a registry, validating every category
    pub fn new(categories: Vec<Category>) -> Result<Self, RegistryError> {
        let mut by_label = HashMap::new();
        let mut colors: HashMap<String, String> = HashMap::new();
        let mut filters = Vec::with_capacity(categories.len());

        for (idx, category) in categories.iter().enumerate() {
            if category.label.trim().is_empty() {
                return Err(RegistryError::EmptyLabel);
            }
            if category.synonyms.iter().all(|s| s.trim().is_empty()) {
                return Err(RegistryError::NoSynonyms(category.label.clone()));
            }
            if category.query_fragment.trim().is_empty() {
                return Err(RegistryError::EmptyFragment(category.label.clone()));
            }
            let filter = TagFilter::parse(&category.query_fragment).ok_or_else(|| {
                RegistryError::BadFragment {
                    label: category.label.clone(),
                    fragment: category.query_fragment.clone(),
                }
            })?;
            if by_label.insert(category.label.clone(), idx).is_some() {
                return Err(RegistryError::DuplicateLabel(category.label.clone()));
            }
            if let Some(first) = colors.insert(category.color.clone(), category.label.clone()) {
                return Err(RegistryError::DuplicateColor {
                    color: category.color.clone(),
                    first,
                    second: category.label.clone(),
                });
            }
            filters.push(filter);
        }

        // Overlapping synonyms are allowed but make resolution ambiguous
        let mut seen: HashMap<String, &str> = HashMap::new();
        for category in &categories {
            let mut own = HashSet::new();
            for synonym in &category.synonyms {
                let synonym = synonym.to_lowercase();
                if !own.insert(synonym.clone()) {
                    continue;
                }
                if let Some(other) = seen.insert(synonym.clone(), &category.label) {
                    warn!(
                        "Synonym '{}' is shared by categories '{}' and '{}'",
                        synonym, other, category.label
                    );
                }
            }
        }

        Ok(Self {
            categories,
            filters,
            by_label,
        })
    }

    pub fn get(&self, label: &str) -> Option<&Category> {
        self.by_label.get(label).map(|&idx| &self.categories[idx])
    }

    pub fn query_fragment(&self, label: &str) -> Option<&str> {
        self.get(label).map(|c| c.query_fragment.as_str())
    }

    pub fn color(&self, label: &str) -> Option<&str> {
        self.get(label).map(|c| c.color.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// First category (in registry order) among `labels` whose tag filter matches the tags
    pub fn classify(
        &self,
        tags: &HashMap<String, String>,
        labels: &BTreeSet<String>,
    ) -> Option<&Category> {
        self.categories
            .iter()
            .zip(&self.filters)
            .find(|(c, f)| labels.contains(&c.label) && f.matches(tags))
            .map(|(c, _)| c)
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        let categories = vec![
            Category::new(
                "restaurants",
                &[
                    "restaurant",
                    "cafe",
                    "bistro",
                    "diner",
                    "coffee shop",
                    "eatery",
                    "food joint",
                    "brasserie",
                    "takeaway",
                    "pizzeria",
                ],
                r#"["amenity"~"restaurant|cafe|fast_food"]"#,
                "blue",
            ),
            Category::new(
                "parks",
                &[
                    "park",
                    "green space",
                    "playground",
                    "recreation area",
                    "nature reserve",
                    "garden",
                    "public garden",
                    "square",
                    "field",
                ],
                r#"["leisure"="park"]"#,
                "green",
            ),
            Category::new(
                "schools",
                &[
                    "school",
                    "educational institution",
                    "academy",
                    "college",
                    "university",
                    "institute",
                    "learning center",
                    "high school",
                    "middle school",
                    "primary school",
                ],
                r#"["amenity"~"school|college|university"]"#,
                "red",
            ),
            Category::new(
                "hospitals",
                &[
                    "hospital",
                    "medical center",
                    "clinic",
                    "healthcare facility",
                    "urgent care",
                ],
                r#"["amenity"~"hospital|clinic"]"#,
                "purple",
            ),
            Category::new(
                "shopping",
                &[
                    "shopping mall",
                    "mall",
                    "shopping center",
                    "market",
                    "store",
                    "boutique",
                    "shop",
                    "retail outlet",
                ],
                r#"["building"="shopping_centre"]"#,
                "gray",
            ),
            Category::new(
                "banks",
                &[
                    "bank",
                    "financial institution",
                    "credit union",
                    "savings bank",
                ],
                r#"["amenity"="bank"]"#,
                "darkblue",
            ),
            Category::new(
                "pharmacies",
                &["pharmacy", "drugstore", "chemist", "medicinal shop"],
                r#"["amenity"="pharmacy"]"#,
                "pink",
            ),
            Category::new(
                "transportation",
                &[
                    "bus stop",
                    "train station",
                    "subway station",
                    "metro station",
                    "taxi stand",
                    "transport hub",
                ],
                r#"["highway"="bus_stop"]"#,
                "orange",
            ),
            Category::new(
                "museums",
                &[
                    "museum",
                    "gallery",
                    "exhibition center",
                    "art museum",
                    "science museum",
                ],
                r#"["tourism"="museum"]"#,
                "darkred",
            ),
        ];

        // The built-in table is covered by tests; failing here is a programming error
        Self::new(categories).expect("built-in category registry is valid")
    }
}
