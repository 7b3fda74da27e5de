//! Free-text category resolution against a [`CategoryRegistry`].

use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::models::CategoryRegistry;

/// How a synonym is matched against user text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Synonym appears anywhere in the text ("mall" matches "smaller")
    #[default]
    Substring,
    /// Synonym must be bounded by non-word characters
    WordBoundary,
}

/// Maps free text to the set of registry categories it mentions.
pub struct CategoryResolver<'a> {
    registry: &'a CategoryRegistry,
    /// Per category (registry order): lowercased synonyms, or compiled patterns
    matchers: Vec<(&'a str, Vec<Matcher>)>,
}

enum Matcher {
    Substring(String),
    Word(Regex),
}

impl Matcher {
    fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::Substring(s) => text.contains(s.as_str()),
            Matcher::Word(re) => re.is_match(text),
        }
    }
}

impl<'a> CategoryResolver<'a> {
    pub fn new(registry: &'a CategoryRegistry, mode: MatchMode) -> Result<Self, regex::Error> {
        let mut matchers = Vec::with_capacity(registry.len());

        for category in registry.iter() {
            let mut list = Vec::with_capacity(category.synonyms.len());
            for synonym in &category.synonyms {
                let synonym = synonym.trim().to_lowercase();
                if synonym.is_empty() {
                    continue;
                }
                list.push(match mode {
                    MatchMode::Substring => Matcher::Substring(synonym),
                    MatchMode::WordBoundary => {
                        let words: Vec<String> =
                            synonym.split_whitespace().map(regex::escape).collect();
                        Matcher::Word(Regex::new(&format!(r"\b{}\b", words.join(r"\s+")))?)
                    }
                });
            }
            matchers.push((category.label.as_str(), list));
        }

        Ok(Self {
            registry,
            matchers,
        })
    }

    /// Labels of every category with at least one synonym found in `text`
    pub fn resolve(&self, text: &str) -> BTreeSet<String> {
        let text = text.to_lowercase();
        let mut labels = BTreeSet::new();

        if text.trim().is_empty() {
            return labels;
        }

        for (label, matchers) in &self.matchers {
            if matchers.iter().any(|m| m.is_match(&text)) {
                labels.insert(label.to_string());
            }
        }

        debug!("Resolved {:?} to categories {:?}", text, labels);
        labels
    }

    /// Query fragments for resolved labels, in label order. Unknown labels are skipped.
    pub fn fragments<'l>(&self, labels: impl IntoIterator<Item = &'l String>) -> Vec<&'a str> {
        labels
            .into_iter()
            .filter_map(|label| self.registry.query_fragment(label))
            .collect()
    }

    pub fn color(&self, label: &str) -> Option<&'a str> {
        self.registry.color(label)
    }
}
