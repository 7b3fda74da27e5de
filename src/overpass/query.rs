//! Overpass QL query construction.

use std::fmt::Write;

use crate::models::BoundingBox;

/// Server-side timeout (seconds) when none is configured
pub const DEFAULT_SERVER_TIMEOUT_SECS: u64 = 25;

/// A bounding-box query over one or more tag fragments.
///
/// Every fragment is applied to nodes, ways and relations. The result is then
/// recursed down so way nodes and relation members come back with it.
#[derive(Debug, Clone, PartialEq)]
pub struct OverpassQuery {
    pub bbox: BoundingBox,
    pub fragments: Vec<String>,
    pub timeout_secs: u64,
}

impl OverpassQuery {
    pub fn new<S: AsRef<str>>(bbox: BoundingBox, fragments: &[S]) -> Self {
        Self {
            bbox,
            fragments: fragments.iter().map(|f| f.as_ref().to_string()).collect(),
            timeout_secs: DEFAULT_SERVER_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Render the query as Overpass QL
    pub fn to_ql(&self) -> String {
        let mut ql = format!("[out:json][timeout:{}];\n(\n", self.timeout_secs);

        for element in ["node", "way", "relation"] {
            for fragment in &self.fragments {
                let _ = writeln!(ql, "  {}{}({});", element, fragment, self.bbox);
            }
        }

        ql.push_str(");\n(._;>;);\nout body;\n");
        ql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_layout() {
        let bbox = BoundingBox::new(42.05, -87.73, 42.06, -87.67).unwrap();
        let query = OverpassQuery::new(bbox, &[r#"["leisure"="park"]"#, r#"["amenity"="bank"]"#])
            .with_timeout(60);

        let expected = concat!(
            "[out:json][timeout:60];\n",
            "(\n",
            "  node[\"leisure\"=\"park\"](42.05,-87.73,42.06,-87.67);\n",
            "  node[\"amenity\"=\"bank\"](42.05,-87.73,42.06,-87.67);\n",
            "  way[\"leisure\"=\"park\"](42.05,-87.73,42.06,-87.67);\n",
            "  way[\"amenity\"=\"bank\"](42.05,-87.73,42.06,-87.67);\n",
            "  relation[\"leisure\"=\"park\"](42.05,-87.73,42.06,-87.67);\n",
            "  relation[\"amenity\"=\"bank\"](42.05,-87.73,42.06,-87.67);\n",
            ");\n",
            "(._;>;);\n",
            "out body;\n",
        );
        assert_eq!(query.to_ql(), expected);
    }

    #[test]
    fn test_default_timeout() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let query = OverpassQuery::new(bbox, &["[\"a\"=\"b\"]".to_string()]);
        assert!(query.to_ql().starts_with("[out:json][timeout:25];"));
    }
}
