//! Cross-document references between in-process channel endpoints.
//!
//! A `direct:a` producer and a `direct:a` consumer refer to each other;
//! two producers (or two consumers) of the same channel do not.

use dashmap::DashMap;
use log::debug;
use tower_lsp::lsp_types::{GotoDefinitionResponse, Location, Position, Url};

use crate::dialect::{extract_all_endpoints, Dialect, Endpoint};
use crate::document::Document;
use crate::position::range_contains;

/// Endpoints of every open document, rebuilt whenever a document changes.
#[derive(Debug, Default)]
pub struct EndpointIndex {
    endpoints: DashMap<Url, Vec<Endpoint>>,
}

/// Scheme and channel id shared by related endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChannelKey {
    scheme: String,
    id: String,
}

impl ChannelKey {
    fn of(endpoint: &Endpoint) -> Option<Self> {
        let uri = &endpoint.uri;
        if !uri.is_reference_component() {
            return None;
        }
        Some(Self {
            scheme: uri.component_name()?.to_string(),
            id: uri.reference_key()?.to_string(),
        })
    }
}

impl EndpointIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-extract the endpoints of a document.
    pub fn update(&self, uri: &Url, doc: &Document, dialect: Dialect) {
        let endpoints = extract_all_endpoints(doc, dialect);
        debug!("Indexed {} endpoints in {}", endpoints.len(), uri);
        self.endpoints.insert(uri.clone(), endpoints);
    }

    pub fn remove(&self, uri: &Url) {
        self.endpoints.remove(uri);
    }

    /// Endpoints of one document.
    pub fn endpoints(&self, uri: &Url) -> Vec<Endpoint> {
        self.endpoints
            .get(uri)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    fn endpoint_at(&self, uri: &Url, position: Position) -> Option<Endpoint> {
        let entry = self.endpoints.get(uri)?;
        entry
            .value()
            .iter()
            .find(|endpoint| range_contains(&endpoint.range(), position))
            .cloned()
    }

    /// Endpoints with the same channel and the opposite role of the one at
    /// `position`. Sorted by document and position.
    pub fn references(&self, uri: &Url, position: Position) -> Vec<Location> {
        let Some(origin) = self.endpoint_at(uri, position) else {
            return Vec::new();
        };
        let Some(key) = ChannelKey::of(&origin) else {
            return Vec::new();
        };

        let mut locations: Vec<Location> = self
            .endpoints
            .iter()
            .flat_map(|entry| {
                let document = entry.key().clone();
                entry
                    .value()
                    .iter()
                    .filter(|candidate| candidate.is_producer() != origin.is_producer())
                    .filter(|candidate| ChannelKey::of(candidate).as_ref() == Some(&key))
                    .map(|candidate| Location::new(document.clone(), candidate.range()))
                    .collect::<Vec<_>>()
            })
            .collect();
        locations.sort_by(|a, b| {
            (a.uri.as_str(), a.range.start.line, a.range.start.character).cmp(&(
                b.uri.as_str(),
                b.range.start.line,
                b.range.start.character,
            ))
        });
        locations
    }

    /// From a producer, the consumers of its channel.
    pub fn definition(&self, uri: &Url, position: Position) -> Option<GotoDefinitionResponse> {
        let origin = self.endpoint_at(uri, position)?;
        if !origin.is_producer() {
            return None;
        }
        let locations = self.references(uri, position);
        match locations.len() {
            0 => None,
            1 => locations.into_iter().next().map(GotoDefinitionResponse::Scalar),
            _ => Some(GotoDefinitionResponse::Array(locations)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(name: &str) -> Url {
        Url::parse(&format!("file:///work/{name}")).unwrap()
    }

    fn index(documents: &[(&str, &str)]) -> EndpointIndex {
        let index = EndpointIndex::new();
        for (name, text) in documents {
            let uri = url(name);
            let dialect = Dialect::from_uri(&uri).unwrap();
            index.update(&uri, &Document::new(text, 0), dialect);
        }
        index
    }

    #[test]
    fn test_producer_finds_consumers_only() {
        let index = index(&[
            ("A.java", r#"from("timer:t").to("direct:a").to("direct:a");"#),
            (
                "routes.xml",
                "<routes>\n<route><from uri=\"direct:a\"/><to uri=\"log:x\"/></route>\n<route><from uri=\"direct:a\"/></route>\n</routes>",
            ),
        ]);
        let locations = index.references(&url("A.java"), Position::new(0, 22));
        assert_eq!(locations.len(), 2);
        assert!(locations.iter().all(|l| l.uri == url("routes.xml")));
        assert_eq!(locations[0].range.start, Position::new(1, 18));
        assert_eq!(locations[1].range.start.line, 2);
    }

    #[test]
    fn test_consumer_finds_producers() {
        let index = index(&[
            ("A.java", r#"from("direct:b").to("log:x");"#),
            ("B.java", r#"from("timer:t").to("direct:b").to("direct:c");"#),
        ]);
        let locations = index.references(&url("A.java"), Position::new(0, 8));
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].uri, url("B.java"));
    }

    #[test]
    fn test_schemes_and_ids_must_match() {
        let index = index(&[("A.java", r#"from("seda:a").to("direct:a").to("seda:b");"#)]);
        assert!(index.references(&url("A.java"), Position::new(0, 22)).is_empty());
    }

    #[test]
    fn test_non_reference_components_have_no_references() {
        let index = index(&[("A.java", r#"from("timer:a").to("timer:a");"#)]);
        assert!(index.references(&url("A.java"), Position::new(0, 8)).is_empty());
        assert!(index.references(&url("A.java"), Position::new(0, 0)).is_empty());
    }

    #[test]
    fn test_definition_from_producer() {
        let index = index(&[("A.yaml", "- from:\n    uri: \"direct:in\"\n- from:\n    uri: \"timer:t\"\n    steps:\n      - to: \"direct:in\"")]);
        let definition = index.definition(&url("A.yaml"), Position::new(5, 14));
        match definition {
            Some(GotoDefinitionResponse::Scalar(location)) => {
                assert_eq!(location.range.start, Position::new(1, 10));
            }
            other => panic!("unexpected definition: {other:?}"),
        }
        assert!(index.definition(&url("A.yaml"), Position::new(1, 12)).is_none());
    }

    #[test]
    fn test_removed_documents_are_forgotten() {
        let index = index(&[
            ("A.java", r#"from("timer:t").to("direct:a");"#),
            ("B.java", r#"from("direct:a");"#),
        ]);
        index.remove(&url("B.java"));
        assert!(index.references(&url("A.java"), Position::new(0, 22)).is_empty());
        assert!(index.endpoints(&url("B.java")).is_empty());
    }
}
