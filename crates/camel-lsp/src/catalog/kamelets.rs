//! Kamelet templates offered for `kamelet:<templateId>` endpoints.

use std::sync::OnceLock;

use log::error;
use serde::Deserialize;

const BUNDLED_KAMELETS: &str = include_str!("../../catalog/kamelets.json");

static KAMELETS: OnceLock<Vec<Kamelet>> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KameletType {
    Source,
    Sink,
    Action,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Kamelet {
    pub name: String,
    #[serde(rename = "type")]
    pub kamelet_type: KameletType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Kamelet {
    pub fn documentation(&self) -> String {
        format!("**{}**\n\n{}", self.title, self.description)
    }
}

pub fn kamelets() -> &'static [Kamelet] {
    KAMELETS.get_or_init(|| {
        serde_json::from_str(BUNDLED_KAMELETS).unwrap_or_else(|e| {
            error!("Bundled kamelet catalog is malformed: {}", e);
            Vec::new()
        })
    })
}

pub fn find_kamelet(name: &str) -> Option<&'static Kamelet> {
    kamelets().iter().find(|k| k.name == name)
}

/// Templates an endpoint can use: sinks for producers, sources for consumers.
pub fn kamelets_for(producer: bool) -> impl Iterator<Item = &'static Kamelet> {
    let wanted = if producer {
        KameletType::Sink
    } else {
        KameletType::Source
    };
    kamelets().iter().filter(move |k| k.kamelet_type == wanted)
}
