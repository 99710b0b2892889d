//! Test mocks for the ingestion pipeline: a scripted extractor and a
//! recording answerer. MOCK → FUNCTION → OUTPUT, no network.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use casefile_common::{labels, Extraction, NodeCandidate, RelationCandidate};

use crate::extractor::{GraphAnswerer, ReportExtractor};

/// Scripted extractor: exact report text maps to a canned extraction.
/// Unregistered text extracts nothing; texts registered with `fail_on`
/// error like an unreachable capability.
#[derive(Default)]
pub struct MockExtractor {
    by_text: HashMap<String, Extraction>,
    failing: HashSet<String>,
    seen_labels: Mutex<Vec<String>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_text(mut self, text: &str, extraction: Extraction) -> Self {
        self.by_text.insert(text.to_string(), extraction);
        self
    }

    pub fn fail_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    /// Allowed labels from the most recent extract call.
    pub fn last_allowed_labels(&self) -> Vec<String> {
        self.seen_labels.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportExtractor for MockExtractor {
    async fn extract(
        &self,
        text: &str,
        allowed_labels: &[String],
        _guidance: &str,
    ) -> Result<Extraction> {
        *self.seen_labels.lock().unwrap() = allowed_labels.to_vec();
        if self.failing.contains(text) {
            bail!("extraction capability unreachable");
        }
        Ok(self.by_text.get(text).cloned().unwrap_or_default())
    }
}

/// Answerer that replays a fixed reply and records the schema description
/// it was handed.
pub struct RecordingAnswerer {
    reply: String,
    seen: Mutex<String>,
}

impl RecordingAnswerer {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            seen: Mutex::new(String::new()),
        }
    }

    pub fn last_schema_description(&self) -> String {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphAnswerer for RecordingAnswerer {
    async fn answer(&self, _question: &str, schema_description: &str) -> Result<String> {
        *self.seen.lock().unwrap() = schema_description.to_string();
        Ok(self.reply.clone())
    }
}

/// Schema store with no snapshot and writes that vanish; loading through
/// it yields the built-in default ontology.
pub struct NullSchemaStore;

#[async_trait]
impl casefile_ontology::SchemaStore for NullSchemaStore {
    async fn read(&self) -> Result<Option<casefile_ontology::SchemaDocument>> {
        Ok(None)
    }

    async fn write(&self, _document: &casefile_ontology::SchemaDocument) -> Result<()> {
        Ok(())
    }
}

pub fn person(identity: &str, name: &str) -> NodeCandidate {
    let mut properties = BTreeMap::new();
    properties.insert("name".to_string(), serde_json::json!(name));
    NodeCandidate {
        label: labels::PERSON.to_string(),
        identity: identity.to_string(),
        properties,
    }
}

pub fn organization(identity: &str) -> NodeCandidate {
    NodeCandidate {
        label: labels::ORGANIZATION.to_string(),
        identity: identity.to_string(),
        properties: BTreeMap::new(),
    }
}

pub fn relation(from: &str, rel_type: &str, to: &str) -> RelationCandidate {
    RelationCandidate {
        from_identity: from.to_string(),
        rel_type: rel_type.to_string(),
        to_identity: to.to_string(),
        properties: BTreeMap::new(),
    }
}
