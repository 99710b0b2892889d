use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Node labels the built-in ontology ships with. Dynamically discovered
/// labels are plain strings on top of these.
pub mod labels {
    pub const PERSON: &str = "Person";
    pub const ORGANIZATION: &str = "Organization";
    pub const EVENT: &str = "Event";
    pub const CERTIFICATE: &str = "Certificate";
    pub const MAJOR: &str = "Major";
    pub const EVIDENCE: &str = "Evidence";
}

/// Relationship types used by the ingestion worker, the bulk loader and the
/// derivation engines.
pub mod rels {
    pub const WORKS_FOR: &str = "WORKS_FOR";
    pub const PART_OF: &str = "PART_OF";
    pub const HAS_CERT: &str = "HAS_CERT";
    pub const INTERACTED: &str = "INTERACTED";
    pub const PERFORMED: &str = "PERFORMED";
    pub const STUDIED: &str = "STUDIED";
    pub const MENTIONED_IN: &str = "MENTIONED_IN";
    pub const CO_WORKER: &str = "CO_WORKER";
    pub const ALUMNI: &str = "ALUMNI";
    pub const RELATIONSHIP: &str = "RELATIONSHIP";
}

/// Relationship types that are logically symmetric. They are stored as a
/// single directed edge whose endpoints are in canonical identity order.
pub const SYMMETRIC_RELS: [&str; 3] = [rels::CO_WORKER, rels::ALUMNI, rels::RELATIONSHIP];

pub fn is_symmetric(rel_type: &str) -> bool {
    SYMMETRIC_RELS.contains(&rel_type)
}

/// Order an unordered identity pair canonically (lexicographic).
/// Returns `None` for self-pairs.
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> Option<(&'a str, &'a str)> {
    match a.cmp(b) {
        std::cmp::Ordering::Less => Some((a, b)),
        std::cmp::Ordering::Greater => Some((b, a)),
        std::cmp::Ordering::Equal => None,
    }
}

/// Where a report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceTag {
    User,
    AutoGen,
    Bulk,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::User => "USER",
            SourceTag::AutoGen => "AUTO_GEN",
            SourceTag::Bulk => "BULK",
        }
    }
}

/// One free-form report waiting in the ingestion queue. Ephemeral: consumed
/// exactly once by the worker, never persisted as itself.
#[derive(Debug, Clone)]
pub struct ReportItem {
    pub source: SourceTag,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl ReportItem {
    pub fn new(source: SourceTag, text: impl Into<String>) -> Self {
        Self {
            source,
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

/// Open per-label property map. Ordered so document round-trips are stable.
pub type PropertyMap = BTreeMap<String, serde_json::Value>;

/// Reference to a node by label and identity-key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    pub label: String,
    pub identity: String,
}

impl NodeKey {
    pub fn new(label: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            identity: identity.into(),
        }
    }
}

/// A node to upsert: label, identity-key value, open property map.
/// Two upserts with the same (label, identity) resolve to one logical node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRow {
    pub label: String,
    pub identity: String,
    #[serde(default)]
    pub properties: PropertyMap,
}

impl NodeRow {
    pub fn new(label: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            identity: identity.into(),
            properties: PropertyMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.label.clone(), self.identity.clone())
    }
}

/// A typed edge to upsert between two node references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub rel_type: String,
    pub from: NodeKey,
    pub to: NodeKey,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// What the extraction capability returns for one node it surfaced.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NodeCandidate {
    /// Node label, one of the allowed labels passed to the extractor.
    pub label: String,
    /// Identity-key value, unique within the label.
    pub identity: String,
    /// Additional properties keyed by property name.
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

/// What the extraction capability returns for one relationship it surfaced.
/// Endpoints reference node candidates from the same batch by identity.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RelationCandidate {
    pub from_identity: String,
    pub rel_type: String,
    pub to_identity: String,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

/// One extraction batch. Empty is valid and means the extractor found
/// nothing usable in the text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Extraction {
    #[serde(default)]
    pub nodes: Vec<NodeCandidate>,
    #[serde(default)]
    pub relationships: Vec<RelationCandidate>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Sentinel in `MasterRecord::certifications` meaning "no certifications".
pub const NO_CERTIFICATIONS: &str = "none";

/// One flat record from the bulk master-data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterRecord {
    pub id: String,
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub role: String,
    pub team: String,
    pub company: String,
    pub major: String,
    /// Comma-joined list; `NO_CERTIFICATIONS` or empty means none.
    pub certifications: String,
}

impl MasterRecord {
    /// Split the comma-joined certifications field, honoring the sentinel.
    pub fn certification_list(&self) -> Vec<String> {
        let raw = self.certifications.trim();
        if raw.is_empty() || raw == NO_CERTIFICATIONS {
            return Vec::new();
        }
        raw.split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }
}
