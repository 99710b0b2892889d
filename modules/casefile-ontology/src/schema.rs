use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use casefile_common::{labels, rels};

/// Declared shape of one node label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub description: String,
    /// Property that uniquely identifies a node within this label.
    pub id_key: String,
    /// Property name -> human description. Advisory, not enforced.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl NodeSpec {
    pub fn new(description: &str, props: &[(&str, &str)]) -> Self {
        Self {
            description: description.to_string(),
            id_key: "id".to_string(),
            properties: props
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// The full ontology document: node labels with their specs, plus the
/// ordered list of permitted relationship templates. Exactly these two
/// top-level fields; the persisted form must round-trip losslessly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub nodes: BTreeMap<String, NodeSpec>,
    pub relationships: Vec<String>,
}

impl SchemaDocument {
    /// Built-in default schema, used when no persisted snapshot exists.
    pub fn default_schema() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            labels::PERSON.to_string(),
            NodeSpec::new(
                "An employee or external person",
                &[
                    ("id", "Employee id (e.g. 'sec-1001'). Falls back to the name."),
                    ("name", "Full name"),
                    ("team", "Team the person belongs to"),
                    ("role", "Job title"),
                    ("gender", "Gender"),
                    ("age", "Age as integer"),
                ],
            ),
        );
        nodes.insert(
            labels::ORGANIZATION.to_string(),
            NodeSpec::new(
                "A team, company or school",
                &[
                    ("id", "Organization name"),
                    ("type", "One of 'Team', 'Company', 'School'"),
                ],
            ),
        );
        nodes.insert(
            labels::EVENT.to_string(),
            NodeSpec::new(
                "An observed incident, log entry or action",
                &[
                    ("action", "What happened (e.g. 'plugged in a USB drive')"),
                    ("location", "Where it happened"),
                    ("time", "When it happened"),
                    ("source", "Where the observation came from (e.g. 'CCTV')"),
                ],
            ),
        );
        nodes.insert(
            labels::CERTIFICATE.to_string(),
            NodeSpec::new("A professional certification", &[("id", "Certification name")]),
        );
        nodes.insert(
            labels::MAJOR.to_string(),
            NodeSpec::new("A field of study", &[("id", "Major name")]),
        );
        nodes.insert(
            labels::EVIDENCE.to_string(),
            NodeSpec::new(
                "Provenance record linking a source text to the facts it yielded",
                &[
                    ("id", "Evidence id"),
                    ("text", "The original report text"),
                    ("source", "Report source tag"),
                    ("timestamp", "Ingestion time"),
                ],
            ),
        );

        let relationships = vec![
            format!("({})-[:{}]->({})", labels::PERSON, rels::WORKS_FOR, labels::ORGANIZATION),
            format!("({})-[:{}]->({})", labels::ORGANIZATION, rels::PART_OF, labels::ORGANIZATION),
            format!("({})-[:{}]->({})", labels::PERSON, rels::HAS_CERT, labels::CERTIFICATE),
            format!(
                "({})-[:{} {{score: Int, action: String}}]->({})",
                labels::PERSON,
                rels::INTERACTED,
                labels::PERSON
            ),
            format!("({})-[:{}]->({})", labels::PERSON, rels::PERFORMED, labels::EVENT),
            format!("({})-[:{}]->({})", labels::PERSON, rels::STUDIED, labels::MAJOR),
            format!("({})-[:{}]->({})", labels::PERSON, rels::MENTIONED_IN, labels::EVIDENCE),
        ];

        Self { nodes, relationships }
    }

    /// Labels the extraction capability is allowed to emit.
    pub fn allowed_labels(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    /// Extraction guidance built from the current document.
    pub fn instruction_string(&self) -> String {
        let mut txt = String::from(
            "You are a knowledge graph architect. Follow this schema strictly:\n\n",
        );

        txt.push_str("[Node Definitions]\n");
        for (label, spec) in &self.nodes {
            let props: Vec<&str> = spec.properties.keys().map(String::as_str).collect();
            txt.push_str(&format!("- **{label}** node:\n"));
            txt.push_str(&format!("  * Description: {}\n", spec.description));
            txt.push_str(&format!("  * Unique id: property '{}'\n", spec.id_key));
            txt.push_str(&format!("  * Properties: {}\n", props.join(", ")));
        }

        txt.push_str("\n[Allowed Relationships]\n");
        for rel in &self.relationships {
            txt.push_str(&format!("- {rel}\n"));
        }

        txt
    }

    /// Property-mapping hints for the question-answering capability.
    pub fn qa_mapping(&self) -> String {
        let mut txt = String::from("[Property Mapping] (derived from the ontology):\n");
        for (label, spec) in &self.nodes {
            let props: Vec<&str> = spec.properties.keys().map(String::as_str).collect();
            txt.push_str(&format!(
                "- {label}: identity property '{}', properties {}\n",
                spec.id_key,
                props.join(", ")
            ));
        }
        txt
    }
}
