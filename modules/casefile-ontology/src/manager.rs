use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use casefile_common::CasefileError;

use crate::schema::{NodeSpec, SchemaDocument};
use crate::store::SchemaStore;

/// The additions a schema-evolution round wants to make: only entries not
/// already present in the current document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaProposal {
    pub new_nodes: BTreeMap<String, NodeSpec>,
    pub new_relationships: Vec<String>,
}

impl SchemaProposal {
    pub fn is_empty(&self) -> bool {
        self.new_nodes.is_empty() && self.new_relationships.is_empty()
    }

    pub fn len(&self) -> usize {
        self.new_nodes.len() + self.new_relationships.len()
    }
}

/// Owns the versioned ontology document. Loaded once at startup, mutated
/// only by additive merge from a single control path.
pub struct OntologyManager {
    store: Arc<dyn SchemaStore>,
    current: SchemaDocument,
}

impl OntologyManager {
    /// One-shot load: persisted snapshot if one exists, otherwise the
    /// built-in default. Read failures also fall back to the default.
    pub async fn load(store: Arc<dyn SchemaStore>) -> Self {
        let current = match store.read().await {
            Ok(Some(doc)) => {
                info!(
                    labels = doc.nodes.len(),
                    relationships = doc.relationships.len(),
                    "Loaded persisted ontology snapshot"
                );
                doc
            }
            Ok(None) => {
                info!("No persisted ontology snapshot, starting from the built-in default");
                SchemaDocument::default_schema()
            }
            Err(e) => {
                warn!(error = %e, "Failed to read ontology snapshot, using the built-in default");
                SchemaDocument::default_schema()
            }
        };
        Self { store, current }
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.current
    }

    pub fn allowed_labels(&self) -> Vec<String> {
        self.current.allowed_labels()
    }

    pub fn instruction_string(&self) -> String {
        self.current.instruction_string()
    }

    pub fn qa_mapping(&self) -> String {
        self.current.qa_mapping()
    }

    /// Pure set difference: keep only the labels and relationship templates
    /// not already present in the current document.
    pub fn propose(
        &self,
        new_nodes: &BTreeMap<String, NodeSpec>,
        new_relationships: &[String],
    ) -> SchemaProposal {
        let nodes: BTreeMap<String, NodeSpec> = new_nodes
            .iter()
            .filter(|(label, _)| !self.current.nodes.contains_key(*label))
            .map(|(label, spec)| (label.clone(), spec.clone()))
            .collect();

        let mut rels = Vec::new();
        for rel in new_relationships {
            if !self.current.relationships.contains(rel) && !rels.contains(rel) {
                rels.push(rel.clone());
            }
        }

        SchemaProposal {
            new_nodes: nodes,
            new_relationships: rels,
        }
    }

    /// Union-merge the proposal into the in-memory document. Existing
    /// entries are never overwritten or removed. Returns the addition count.
    pub fn apply_in_memory(&mut self, proposal: SchemaProposal) -> usize {
        let mut added = 0;

        for (label, spec) in proposal.new_nodes {
            if let std::collections::btree_map::Entry::Vacant(slot) =
                self.current.nodes.entry(label.clone())
            {
                slot.insert(spec);
                info!(label = label.as_str(), "Ontology gained a node label");
                added += 1;
            }
        }

        for rel in proposal.new_relationships {
            if !self.current.relationships.contains(&rel) {
                info!(template = rel.as_str(), "Ontology gained a relationship template");
                self.current.relationships.push(rel);
                added += 1;
            }
        }

        added
    }

    /// Persist the full current document. Failure leaves the in-memory
    /// document as the source of truth until the next successful write.
    pub async fn persist(&self) -> Result<(), CasefileError> {
        self.store
            .write(&self.current)
            .await
            .map_err(|e| CasefileError::SchemaPersistence(e.to_string()))
    }

    /// Merge then persist. Persistence failure is surfaced as a warning but
    /// never rolls back the in-memory change.
    pub async fn apply(&mut self, proposal: SchemaProposal) -> usize {
        let added = self.apply_in_memory(proposal);
        if added == 0 {
            return 0;
        }
        if let Err(e) = self.persist().await {
            warn!(error = %e, "Ontology change kept in memory, snapshot write failed");
        }
        added
    }
}
