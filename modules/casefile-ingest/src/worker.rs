use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use casefile_common::{
    is_symmetric, labels, rels, CasefileError, Extraction, NodeKey, NodeRow, PropertyMap,
    ReportItem,
};
use casefile_graph::GraphStore;
use casefile_ontology::OntologyManager;

use crate::extractor::ReportExtractor;
use crate::queue::ReportReceiver;

/// The single consumer of the report queue. Extracts facts from each
/// report, persists them with merge semantics, and records provenance.
///
/// The allowed label set and extraction guidance are captured from the
/// ontology at construction; schema changes require restarting ingestion.
pub struct IngestWorker {
    store: Arc<dyn GraphStore>,
    extractor: Arc<dyn ReportExtractor>,
    allowed_labels: Vec<String>,
    guidance: String,
}

impl IngestWorker {
    pub fn new(
        store: Arc<dyn GraphStore>,
        extractor: Arc<dyn ReportExtractor>,
        ontology: &OntologyManager,
    ) -> Self {
        Self {
            store,
            extractor,
            allowed_labels: ontology.allowed_labels(),
            guidance: ontology.instruction_string(),
        }
    }

    /// Drain the queue until every producer is gone. One bad item never
    /// halts the loop: its error is logged and the next item is taken.
    /// No retry — processing is at-most-once.
    pub async fn run(self, mut rx: ReportReceiver) {
        info!(
            labels = self.allowed_labels.join(", "),
            "Ingestion worker started"
        );
        while let Some(item) = rx.recv().await {
            if let Err(e) = self.process(&item).await {
                error!(
                    source = item.source.as_str(),
                    error = %e,
                    "Report processing failed, skipping item"
                );
            }
        }
        info!("Report queue closed, ingestion worker exiting");
    }

    pub fn spawn(self, rx: ReportReceiver) -> JoinHandle<()> {
        tokio::spawn(self.run(rx))
    }

    async fn process(&self, item: &ReportItem) -> Result<()> {
        let extraction = self
            .extractor
            .extract(&item.text, &self.allowed_labels, &self.guidance)
            .await
            .map_err(|e| CasefileError::Extraction(e.to_string()))?;

        if extraction.is_empty() {
            info!(source = item.source.as_str(), "Nothing extracted from report");
            return Ok(());
        }

        let entity_keys = self.persist_facts(&extraction).await?;
        self.record_evidence(item, &entity_keys).await?;

        info!(
            source = item.source.as_str(),
            entities = entity_keys.len(),
            "Report ingested"
        );
        Ok(())
    }

    /// Upsert every extracted node and relationship. Returns the keys of
    /// the entities surfaced by this batch, for evidence linkage.
    async fn persist_facts(&self, extraction: &Extraction) -> Result<Vec<NodeKey>> {
        let mut label_of: BTreeMap<&str, &str> = BTreeMap::new();
        let mut entity_keys = Vec::new();

        for node in &extraction.nodes {
            let row = NodeRow {
                label: node.label.clone(),
                identity: node.identity.clone(),
                properties: node.properties.clone(),
            };
            let key = self
                .store
                .upsert_node(&row)
                .await
                .map_err(|e| CasefileError::Persistence(e.to_string()))?;
            label_of.insert(&node.identity, &node.label);
            entity_keys.push(key);
        }

        for rel in &extraction.relationships {
            // Endpoint labels resolve through the same batch; a relationship
            // pointing outside it is dropped rather than guessed at.
            let (Some(from_label), Some(to_label)) = (
                label_of.get(rel.from_identity.as_str()),
                label_of.get(rel.to_identity.as_str()),
            ) else {
                warn!(
                    rel_type = rel.rel_type.as_str(),
                    from = rel.from_identity.as_str(),
                    to = rel.to_identity.as_str(),
                    "Relationship endpoint not in batch, skipping"
                );
                continue;
            };

            let mut from = NodeKey::new(*from_label, rel.from_identity.clone());
            let mut to = NodeKey::new(*to_label, rel.to_identity.clone());
            if is_symmetric(&rel.rel_type) && from.identity > to.identity {
                std::mem::swap(&mut from, &mut to);
            }

            self.store
                .upsert_edge(&rel.rel_type, &from, &to, &rel.properties)
                .await
                .map_err(|e| CasefileError::Persistence(e.to_string()))?;
        }

        Ok(entity_keys)
    }

    /// One Evidence node per successful batch, plus a MENTIONED_IN edge
    /// from every surfaced entity. Merges, so a replayed batch cannot
    /// double-link.
    async fn record_evidence(&self, item: &ReportItem, entities: &[NodeKey]) -> Result<()> {
        let evidence_id = new_evidence_id();
        let evidence = NodeRow::new(labels::EVIDENCE, evidence_id.clone())
            .with("text", item.text.clone())
            .with("source", item.source.as_str())
            .with("timestamp", item.received_at.to_rfc3339());

        let evidence_key = self
            .store
            .upsert_node(&evidence)
            .await
            .map_err(|e| CasefileError::Persistence(e.to_string()))?;

        for entity in entities {
            self.store
                .upsert_edge(
                    rels::MENTIONED_IN,
                    entity,
                    &evidence_key,
                    &PropertyMap::new(),
                )
                .await
                .map_err(|e| CasefileError::Persistence(e.to_string()))?;
        }
        Ok(())
    }
}

/// Current time plus a random suffix; collision probability negligible.
fn new_evidence_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("EV_{}_{}", Utc::now().timestamp(), &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evidence_ids_carry_time_and_random_suffix() {
        let id = new_evidence_id();
        assert!(id.starts_with("EV_"));
        assert_ne!(id, new_evidence_id());
    }
}
