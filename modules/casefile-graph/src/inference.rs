use std::collections::BTreeSet;

use anyhow::Result;
use tracing::info;

use casefile_common::{canonical_pair, labels, rels, NodeKey, PropertyMap};

use crate::store::GraphStore;

/// One structural-inference rule: entities of `entity_label` connected to a
/// shared `link_label` node via `via_rel` gain a symmetric `out_rel` edge
/// with a fixed strength.
#[derive(Debug, Clone)]
pub struct InferenceRule {
    pub entity_label: String,
    pub via_rel: String,
    pub link_label: String,
    pub out_rel: String,
    pub strength: i64,
    pub source: String,
}

impl InferenceRule {
    pub fn new(
        entity_label: &str,
        via_rel: &str,
        link_label: &str,
        out_rel: &str,
        strength: i64,
        source: &str,
    ) -> Self {
        Self {
            entity_label: entity_label.to_string(),
            via_rel: via_rel.to_string(),
            link_label: link_label.to_string(),
            out_rel: out_rel.to_string(),
            strength,
            source: source.to_string(),
        }
    }
}

/// Derives symmetric relationships from shared-neighbor topology.
/// Idempotent: edges are merged, re-running overwrites strength/source and
/// never duplicates. Stale edges from since-removed connections are not
/// pruned here.
pub struct StructuralInference {
    rules: Vec<InferenceRule>,
}

impl Default for StructuralInference {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuralInference {
    /// The built-in rules: shared team ⇒ CO_WORKER, shared major ⇒ ALUMNI.
    pub fn new() -> Self {
        Self {
            rules: vec![
                InferenceRule::new(
                    labels::PERSON,
                    rels::WORKS_FOR,
                    labels::ORGANIZATION,
                    rels::CO_WORKER,
                    8,
                    "system_inference_team",
                ),
                InferenceRule::new(
                    labels::PERSON,
                    rels::STUDIED,
                    labels::MAJOR,
                    rels::ALUMNI,
                    3,
                    "system_inference_major",
                ),
            ],
        }
    }

    pub fn with_rules(rules: Vec<InferenceRule>) -> Self {
        Self { rules }
    }

    /// Run every rule. Returns the total number of relationships touched.
    pub async fn run(&self, store: &dyn GraphStore) -> Result<usize> {
        let mut touched = 0;
        for rule in &self.rules {
            let count = self.run_rule(store, rule).await?;
            info!(
                rule = rule.out_rel.as_str(),
                connections = count,
                "Structural inference pass complete"
            );
            touched += count;
        }
        Ok(touched)
    }

    async fn run_rule(&self, store: &dyn GraphStore, rule: &InferenceRule) -> Result<usize> {
        let rows = store
            .linked_pairs(&rule.entity_label, &rule.via_rel, &rule.link_label)
            .await?;

        // Strict total order over identities: each unordered pair is visited
        // exactly once, no matter how many linking nodes connect it.
        let mut pairs: BTreeSet<(String, String)> = BTreeSet::new();
        for row in rows {
            if let Some((lo, hi)) = canonical_pair(&row.a, &row.b) {
                pairs.insert((lo.to_string(), hi.to_string()));
            }
        }

        let mut props = PropertyMap::new();
        props.insert("strength".to_string(), rule.strength.into());
        props.insert("source".to_string(), rule.source.clone().into());

        for (lo, hi) in &pairs {
            store
                .upsert_edge(
                    &rule.out_rel,
                    &NodeKey::new(rule.entity_label.clone(), lo.clone()),
                    &NodeKey::new(rule.entity_label.clone(), hi.clone()),
                    &props,
                )
                .await?;
        }

        Ok(pairs.len())
    }
}

#[cfg(test)]
mod tests {
    use casefile_common::NodeRow;

    use super::*;
    use crate::testing::MemoryStore;

    async fn seed_team(store: &MemoryStore, team: &str, members: &[&str]) {
        store
            .upsert_node(&NodeRow::new(labels::ORGANIZATION, team))
            .await
            .unwrap();
        for m in members {
            store.upsert_node(&NodeRow::new(labels::PERSON, *m)).await.unwrap();
            store
                .upsert_edge(
                    rels::WORKS_FOR,
                    &NodeKey::new(labels::PERSON, *m),
                    &NodeKey::new(labels::ORGANIZATION, team),
                    &PropertyMap::new(),
                )
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn shared_team_yields_all_unordered_pairs() {
        let store = MemoryStore::new();
        seed_team(&store, "security", &["p1", "p2", "p3", "p4"]).await;

        let touched = StructuralInference::new().run(&store).await.unwrap();

        // C(4,2) = 6
        assert_eq!(touched, 6);
        assert_eq!(store.edge_count(rels::CO_WORKER), 6);
    }

    #[tokio::test]
    async fn rerun_is_idempotent() {
        let store = MemoryStore::new();
        seed_team(&store, "security", &["p1", "p2", "p3"]).await;

        let engine = StructuralInference::new();
        assert_eq!(engine.run(&store).await.unwrap(), 3);
        assert_eq!(engine.run(&store).await.unwrap(), 3);
        assert_eq!(store.edge_count(rels::CO_WORKER), 3);
    }

    #[tokio::test]
    async fn multiple_shared_links_still_one_edge_per_pair() {
        let store = MemoryStore::new();
        // Same two people share a team AND would match via a second team.
        seed_team(&store, "security", &["p1", "p2"]).await;
        seed_team(&store, "night-shift", &["p1", "p2"]).await;

        let touched = StructuralInference::new().run(&store).await.unwrap();

        assert_eq!(touched, 1);
        assert_eq!(store.edge_count(rels::CO_WORKER), 1);
    }

    #[tokio::test]
    async fn edges_carry_strength_and_source() {
        let store = MemoryStore::new();
        seed_team(&store, "security", &["p1", "p2"]).await;
        StructuralInference::new().run(&store).await.unwrap();

        let props = store
            .get_edge(
                rels::CO_WORKER,
                &NodeKey::new(labels::PERSON, "p1"),
                &NodeKey::new(labels::PERSON, "p2"),
            )
            .expect("canonical-order edge exists");
        assert_eq!(props["strength"], serde_json::json!(8));
        assert_eq!(props["source"], serde_json::json!("system_inference_team"));
    }
}
