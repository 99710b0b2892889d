//! In-memory `GraphStore` for deterministic tests: no network, no Docker.
//!
//! Mirrors the merge semantics of the Neo4j implementation — nodes collapse
//! by (label, identity), edges by (type, endpoints) — and adds inspection
//! helpers plus an injectable failure for error-path tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::warn;

use casefile_common::{NodeKey, NodeRow, PropertyMap};

use crate::store::{GraphStore, LinkedPair, WeightedEdge};

#[derive(Debug, Clone)]
struct EdgeRecord {
    rel_type: String,
    from: NodeKey,
    to: NodeKey,
    properties: PropertyMap,
}

#[derive(Default)]
pub struct MemoryStore {
    nodes: Mutex<BTreeMap<NodeKey, PropertyMap>>,
    edges: Mutex<Vec<EdgeRecord>>,
    fail_label: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every node upsert with this label fail. Used to exercise the
    /// worker's failure isolation and bulk partial application.
    pub fn fail_on_label(&self, label: &str) {
        *self.fail_label.lock().unwrap() = Some(label.to_string());
    }

    pub fn clear_failures(&self) {
        *self.fail_label.lock().unwrap() = None;
    }

    pub fn node_count(&self, label: &str) -> usize {
        self.nodes
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.label == label)
            .count()
    }

    pub fn get_node(&self, key: &NodeKey) -> Option<PropertyMap> {
        self.nodes.lock().unwrap().get(key).cloned()
    }

    pub fn node_keys(&self, label: &str) -> Vec<NodeKey> {
        self.nodes
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.label == label)
            .cloned()
            .collect()
    }

    pub fn edge_count(&self, rel_type: &str) -> usize {
        self.edges
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.rel_type == rel_type)
            .count()
    }

    pub fn get_edge(&self, rel_type: &str, from: &NodeKey, to: &NodeKey) -> Option<PropertyMap> {
        self.edges
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.rel_type == rel_type && &e.from == from && &e.to == to)
            .map(|e| e.properties.clone())
    }

    pub fn edges_of_type(&self, rel_type: &str) -> Vec<(NodeKey, NodeKey, PropertyMap)> {
        self.edges
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.rel_type == rel_type)
            .map(|e| (e.from.clone(), e.to.clone(), e.properties.clone()))
            .collect()
    }

    /// Insert a signal edge without merge-by-pattern, the way parallel
    /// directed signals accumulate in a real graph. Test seeding only.
    pub async fn insert_multi_edge(
        &self,
        rel_type: &str,
        from: &NodeKey,
        to: &NodeKey,
        properties: &PropertyMap,
    ) {
        self.edges.lock().unwrap().push(EdgeRecord {
            rel_type: rel_type.to_string(),
            from: from.clone(),
            to: to.clone(),
            properties: properties.clone(),
        });
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn upsert_node(&self, row: &NodeRow) -> Result<NodeKey> {
        if let Some(bad) = self.fail_label.lock().unwrap().as_deref() {
            if row.label == bad {
                bail!("injected failure for label {bad}");
            }
        }
        let key = row.key();
        let mut nodes = self.nodes.lock().unwrap();
        let props = nodes.entry(key.clone()).or_default();
        for (k, v) in &row.properties {
            props.insert(k.clone(), v.clone());
        }
        Ok(key)
    }

    async fn upsert_edge(
        &self,
        rel_type: &str,
        from: &NodeKey,
        to: &NodeKey,
        properties: &PropertyMap,
    ) -> Result<()> {
        let mut edges = self.edges.lock().unwrap();
        if let Some(existing) = edges
            .iter_mut()
            .find(|e| e.rel_type == rel_type && &e.from == from && &e.to == to)
        {
            for (k, v) in properties {
                existing.properties.insert(k.clone(), v.clone());
            }
            return Ok(());
        }
        edges.push(EdgeRecord {
            rel_type: rel_type.to_string(),
            from: from.clone(),
            to: to.clone(),
            properties: properties.clone(),
        });
        Ok(())
    }

    async fn bulk_upsert(&self, rows: &[NodeRow]) -> Result<usize> {
        let mut applied = 0;
        for row in rows {
            match self.upsert_node(row).await {
                Ok(_) => applied += 1,
                Err(e) => warn!(
                    label = row.label.as_str(),
                    identity = row.identity.as_str(),
                    error = %e,
                    "Skipping row in bulk upsert"
                ),
            }
        }
        Ok(applied)
    }

    async fn reset_all(&self) -> Result<()> {
        self.nodes.lock().unwrap().clear();
        self.edges.lock().unwrap().clear();
        Ok(())
    }

    async fn linked_pairs(
        &self,
        entity_label: &str,
        via_rel: &str,
        link_label: &str,
    ) -> Result<Vec<LinkedPair>> {
        let edges = self.edges.lock().unwrap();

        // Group entity identities by the linking node they point at.
        let mut by_link: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for e in edges.iter() {
            if e.rel_type == via_rel && e.from.label == entity_label && e.to.label == link_label {
                by_link
                    .entry(e.to.identity.clone())
                    .or_default()
                    .push(e.from.identity.clone());
            }
        }

        // Both orientations, once per shared linking node, like the Cypher
        // pattern (a)-[:VIA]->(l)<-[:VIA]-(b).
        let mut rows = Vec::new();
        for (link, members) in by_link {
            for a in &members {
                for b in &members {
                    if a != b {
                        rows.push(LinkedPair {
                            a: a.clone(),
                            b: b.clone(),
                            link: link.clone(),
                        });
                    }
                }
            }
        }
        Ok(rows)
    }

    async fn weighted_edges(
        &self,
        entity_label: &str,
        rel_type: &str,
        weight_prop: &str,
    ) -> Result<Vec<WeightedEdge>> {
        let edges = self.edges.lock().unwrap();
        Ok(edges
            .iter()
            .filter(|e| {
                e.rel_type == rel_type
                    && e.from.label == entity_label
                    && e.to.label == entity_label
            })
            .map(|e| WeightedEdge {
                from: e.from.identity.clone(),
                to: e.to.identity.clone(),
                weight: e.properties.get(weight_prop).and_then(|v| v.as_f64()),
            })
            .collect())
    }
}
