use anyhow::Result;
use async_trait::async_trait;

use casefile_common::{NodeKey, NodeRow, PropertyMap};

/// One raw co-neighbor row: entities `a` and `b` share the linking node
/// `link`. Rows come back in both orientations and once per shared linking
/// node; deduplication is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedPair {
    pub a: String,
    pub b: String,
    pub link: String,
}

/// One directed weighted signal edge. `weight` is `None` when the property
/// is absent on the stored edge.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedEdge {
    pub from: String,
    pub to: String,
    pub weight: Option<f64>,
}

/// Durable label-typed node/relationship storage with merge-by-identity
/// semantics. No business logic lives behind this trait; atomicity of each
/// operation is the store's concern.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Create or update a node by (label, identity). Properties of repeated
    /// calls union, later values overwrite. Never creates duplicates.
    async fn upsert_node(&self, row: &NodeRow) -> Result<NodeKey>;

    /// Merge a typed edge between two nodes. Same (type, endpoints)
    /// collapse to one edge; properties overwrite.
    async fn upsert_edge(
        &self,
        rel_type: &str,
        from: &NodeKey,
        to: &NodeKey,
        properties: &PropertyMap,
    ) -> Result<()>;

    /// Batch node upsert. Rows may be applied individually; a failing row
    /// is skipped. Returns the applied count.
    async fn bulk_upsert(&self, rows: &[NodeRow]) -> Result<usize>;

    /// Destructive cascade delete of all nodes and edges. Only reachable
    /// through an explicit operator action.
    async fn reset_all(&self) -> Result<()>;

    /// All pairs of `entity_label` nodes connected through a shared
    /// `link_label` node via `via_rel` edges.
    async fn linked_pairs(
        &self,
        entity_label: &str,
        via_rel: &str,
        link_label: &str,
    ) -> Result<Vec<LinkedPair>>;

    /// All directed `rel_type` edges between `entity_label` nodes, with the
    /// `weight_prop` property read as a float where present.
    async fn weighted_edges(
        &self,
        entity_label: &str,
        rel_type: &str,
        weight_prop: &str,
    ) -> Result<Vec<WeightedEdge>>;
}
