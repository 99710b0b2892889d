use std::collections::BTreeMap;

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use casefile_common::{canonical_pair, labels, rels, NodeKey, PropertyMap};

use crate::store::GraphStore;

/// Folds many directed INTERACTED signals into one summary RELATIONSHIP
/// edge per unordered Person pair, with `strength` equal to the summed
/// scores. Overwrite semantics: re-running without new signals reproduces
/// the identical strength.
pub struct InteractionAggregator;

impl InteractionAggregator {
    pub async fn run(store: &dyn GraphStore) -> Result<usize> {
        let edges = store
            .weighted_edges(labels::PERSON, rels::INTERACTED, "score")
            .await?;

        // Sum per unordered pair. Edges without a score contribute nothing;
        // pairs with no scored edge at all are skipped entirely.
        let mut sums: BTreeMap<(String, String), f64> = BTreeMap::new();
        for edge in edges {
            let Some(weight) = edge.weight else { continue };
            let Some((lo, hi)) = canonical_pair(&edge.from, &edge.to) else {
                continue;
            };
            *sums.entry((lo.to_string(), hi.to_string())).or_insert(0.0) += weight;
        }

        let updated = sums.len();
        for ((lo, hi), strength) in sums {
            let mut props = PropertyMap::new();
            props.insert("strength".to_string(), strength.into());
            props.insert("last_updated".to_string(), Utc::now().to_rfc3339().into());
            store
                .upsert_edge(
                    rels::RELATIONSHIP,
                    &NodeKey::new(labels::PERSON, lo),
                    &NodeKey::new(labels::PERSON, hi),
                    &props,
                )
                .await?;
        }

        info!(pairs = updated, "Interaction strengths aggregated");
        Ok(updated)
    }
}
