use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use neo4rs::{query, BoltBoolean, BoltFloat, BoltInteger, BoltMap, BoltString, BoltType};
use tracing::warn;

use casefile_common::{NodeKey, NodeRow, PropertyMap};

use crate::client::GraphClient;
use crate::store::{GraphStore, LinkedPair, WeightedEdge};

/// Neo4j-backed `GraphStore`. Labels and relationship types come from the
/// ontology (and ultimately from the extractor), so they are validated
/// before interpolation into Cypher; values always travel as parameters.
pub struct Neo4jStore {
    client: GraphClient,
}

impl Neo4jStore {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }
}

/// Labels and relationship types cannot be parameterized in Cypher.
/// Accept only plain identifiers before interpolating them.
fn cypher_ident(s: &str) -> Result<&str> {
    let mut chars = s.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if !valid {
        bail!("invalid graph identifier: {s:?}");
    }
    Ok(s)
}

fn bolt_value(v: &serde_json::Value) -> Option<BoltType> {
    match v {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(BoltType::Boolean(BoltBoolean::new(*b))),
        serde_json::Value::Number(n) => Some(match n.as_i64() {
            Some(i) => BoltType::Integer(BoltInteger::new(i)),
            None => BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or(0.0))),
        }),
        serde_json::Value::String(s) => Some(BoltType::String(BoltString::from(s.as_str()))),
        // Arrays and nested objects are stored as their JSON text.
        other => Some(BoltType::String(BoltString::from(
            other.to_string().as_str(),
        ))),
    }
}

fn props_to_bolt(props: &PropertyMap) -> BoltType {
    BoltType::Map(BoltMap::from_iter(props.iter().filter_map(|(k, v)| {
        bolt_value(v).map(|b| (BoltString::from(k.as_str()), b))
    })))
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn upsert_node(&self, row: &NodeRow) -> Result<NodeKey> {
        let label = cypher_ident(&row.label)?;
        let q = query(&format!(
            "MERGE (n:{label} {{id: $identity}}) SET n += $props"
        ))
        .param("identity", row.identity.as_str())
        .param("props", props_to_bolt(&row.properties));

        self.client
            .graph
            .run(q)
            .await
            .with_context(|| format!("upserting ({label}, {})", row.identity))?;

        Ok(row.key())
    }

    async fn upsert_edge(
        &self,
        rel_type: &str,
        from: &NodeKey,
        to: &NodeKey,
        properties: &PropertyMap,
    ) -> Result<()> {
        let rel = cypher_ident(rel_type)?;
        let from_label = cypher_ident(&from.label)?;
        let to_label = cypher_ident(&to.label)?;

        let q = query(&format!(
            "MATCH (a:{from_label} {{id: $from_id}}), (b:{to_label} {{id: $to_id}})
             MERGE (a)-[r:{rel}]->(b)
             SET r += $props"
        ))
        .param("from_id", from.identity.as_str())
        .param("to_id", to.identity.as_str())
        .param("props", props_to_bolt(properties));

        self.client
            .graph
            .run(q)
            .await
            .with_context(|| format!("merging ({})-[:{rel}]->({})", from.identity, to.identity))
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
        self.client
            .graph
            .run(query("MATCH (n) DETACH DELETE n"))
            .await
            .context("resetting graph")
    }

    async fn linked_pairs(
        &self,
        entity_label: &str,
        via_rel: &str,
        link_label: &str,
    ) -> Result<Vec<LinkedPair>> {
        let el = cypher_ident(entity_label)?;
        let via = cypher_ident(via_rel)?;
        let ll = cypher_ident(link_label)?;

        let q = query(&format!(
            "MATCH (a:{el})-[:{via}]->(l:{ll})<-[:{via}]-(b:{el})
             RETURN a.id AS a, b.id AS b, l.id AS link"
        ));

        let mut rows = Vec::new();
        let mut stream = self.client.graph.execute(q).await?;
        while let Some(row) = stream.next().await? {
            let a: String = row.get("a").unwrap_or_default();
            let b: String = row.get("b").unwrap_or_default();
            let link: String = row.get("link").unwrap_or_default();
            if a.is_empty() || b.is_empty() {
                continue;
            }
            rows.push(LinkedPair { a, b, link });
        }
        Ok(rows)
    }

    async fn weighted_edges(
        &self,
        entity_label: &str,
        rel_type: &str,
        weight_prop: &str,
    ) -> Result<Vec<WeightedEdge>> {
        let el = cypher_ident(entity_label)?;
        let rel = cypher_ident(rel_type)?;
        let prop = cypher_ident(weight_prop)?;

        let q = query(&format!(
            "MATCH (a:{el})-[r:{rel}]->(b:{el})
             RETURN a.id AS from, b.id AS to, r.{prop} AS weight"
        ));

        let mut edges = Vec::new();
        let mut stream = self.client.graph.execute(q).await?;
        while let Some(row) = stream.next().await? {
            let from: String = row.get("from").unwrap_or_default();
            let to: String = row.get("to").unwrap_or_default();
            // Scores may have been written as integers or floats.
            let weight = row
                .get::<f64>("weight")
                .ok()
                .or_else(|| row.get::<i64>("weight").ok().map(|v| v as f64));
            edges.push(WeightedEdge { from, to, weight });
        }
        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cypher_ident_accepts_plain_identifiers() {
        assert!(cypher_ident("Person").is_ok());
        assert!(cypher_ident("CO_WORKER").is_ok());
        assert!(cypher_ident("_internal").is_ok());
    }

    #[test]
    fn cypher_ident_rejects_injection_attempts() {
        assert!(cypher_ident("").is_err());
        assert!(cypher_ident("Person) DETACH DELETE (n").is_err());
        assert!(cypher_ident("9lives").is_err());
        assert!(cypher_ident("has space").is_err());
    }
}
