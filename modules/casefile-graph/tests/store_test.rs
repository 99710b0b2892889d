//! Integration tests for the Neo4j-backed store and the derivation engines.
//!
//! Requirements: Docker (for Neo4j via testcontainers)
//!
//! Run with: cargo test -p casefile-graph --features test-utils --test store_test

#![cfg(feature = "test-utils")]

use casefile_common::{labels, rels, NodeKey, NodeRow, PropertyMap};
use casefile_graph::{
    migrate::migrate, testutil::neo4j_container, GraphStore, InteractionAggregator, Neo4jStore,
    StructuralInference,
};

#[tokio::test]
async fn upsert_merges_by_identity() {
    let (_container, client) = neo4j_container().await;
    migrate(&client).await.unwrap();
    let store = Neo4jStore::new(client);

    store
        .upsert_node(&NodeRow::new(labels::PERSON, "sec-1001").with("name", "Kim"))
        .await
        .unwrap();
    store
        .upsert_node(&NodeRow::new(labels::PERSON, "sec-1001").with("team", "Security"))
        .await
        .unwrap();

    let rows = vec![
        NodeRow::new(labels::PERSON, "sec-1001"),
        NodeRow::new(labels::PERSON, "sec-1002"),
    ];
    let applied = store.bulk_upsert(&rows).await.unwrap();
    assert_eq!(applied, 2);
}

#[tokio::test]
async fn inference_and_aggregation_round_trip() {
    let (_container, client) = neo4j_container().await;
    migrate(&client).await.unwrap();
    let store = Neo4jStore::new(client);

    // Endpoints must exist before edges: upsert_edge matches, never creates.
    store
        .upsert_node(&NodeRow::new(labels::ORGANIZATION, "security"))
        .await
        .unwrap();
    for id in ["p1", "p2", "p3"] {
        store.upsert_node(&NodeRow::new(labels::PERSON, id)).await.unwrap();
        store
            .upsert_edge(
                rels::WORKS_FOR,
                &NodeKey::new(labels::PERSON, id),
                &NodeKey::new(labels::ORGANIZATION, "security"),
                &PropertyMap::new(),
            )
            .await
            .unwrap();
    }

    let engine = StructuralInference::new();
    assert_eq!(engine.run(&store).await.unwrap(), 3);
    // Idempotent on re-run.
    assert_eq!(engine.run(&store).await.unwrap(), 3);

    let mut score = PropertyMap::new();
    score.insert("score".to_string(), 3.into());
    store
        .upsert_edge(
            rels::INTERACTED,
            &NodeKey::new(labels::PERSON, "p1"),
            &NodeKey::new(labels::PERSON, "p2"),
            &score,
        )
        .await
        .unwrap();
    score.insert("score".to_string(), 5.into());
    store
        .upsert_edge(
            rels::INTERACTED,
            &NodeKey::new(labels::PERSON, "p2"),
            &NodeKey::new(labels::PERSON, "p1"),
            &score,
        )
        .await
        .unwrap();

    assert_eq!(InteractionAggregator::run(&store).await.unwrap(), 1);
    assert_eq!(InteractionAggregator::run(&store).await.unwrap(), 1);

    store.reset_all().await.unwrap();
}
