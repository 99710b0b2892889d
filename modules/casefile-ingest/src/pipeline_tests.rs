//! End-to-end ingestion scenarios: real queue, real worker, scripted
//! extractor, in-memory store. One behavior per test.

use std::collections::BTreeMap;
use std::sync::Arc;

use casefile_common::{labels, rels, Extraction, NodeCandidate, NodeKey, SourceTag};
use casefile_graph::testing::MemoryStore;
use casefile_ontology::OntologyManager;

use crate::queue::report_queue;
use crate::testing::{organization, person, relation, MockExtractor, NullSchemaStore};
use crate::worker::IngestWorker;

async fn run_worker(extractor: Arc<MockExtractor>, store: Arc<MemoryStore>, reports: &[&str]) {
    let ontology = OntologyManager::load(Arc::new(NullSchemaStore)).await;
    let worker = IngestWorker::new(store, extractor, &ontology);

    let (tx, rx) = report_queue();
    for text in reports {
        tx.submit(SourceTag::User, *text);
    }
    drop(tx);
    worker.run(rx).await;
}

#[tokio::test]
async fn batch_of_k_entities_gets_one_evidence_and_k_mentions() {
    let report = "Kim and Lee from Security met in the server room";
    let extractor = Arc::new(MockExtractor::new().on_text(
        report,
        Extraction {
            nodes: vec![
                person("sec-1001", "Kim"),
                person("sec-1002", "Lee"),
                organization("Security"),
            ],
            relationships: vec![
                relation("sec-1001", rels::WORKS_FOR, "Security"),
                relation("sec-1002", rels::WORKS_FOR, "Security"),
            ],
        },
    ));
    let store = Arc::new(MemoryStore::new());

    run_worker(extractor.clone(), store.clone(), &[report]).await;

    assert_eq!(store.node_count(labels::PERSON), 2);
    assert_eq!(store.node_count(labels::ORGANIZATION), 1);
    assert_eq!(store.edge_count(rels::WORKS_FOR), 2);

    // Exactly one Evidence node, one MENTIONED_IN edge per entity.
    let evidence = store.node_keys(labels::EVIDENCE);
    assert_eq!(evidence.len(), 1);
    assert_eq!(store.edge_count(rels::MENTIONED_IN), 3);
    for entity in ["sec-1001", "sec-1002"] {
        assert!(store
            .get_edge(
                rels::MENTIONED_IN,
                &NodeKey::new(labels::PERSON, entity),
                &evidence[0],
            )
            .is_some());
    }

    // The worker passed its startup-time label set to the extractor.
    let allowed = extractor.last_allowed_labels();
    assert!(allowed.contains(&labels::PERSON.to_string()));
    assert!(allowed.contains(&labels::EVIDENCE.to_string()));
}

#[tokio::test]
async fn empty_extraction_leaves_the_graph_untouched() {
    let store = Arc::new(MemoryStore::new());
    run_worker(
        Arc::new(MockExtractor::new()),
        store.clone(),
        &["nothing to see here"],
    )
    .await;

    assert_eq!(store.node_count(labels::PERSON), 0);
    assert_eq!(store.node_count(labels::EVIDENCE), 0);
    assert_eq!(store.edge_count(rels::MENTIONED_IN), 0);
}

#[tokio::test]
async fn failing_item_is_skipped_and_neighbors_survive() {
    let extractor = Arc::new(
        MockExtractor::new()
            .on_text("one", Extraction {
                nodes: vec![person("p1", "First")],
                relationships: vec![],
            })
            .fail_on("two")
            .on_text("three", Extraction {
                nodes: vec![person("p3", "Third")],
                relationships: vec![],
            }),
    );
    let store = Arc::new(MemoryStore::new());

    run_worker(extractor, store.clone(), &["one", "two", "three"]).await;

    assert!(store.get_node(&NodeKey::new(labels::PERSON, "p1")).is_some());
    assert!(store.get_node(&NodeKey::new(labels::PERSON, "p3")).is_some());
    assert_eq!(store.node_count(labels::PERSON), 2);
    // Evidence only for the two successful batches.
    assert_eq!(store.node_count(labels::EVIDENCE), 2);
}

#[tokio::test]
async fn persistence_failure_does_not_halt_the_worker() {
    let extractor = Arc::new(
        MockExtractor::new()
            .on_text("poisoned", Extraction {
                nodes: vec![NodeCandidate {
                    label: "Broken".to_string(),
                    identity: "x".to_string(),
                    properties: BTreeMap::new(),
                }],
                relationships: vec![],
            })
            .on_text("healthy", Extraction {
                nodes: vec![person("p1", "Kim")],
                relationships: vec![],
            }),
    );
    let store = Arc::new(MemoryStore::new());
    store.fail_on_label("Broken");

    run_worker(extractor, store.clone(), &["poisoned", "healthy"]).await;

    assert_eq!(store.node_count("Broken"), 0);
    assert_eq!(store.node_count(labels::PERSON), 1);
    assert_eq!(store.node_count(labels::EVIDENCE), 1);
}

#[tokio::test]
async fn symmetric_relationships_store_in_canonical_order() {
    let report = "Lee and Kim work side by side";
    let extractor = Arc::new(MockExtractor::new().on_text(
        report,
        Extraction {
            nodes: vec![person("zeta", "Lee"), person("alpha", "Kim")],
            // Extractor emitted the pair in reverse identity order.
            relationships: vec![relation("zeta", rels::CO_WORKER, "alpha")],
        },
    ));
    let store = Arc::new(MemoryStore::new());

    run_worker(extractor, store.clone(), &[report]).await;

    assert_eq!(store.edge_count(rels::CO_WORKER), 1);
    assert!(store
        .get_edge(
            rels::CO_WORKER,
            &NodeKey::new(labels::PERSON, "alpha"),
            &NodeKey::new(labels::PERSON, "zeta"),
        )
        .is_some());
}

#[tokio::test]
async fn relationship_to_unknown_endpoint_is_dropped() {
    let report = "Kim interacted with someone unidentified";
    let extractor = Arc::new(MockExtractor::new().on_text(
        report,
        Extraction {
            nodes: vec![person("p1", "Kim")],
            relationships: vec![relation("p1", rels::INTERACTED, "ghost")],
        },
    ));
    let store = Arc::new(MemoryStore::new());

    run_worker(extractor, store.clone(), &[report]).await;

    assert_eq!(store.edge_count(rels::INTERACTED), 0);
    // The node and its provenance still land.
    assert_eq!(store.node_count(labels::PERSON), 1);
    assert_eq!(store.edge_count(rels::MENTIONED_IN), 1);
}

#[tokio::test]
async fn reingesting_the_same_report_text_does_not_duplicate_entities() {
    let report = "Kim from Security badged in";
    let extraction = Extraction {
        nodes: vec![person("sec-1001", "Kim")],
        relationships: vec![],
    };
    let extractor = Arc::new(MockExtractor::new().on_text(report, extraction));
    let store = Arc::new(MemoryStore::new());

    run_worker(extractor, store.clone(), &[report, report]).await;

    // Entities merge; evidence is per-batch by design.
    assert_eq!(store.node_count(labels::PERSON), 1);
    assert_eq!(store.node_count(labels::EVIDENCE), 2);
}
