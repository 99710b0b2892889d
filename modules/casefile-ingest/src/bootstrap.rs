use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::info;

use casefile_common::Config;
use casefile_graph::{migrate::migrate, GraphClient, GraphStore, Neo4jStore};
use casefile_ontology::{FileSchemaStore, OntologyManager};

use crate::extractor::ReportExtractor;
use crate::queue::{report_queue, ReportSender};
use crate::worker::IngestWorker;

/// Everything a running ingestion process owns. No ambient globals: the
/// queue, store and ontology handles all live here and are passed by
/// reference where needed.
pub struct IngestRuntime {
    pub store: Arc<dyn GraphStore>,
    pub ontology: OntologyManager,
    pub sender: ReportSender,
    worker: JoinHandle<()>,
}

impl IngestRuntime {
    /// Wire up the full pipeline. Failures here (unreachable store,
    /// failed migrations) are fatal and stop the process before any
    /// ingestion begins. A missing ontology snapshot is not fatal; the
    /// built-in default takes over.
    pub async fn start(config: &Config, extractor: Arc<dyn ReportExtractor>) -> Result<Self> {
        info!("Casefile ingestion starting...");
        config.log_redacted();

        let client =
            GraphClient::connect(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password)
                .await
                .context("connecting to the graph store")?;
        migrate(&client).await.context("running graph migrations")?;

        let ontology =
            OntologyManager::load(Arc::new(FileSchemaStore::new(&config.schema_path))).await;

        let store: Arc<dyn GraphStore> = Arc::new(Neo4jStore::new(client));
        let (sender, receiver) = report_queue();
        let worker = IngestWorker::new(store.clone(), extractor, &ontology).spawn(receiver);

        Ok(Self {
            store,
            ontology,
            sender,
            worker,
        })
    }

    /// Drop the runtime's own producer handle and wait for the worker to
    /// drain the queue and exit. Other cloned senders keep the queue open
    /// until they are dropped too.
    pub async fn shutdown(self) {
        drop(self.sender);
        let _ = self.worker.await;
        info!("Ingestion shut down");
    }
}
