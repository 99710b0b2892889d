use neo4rs::query;
use tracing::{info, warn};

use casefile_common::labels;

use crate::client::GraphClient;

/// Run idempotent schema migrations: identity uniqueness per core label.
/// Dynamically discovered labels get no constraint; the store's MERGE
/// semantics still keep them duplicate-free.
pub async fn migrate(client: &GraphClient) -> Result<(), neo4rs::Error> {
    let g = &client.graph;

    info!("Running schema migrations...");

    let core_labels = [
        labels::PERSON,
        labels::ORGANIZATION,
        labels::EVENT,
        labels::CERTIFICATE,
        labels::MAJOR,
        labels::EVIDENCE,
    ];

    for label in core_labels {
        let stmt = format!(
            "CREATE CONSTRAINT {}_id_unique IF NOT EXISTS FOR (n:{label}) REQUIRE n.id IS UNIQUE",
            label.to_lowercase()
        );
        run_ignoring_exists(g, &stmt).await?;
    }

    info!("Identity uniqueness constraints in place");
    Ok(())
}

// IF NOT EXISTS covers re-runs; older servers without it surface an
// "already exists"/"equivalent" error instead, which is just as benign.
async fn run_ignoring_exists(g: &neo4rs::Graph, cypher: &str) -> Result<(), neo4rs::Error> {
    match g.run(query(cypher)).await {
        Ok(_) => Ok(()),
        Err(e) => {
            let msg = e.to_string().to_lowercase();
            if msg.contains("already exists") || msg.contains("equivalent") {
                warn!(
                    "Already exists (skipped): {}",
                    cypher.chars().take(80).collect::<String>()
                );
                Ok(())
            } else {
                Err(e)
            }
        }
    }
}
