use anyhow::Result;
use tracing::info;

use casefile_common::{labels, rels, MasterRecord, NodeRow, PropertyMap};
use casefile_graph::GraphStore;

/// Direct injection of bulk master data: records go straight through the
/// store, bypassing extraction, so no property is ever lost to the LLM.
pub struct MasterDataLoader<'a> {
    store: &'a dyn GraphStore,
}

impl<'a> MasterDataLoader<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self { store }
    }

    /// Persist every record. Returns the number of Person rows applied.
    pub async fn load(&self, records: &[MasterRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let person_rows: Vec<NodeRow> = records.iter().map(person_row).collect();
        let applied = self.store.bulk_upsert(&person_rows).await?;

        for record in records {
            self.link_record(record).await?;
        }

        info!(records = records.len(), applied, "Master data loaded");
        Ok(applied)
    }

    async fn link_record(&self, record: &MasterRecord) -> Result<()> {
        let person = person_row(record).key();

        let team = self
            .store
            .upsert_node(&NodeRow::new(labels::ORGANIZATION, record.team.clone()).with("type", "Team"))
            .await?;
        self.store
            .upsert_edge(rels::WORKS_FOR, &person, &team, &PropertyMap::new())
            .await?;

        let company = self
            .store
            .upsert_node(
                &NodeRow::new(labels::ORGANIZATION, record.company.clone()).with("type", "Company"),
            )
            .await?;
        self.store
            .upsert_edge(rels::PART_OF, &team, &company, &PropertyMap::new())
            .await?;

        let major = self
            .store
            .upsert_node(&NodeRow::new(labels::MAJOR, record.major.clone()))
            .await?;
        self.store
            .upsert_edge(rels::STUDIED, &person, &major, &PropertyMap::new())
            .await?;

        // The "none" sentinel yields an empty list and therefore no edges.
        for cert in record.certification_list() {
            let cert_key = self
                .store
                .upsert_node(&NodeRow::new(labels::CERTIFICATE, cert))
                .await?;
            self.store
                .upsert_edge(rels::HAS_CERT, &person, &cert_key, &PropertyMap::new())
                .await?;
        }

        Ok(())
    }
}

fn person_row(record: &MasterRecord) -> NodeRow {
    NodeRow::new(labels::PERSON, record.id.clone())
        .with("name", record.name.clone())
        .with("age", record.age)
        .with("gender", record.gender.clone())
        .with("role", record.role.clone())
        .with("team", record.team.clone())
        .with("company", record.company.clone())
        .with("major", record.major.clone())
}
