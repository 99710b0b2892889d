use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::schema::SchemaDocument;

/// Durable slot holding the persisted ontology document.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Read the persisted document. `Ok(None)` means no snapshot exists yet.
    async fn read(&self) -> Result<Option<SchemaDocument>>;

    /// Replace the persisted document atomically.
    async fn write(&self, document: &SchemaDocument) -> Result<()>;
}

/// JSON file on disk, the default persistence backend.
pub struct FileSchemaStore {
    path: PathBuf,
}

impl FileSchemaStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl SchemaStore for FileSchemaStore {
    async fn read(&self) -> Result<Option<SchemaDocument>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => {
                let doc = serde_json::from_str(&raw)
                    .with_context(|| format!("parsing schema file {}", self.path.display()))?;
                Ok(Some(doc))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    async fn write(&self, document: &SchemaDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(document)?;
        // Write to a sibling temp file first so a crash never leaves a
        // half-written snapshot behind.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSchemaStore::new(dir.path().join("schema.json"));
        assert!(store.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSchemaStore::new(dir.path().join("schema.json"));

        let doc = SchemaDocument::default_schema();
        store.write(&doc).await.unwrap();

        let back = store.read().await.unwrap().expect("snapshot exists");
        assert_eq!(doc, back);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error_not_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let store = FileSchemaStore::new(&path);
        assert!(store.read().await.is_err());
    }
}
