use anyhow::Result;
use async_trait::async_trait;

use casefile_common::Extraction;

/// The natural-language extraction capability. Implemented outside the
/// core (typically LLM-backed); the candidate types in casefile-common
/// derive `JsonSchema` so an implementor can request structured output.
///
/// An empty `Extraction` is a valid answer and means the text yielded
/// nothing usable; the worker tolerates it without erroring.
#[async_trait]
pub trait ReportExtractor: Send + Sync {
    async fn extract(
        &self,
        text: &str,
        allowed_labels: &[String],
        guidance: &str,
    ) -> Result<Extraction>;
}

/// The natural-language question-answering capability. The core supplies
/// only a schema description and property-mapping hints; the reasoning
/// lives behind this trait.
#[async_trait]
pub trait GraphAnswerer: Send + Sync {
    async fn answer(&self, question: &str, schema_description: &str) -> Result<String>;
}
