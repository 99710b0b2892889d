use anyhow::Result;

use casefile_ontology::OntologyManager;

use crate::extractor::GraphAnswerer;

/// Answer a question about the graph. The core contributes the schema
/// description (node/relationship vocabulary plus property-mapping hints)
/// and delegates the reasoning to the answering capability.
pub async fn ask(
    answerer: &dyn GraphAnswerer,
    ontology: &OntologyManager,
    question: &str,
) -> Result<String> {
    let schema_description = format!(
        "{}\n{}",
        ontology.instruction_string(),
        ontology.qa_mapping()
    );
    answerer.answer(question, &schema_description).await
}
