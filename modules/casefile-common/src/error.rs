use thiserror::Error;

#[derive(Error, Debug)]
pub enum CasefileError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Schema persistence error: {0}")]
    SchemaPersistence(String),

    #[error("Reset error: {0}")]
    Reset(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
