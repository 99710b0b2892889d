pub mod manager;
pub mod schema;
pub mod store;

pub use manager::{OntologyManager, SchemaProposal};
pub use schema::{NodeSpec, SchemaDocument};
pub use store::{FileSchemaStore, SchemaStore};
