pub mod aggregate;
pub mod client;
pub mod inference;
pub mod migrate;
pub mod neo4j;
pub mod store;
pub mod testing;
#[cfg(feature = "test-utils")]
pub mod testutil;

pub use aggregate::InteractionAggregator;
pub use client::GraphClient;
pub use inference::{InferenceRule, StructuralInference};
pub use neo4j::Neo4jStore;
pub use store::{GraphStore, LinkedPair, WeightedEdge};
