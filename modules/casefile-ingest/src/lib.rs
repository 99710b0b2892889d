pub mod answer;
pub mod bootstrap;
pub mod extractor;
pub mod master_data;
pub mod queue;
pub mod simulator;
pub mod testing;
pub mod worker;

#[cfg(test)]
mod pipeline_tests;

pub use bootstrap::IngestRuntime;
pub use extractor::{GraphAnswerer, ReportExtractor};
pub use queue::{report_queue, ReportReceiver, ReportSender};
pub use worker::IngestWorker;
