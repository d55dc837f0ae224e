pub mod checkpoint_store;
pub mod completion_registry;
pub mod input_scanner;
pub mod manifest_writer;
pub mod report_writer;
pub mod summary_aggregator;

pub use checkpoint_store::CheckpointStore;
pub use manifest_writer::ManifestWriter;
pub use report_writer::ReportWriter;
pub use summary_aggregator::SummaryAggregator;
