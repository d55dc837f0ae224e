pub mod canonical_id;
pub mod diagnostic;
pub mod item;
pub mod report;
pub mod result;

pub use canonical_id::CanonicalId;
pub use diagnostic::{DiagnosticRecord, DiagnosticValue, Scalar, SummaryRegistry};
pub use item::{InputItem, ModelFormat};
pub use report::{AggregatedReport, FieldTable, FlattenedSet, ReportRow};
pub use result::{ItemOutcome, ModelDocument, ProcessingResult, RawModel};
