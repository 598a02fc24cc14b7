pub mod analysis;
pub mod schema;
pub mod severity;

pub use analysis::{AnalysisFindings, AnalysisResult, ContractViolation, Discrepancy, SCORE_RANGE};
pub use schema::{SchemaKind, SchemaNode, analysis_schema};
pub use severity::{Category, Severity};
