pub mod file;
pub mod report;
pub mod task;

pub use file::{FileKind, FilePayload, NumericStats, ProcessedFile, TableAnalysis};
pub use report::{RunReport, RunStatus, SubmissionResult};
pub use task::{AnswerValue, QuizTask};
