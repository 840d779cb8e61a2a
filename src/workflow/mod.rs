pub mod quiz_flow;
pub mod run_state;

pub use quiz_flow::{AnalyzeTask, QuizFlow, SubmitAnswer};
pub use run_state::RunState;
