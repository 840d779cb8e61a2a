pub mod answer_computer;
pub mod file_processor;
pub mod llm_service;
pub mod submission;
pub mod tabular;
pub mod task_analyzer;

pub use answer_computer::AnswerComputer;
pub use file_processor::FileProcessor;
pub use llm_service::LlmService;
pub use submission::SubmissionClient;
pub use task_analyzer::TaskAnalyzer;
