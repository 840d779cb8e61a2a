//! # Quiz Chain Solver
//!
//! 一个用于自动求解链式测验的 Rust 服务
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Browser），只暴露能力
//! - `PageRenderer` - 唯一的浏览器 owner，提供 render() 能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个测验
//! - `TaskAnalyzer` - 页面 → 结构化任务
//! - `FileProcessor` - 附件下载与解析
//! - `AnswerComputer` - 基于文件数据重算答案
//! - `SubmissionClient` - 答案提交
//! - `LlmService` - LLM 对话能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一条测验链"的完整求解流程
//! - `RunState` - 循环状态（当前 URL + 尝试计数 + 时间预算）
//! - `QuizFlow` - 流程编排（analyze → file → compute → submit）
//!
//! ### ④ 接口层（Server）
//! - `server` - HTTP 端点，校验请求并委托流程层

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod server;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::launch_headless_browser;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::PageRenderer;
pub use models::{AnswerValue, QuizTask, RunReport, RunStatus, SubmissionResult};
pub use server::{create_router, AppState};
pub use workflow::{QuizFlow, RunState};
