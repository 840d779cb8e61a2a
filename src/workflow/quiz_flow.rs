//! 测验求解流程 - 流程层
//!
//! 核心职责：在一条测验链上编排完整的求解循环
//!
//! 每轮迭代：
//! 1. 解析当前页面（失败对整次运行是致命的）
//! 2. 有附件则下载解析，并让 LLM 基于数据重算答案（失败降级）
//! 3. 缺少提交地址或答案则中止，不提交
//! 4. 提交答案，按结果跳链 / 原地重试 / 结束
//!
//! 循环受时间预算（默认 170 秒）和尝试上限（默认 5 次）双重约束。

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::PageRenderer;
use crate::models::{AnswerValue, QuizTask, RunReport, RunStatus, SubmissionResult};
use crate::services::{
    AnswerComputer, FileProcessor, LlmService, SubmissionClient, TaskAnalyzer,
};
use crate::utils::logging::{log_request, log_response};
use crate::utils::web::is_valid_url;
use crate::workflow::run_state::RunState;

/// 迭代间的礼貌延迟
const ATTEMPT_DELAY: Duration = Duration::from_secs(1);

/// 任务解析能力（流程层依赖的接口）
#[async_trait]
pub trait AnalyzeTask: Send + Sync {
    /// 解析测验页面；`previous_failure` 携带上一次被拒绝的原因
    async fn analyze(&self, quiz_url: &str, previous_failure: Option<&str>) -> Result<QuizTask>;
}

#[async_trait]
impl AnalyzeTask for TaskAnalyzer {
    async fn analyze(&self, quiz_url: &str, previous_failure: Option<&str>) -> Result<QuizTask> {
        TaskAnalyzer::analyze(self, quiz_url, previous_failure).await
    }
}

/// 答案提交能力（流程层依赖的接口）
#[async_trait]
pub trait SubmitAnswer: Send + Sync {
    async fn submit(
        &self,
        email: &str,
        secret: &str,
        quiz_url: &str,
        answer: &AnswerValue,
        submit_url: &str,
    ) -> SubmissionResult;
}

#[async_trait]
impl SubmitAnswer for SubmissionClient {
    async fn submit(
        &self,
        email: &str,
        secret: &str,
        quiz_url: &str,
        answer: &AnswerValue,
        submit_url: &str,
    ) -> SubmissionResult {
        SubmissionClient::submit(self, email, secret, quiz_url, answer, submit_url).await
    }
}

/// 测验求解流程
///
/// - 编排完整的求解循环
/// - 不持有浏览器资源（渲染器在解析器内部）
/// - 只依赖业务能力（services）
pub struct QuizFlow<A = TaskAnalyzer, S = SubmissionClient> {
    analyzer: A,
    files: FileProcessor,
    computer: AnswerComputer,
    submitter: S,
    quiz_timeout: Duration,
    max_attempts: u32,
}

impl QuizFlow {
    /// 创建生产配置的求解流程
    pub fn new(config: &Config, renderer: Arc<PageRenderer>) -> Self {
        Self {
            analyzer: TaskAnalyzer::new(renderer, LlmService::new(config)),
            files: FileProcessor::new(config),
            computer: AnswerComputer::new(LlmService::new(config)),
            submitter: SubmissionClient::new(),
            quiz_timeout: Duration::from_secs(config.quiz_timeout_secs),
            max_attempts: config.max_attempts,
        }
    }
}

impl<A: AnalyzeTask, S: SubmitAnswer> QuizFlow<A, S> {
    /// 求解一条完整的测验链
    ///
    /// 解析失败向上传播（致命）；其余失败都被吸收为循环内的分支。
    pub async fn solve_quiz(&self, email: &str, secret: &str, quiz_url: &str) -> Result<RunReport> {
        let mut state = RunState::new(quiz_url, self.max_attempts, self.quiz_timeout);
        let mut last_failure: Option<String> = None;

        log_request(email, quiz_url, "开始求解");

        while let Some(current_url) = state.current_url() {
            if state.deadline_exceeded() {
                warn!("⏰ 时间预算耗尽 ({:.1} 秒)", state.elapsed_secs());
                break;
            }

            state.begin_attempt();
            if state.attempts_exceeded() {
                warn!("已达最大尝试次数 ({})", self.max_attempts);
                break;
            }

            info!("[尝试 {}] 🧩 正在求解: {}", state.attempts(), current_url);

            // ========== 步骤 1: 任务解析（失败致命） ==========
            let mut task = self
                .analyzer
                .analyze(&current_url, last_failure.as_deref())
                .await?;
            info!(
                "[尝试 {}] ✓ 任务类型: {}",
                state.attempts(),
                task.task_type
            );

            // ========== 步骤 2: 附件处理（失败降级） ==========
            if let Some(file_url) = task.file_url.clone() {
                match self.files.process(&file_url).await {
                    Ok(file) if file.has_structured_data() => {
                        task = self.computer.refine(task, &file).await;
                    }
                    Ok(file) => {
                        info!(
                            "[尝试 {}] 文件类型 {} 无结构化数据，沿用解析阶段的答案",
                            state.attempts(),
                            file.kind.as_str()
                        );
                    }
                    Err(e) => {
                        warn!(
                            "[尝试 {}] ⚠️ 文件处理失败，降级继续: {}",
                            state.attempts(),
                            e
                        );
                    }
                }
            }

            // ========== 步骤 3: 前置检查 ==========
            let (Some(submit_url), Some(answer)) = (task.submit_url.clone(), task.answer.clone())
            else {
                error!("❌ 缺少提交 URL 或答案，中止求解");
                break;
            };

            // ========== 步骤 4: 提交 ==========
            let result = self
                .submitter
                .submit(email, secret, &current_url, &answer, &submit_url)
                .await;

            if result.correct {
                info!("[尝试 {}] ✅ 答案正确!", state.attempts());
                last_failure = None;

                match result.url.filter(|u| is_valid_url(u)) {
                    Some(next_url) => {
                        info!("➡️ 进入下一个测验: {}", next_url);
                        state.advance(next_url);
                    }
                    None => {
                        info!("🎉 测验链全部完成!");
                        log_response(email, quiz_url, true, "全部测验已解出");
                        return Ok(RunReport {
                            status: RunStatus::Completed,
                            attempts: state.attempts(),
                            time_taken: state.elapsed_secs(),
                        });
                    }
                }
            } else {
                let reason = result
                    .reason
                    .unwrap_or_else(|| "Unknown error".to_string());
                warn!("[尝试 {}] ⚠️ 答案错误: {}", state.attempts(), reason);

                match result
                    .url
                    .filter(|u| is_valid_url(u) && *u != current_url)
                {
                    Some(next_url) => {
                        // 服务端指示"继续前进"
                        info!("➡️ 答案未通过，但服务端给出下一站: {}", next_url);
                        state.advance(next_url);
                        last_failure = None;
                    }
                    None => {
                        // 留在原 URL，下一轮解析时携带失败上下文
                        last_failure = Some(reason);
                    }
                }
            }

            // 迭代间的礼貌延迟
            sleep(ATTEMPT_DELAY).await;
        }

        let report = RunReport {
            status: if state.attempts() > 0 {
                RunStatus::Partial
            } else {
                RunStatus::Failed
            },
            attempts: state.attempts(),
            time_taken: state.elapsed_secs(),
        };
        log_response(
            email,
            quiz_url,
            false,
            &format!(
                "完成 {} 次尝试，耗时 {:.2} 秒",
                report.attempts, report.time_taken
            ),
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 按脚本返回任务的解析器，并记录每次调用
    struct ScriptedAnalyzer {
        task: QuizTask,
        calls: Mutex<Vec<(String, Option<String>)>>,
        fail: bool,
    }

    impl ScriptedAnalyzer {
        fn returning(task: QuizTask) -> Self {
            Self {
                task,
                calls: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                task: QuizTask::fallback(""),
                calls: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl AnalyzeTask for ScriptedAnalyzer {
        async fn analyze(
            &self,
            quiz_url: &str,
            previous_failure: Option<&str>,
        ) -> Result<QuizTask> {
            self.calls
                .lock()
                .unwrap()
                .push((quiz_url.to_string(), previous_failure.map(String::from)));
            if self.fail {
                anyhow::bail!("渲染失败");
            }
            Ok(self.task.clone())
        }
    }

    /// 按脚本吐出提交结果的提交器
    struct ScriptedSubmitter {
        script: Mutex<VecDeque<SubmissionResult>>,
        submitted_to: Mutex<Vec<String>>,
    }

    impl ScriptedSubmitter {
        fn with_script(results: Vec<SubmissionResult>) -> Self {
            Self {
                script: Mutex::new(results.into()),
                submitted_to: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SubmitAnswer for ScriptedSubmitter {
        async fn submit(
            &self,
            _email: &str,
            _secret: &str,
            quiz_url: &str,
            _answer: &AnswerValue,
            _submit_url: &str,
        ) -> SubmissionResult {
            self.submitted_to.lock().unwrap().push(quiz_url.to_string());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| SubmissionResult::from_failure("脚本耗尽"))
        }
    }

    fn solvable_task() -> QuizTask {
        QuizTask {
            task_type: "scripted".to_string(),
            file_url: None,
            submit_url: Some("https://q.example.com/submit".to_string()),
            answer: Some(AnswerValue::Number(42.0)),
            reasoning: String::new(),
        }
    }

    fn test_flow<A: AnalyzeTask, S: SubmitAnswer>(
        analyzer: A,
        submitter: S,
        timeout: Duration,
    ) -> QuizFlow<A, S> {
        let config = Config::default();
        QuizFlow {
            analyzer,
            files: FileProcessor::new(&config),
            computer: AnswerComputer::new(LlmService::new(&config)),
            submitter,
            quiz_timeout: timeout,
            max_attempts: 5,
        }
    }

    const URL_A: &str = "https://q.example.com/quiz-a";
    const URL_B: &str = "https://q.example.com/quiz-b";

    #[tokio::test(start_paused = true)]
    async fn test_chain_completes_after_two_quizzes() {
        let submitter = ScriptedSubmitter::with_script(vec![
            SubmissionResult {
                correct: true,
                url: Some(URL_B.to_string()),
                reason: None,
            },
            SubmissionResult {
                correct: true,
                url: None,
                reason: None,
            },
        ]);
        let flow = test_flow(
            ScriptedAnalyzer::returning(solvable_task()),
            submitter,
            Duration::from_secs(170),
        );

        let report = flow
            .solve_quiz("a@b.com", "secret", URL_A)
            .await
            .unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.attempts, 2);
        // 先访问 A，再访问 B
        let visited = flow.submitter.submitted_to.lock().unwrap().clone();
        assert_eq!(visited, vec![URL_A.to_string(), URL_B.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_incorrect_exhausts_attempts() {
        let incorrect = SubmissionResult {
            correct: false,
            url: None,
            reason: Some("wrong".to_string()),
        };
        let flow = test_flow(
            ScriptedAnalyzer::returning(solvable_task()),
            ScriptedSubmitter::with_script(vec![incorrect; 5]),
            Duration::from_secs(170),
        );

        let report = flow
            .solve_quiz("a@b.com", "secret", URL_A)
            .await
            .unwrap();

        // 边界：第 6 次递增越过上限后停止
        assert_eq!(report.status, RunStatus::Partial);
        assert_eq!(report.attempts, 6);
        assert_eq!(flow.submitter.submitted_to.lock().unwrap().len(), 5);

        // 第 2 次起解析应携带上一轮的失败原因
        let calls = flow.analyzer.calls.lock().unwrap();
        assert_eq!(calls.len(), 5);
        assert!(calls[0].1.is_none());
        assert_eq!(calls[1].1.as_deref(), Some("wrong"));
        assert_eq!(calls[4].1.as_deref(), Some("wrong"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_incorrect_with_alternate_url_moves_on() {
        let flow = test_flow(
            ScriptedAnalyzer::returning(solvable_task()),
            ScriptedSubmitter::with_script(vec![
                SubmissionResult {
                    correct: false,
                    url: Some(URL_B.to_string()),
                    reason: Some("moved".to_string()),
                },
                SubmissionResult {
                    correct: true,
                    url: None,
                    reason: None,
                },
            ]),
            Duration::from_secs(170),
        );

        let report = flow
            .solve_quiz("a@b.com", "secret", URL_A)
            .await
            .unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.attempts, 2);

        // 服务端指示前进后，失败上下文不应带入新页面
        let calls = flow.analyzer.calls.lock().unwrap();
        assert_eq!(calls[1].0, URL_B);
        assert!(calls[1].1.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_answer_aborts_without_submitting() {
        let mut task = solvable_task();
        task.answer = None;

        let flow = test_flow(
            ScriptedAnalyzer::returning(task),
            ScriptedSubmitter::with_script(vec![]),
            Duration::from_secs(170),
        );

        let report = flow
            .solve_quiz("a@b.com", "secret", URL_A)
            .await
            .unwrap();

        assert_eq!(report.status, RunStatus::Partial);
        assert_eq!(report.attempts, 1);
        assert!(flow.submitter.submitted_to.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_analysis_failure_is_fatal() {
        let flow = test_flow(
            ScriptedAnalyzer::failing(),
            ScriptedSubmitter::with_script(vec![]),
            Duration::from_secs(170),
        );

        let result = flow.solve_quiz("a@b.com", "secret", URL_A).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_deadline_yields_failed_without_attempts() {
        let flow = test_flow(
            ScriptedAnalyzer::returning(solvable_task()),
            ScriptedSubmitter::with_script(vec![]),
            Duration::ZERO,
        );

        let report = flow
            .solve_quiz("a@b.com", "secret", URL_A)
            .await
            .unwrap();

        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_next_url_completes_chain() {
        // correct=true 但给了非法 URL：视为链终点
        let flow = test_flow(
            ScriptedAnalyzer::returning(solvable_task()),
            ScriptedSubmitter::with_script(vec![SubmissionResult {
                correct: true,
                url: Some("not a url".to_string()),
                reason: None,
            }]),
            Duration::from_secs(170),
        );

        let report = flow
            .solve_quiz("a@b.com", "secret", URL_A)
            .await
            .unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.attempts, 1);
    }
}
