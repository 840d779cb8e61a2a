//! 答案计算器 - 业务能力层
//!
//! 当任务带附件时，把文件的统计摘要交给 LLM 重算精确答案。
//! 任何失败都不向调用方抛错：原任务（连同它已有的答案）原样返回。

use tracing::{info, warn};

use crate::models::{ProcessedFile, QuizTask};
use crate::services::task_analyzer::extract_json_object;
use crate::services::LlmService;

/// 答案计算器
pub struct AnswerComputer {
    llm: LlmService,
}

impl AnswerComputer {
    pub fn new(llm: LlmService) -> Self {
        Self { llm }
    }

    /// 基于文件数据重算答案
    ///
    /// 仅当 LLM 响应里解析出含 `answer` 字段的 JSON 对象时，
    /// 才覆盖 `task.answer`；否则任务原样返回。
    pub async fn refine(&self, mut task: QuizTask, file: &ProcessedFile) -> QuizTask {
        let prompt = build_compute_prompt(&task, file);

        let response = match self
            .llm
            .send_to_llm(
                &prompt,
                Some("You are a precise data analyst. Provide exact numerical answers."),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("⚠️ 答案重算失败: {}，保留原答案", e);
                return task;
            }
        };

        match extract_json_object(&response) {
            Some(mut value) => match value.get_mut("answer") {
                Some(answer) if !answer.is_null() => {
                    let answer = answer.take();
                    info!("✓ LLM 计算出答案: {}", answer);
                    task.answer = Some(answer.into());
                    task
                }
                _ => {
                    warn!("⚠️ LLM 响应缺少 answer 字段，保留原答案");
                    task
                }
            },
            None => {
                warn!("⚠️ LLM 响应中无 JSON 对象，保留原答案");
                task
            }
        }
    }
}

/// 构建答案重算提示词
fn build_compute_prompt(task: &QuizTask, file: &ProcessedFile) -> String {
    format!(
        r#"Based on the quiz task and file data below, compute the exact answer.

TASK: {task_type}

FILE DATA:
{file_data}

QUESTION CONTEXT:
{context}

Provide the exact answer as a JSON object:
{{
    "answer": <the computed answer>,
    "explanation": "brief explanation"
}}
"#,
        task_type = task.task_type,
        file_data = file.describe_for_prompt(),
        context = if task.reasoning.is_empty() {
            "No context"
        } else {
            &task.reasoning
        },
    )
}
