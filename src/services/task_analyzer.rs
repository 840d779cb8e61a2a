//! 任务解析器 - 业务能力层
//!
//! 把渲染后的测验页面内容变成结构化的 `QuizTask`：
//! 渲染 → base64 解码 → LLM 解析 → JSON 提取 → 手动兜底。
//!
//! 保证：只要渲染成功，本模块总会返回一个 `QuizTask`
//! （可能 answer / submit_url 为空）；渲染或网络失败
//! 作为解析步骤的硬失败向上传播。

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::infrastructure::PageRenderer;
use crate::models::QuizTask;
use crate::services::LlmService;
use crate::utils::encoding::{decode_base64_text, extract_base64_from_html};
use crate::utils::web::{extract_urls, truncate_text};

/// 手动兜底时识别为数据文件的扩展名
const FILE_EXTENSIONS: &[&str] = &[
    ".pdf", ".csv", ".xlsx", ".xls", ".json", ".png", ".jpg", ".jpeg", ".gif",
];

/// 任务解析器
pub struct TaskAnalyzer {
    renderer: Arc<PageRenderer>,
    llm: LlmService,
}

impl TaskAnalyzer {
    pub fn new(renderer: Arc<PageRenderer>, llm: LlmService) -> Self {
        Self { renderer, llm }
    }

    /// 解析测验页面，返回结构化任务
    ///
    /// `previous_failure` 为上一次提交被拒绝的原因；
    /// 存在时会嵌入提示词，让模型避开上次的错误答案。
    pub async fn analyze(&self, quiz_url: &str, previous_failure: Option<&str>) -> Result<QuizTask> {
        // 渲染页面（页面脚本会被执行）
        let (html, mut text_content) = self
            .renderer
            .render(quiz_url)
            .await
            .with_context(|| format!("渲染测验页面失败: {}", quiz_url))?;

        // 页面可能把真实题面藏在 base64 里
        if let Some(encoded) = extract_base64_from_html(&html) {
            if let Some(decoded) = decode_base64_text(&encoded) {
                info!("✓ 从页面中解码出 base64 内容");
                text_content = decoded;
            }
        }

        info!("📄 测验内容长度: {} 字符", text_content.len());

        // LLM 解析
        let prompt = build_analysis_prompt(&text_content, previous_failure);
        match self
            .llm
            .send_to_llm(
                &prompt,
                Some("You are a helpful data analysis assistant that provides structured JSON responses."),
            )
            .await
        {
            Ok(response) => {
                debug!("LLM 响应预览: {}", truncate_text(&response, 500));
                if let Some(task) = parse_task_from_response(&response) {
                    return Ok(task);
                }
                warn!("⚠️ LLM 响应中无法提取任务 JSON，回退到手动提取");
            }
            Err(e) => {
                warn!("⚠️ LLM 解析失败: {}，回退到手动提取", e);
            }
        }

        Ok(manual_extract(&text_content))
    }
}

/// 构建任务解析提示词
fn build_analysis_prompt(quiz_content: &str, previous_failure: Option<&str>) -> String {
    let mut prompt = format!(
        "You are an expert data analyst solving a quiz task. Analyze the following quiz content and provide a solution.\n\
         \n\
         QUIZ CONTENT:\n{quiz_content}\n"
    );

    if let Some(reason) = previous_failure {
        prompt.push_str(&format!(
            "\nPREVIOUS ATTEMPT (FAILED):\n{reason}\nDo not repeat the same answer.\n"
        ));
    }

    prompt.push_str(
        r#"
INSTRUCTIONS:
1. Read the quiz question carefully
2. Identify what needs to be done (download file, analyze data, etc.)
3. Identify the submit URL and required payload format
4. Provide the exact answer in the required format
5. Be precise with numbers, strings, and data types

Your response must be a JSON object with this structure:
{
    "task_type": "description of the task (e.g., 'sum column in PDF table')",
    "file_url": "URL of file to download (if any)" or null,
    "submit_url": "URL where answer should be submitted",
    "answer": <the actual answer - can be number, string, boolean, or object>,
    "reasoning": "brief explanation of your solution"
}

CRITICAL: Ensure the answer is in the exact format requested (number, string, boolean, base64 URI, etc.)
"#,
    );

    prompt
}

/// 从 LLM 响应中解析任务
fn parse_task_from_response(response: &str) -> Option<QuizTask> {
    let json = extract_json_object(response)?;
    serde_json::from_value(json).ok()
}

/// 从自由文本中提取第一个配平的 JSON 对象
///
/// 逐个尝试以 `{` 开头的位置，做字符串/转义感知的括号配平扫描，
/// 第一个能成功解析的对象胜出。不用贪婪正则，避免跨越无关括号
/// 的过度捕获。
pub fn extract_json_object(text: &str) -> Option<JsonValue> {
    let bytes = text.as_bytes();
    let mut start = 0;

    while let Some(offset) = text[start..].find('{') {
        let open = start + offset;
        if let Some(end) = find_balanced_end(bytes, open) {
            if let Ok(value) = serde_json::from_str::<JsonValue>(&text[open..=end]) {
                if value.is_object() {
                    return Some(value);
                }
            }
        }
        start = open + 1;
    }

    None
}

/// 从 `open` 处的 `{` 开始找配平的 `}`，返回其字节下标
fn find_balanced_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

/// 手动提取兜底
///
/// LLM 路径失败时，直接扫描原始文本里的 URL：
/// 含 "submit" 的作为提交地址，以已知数据扩展名结尾的作为文件地址。
pub fn manual_extract(content: &str) -> QuizTask {
    let mut task = QuizTask::fallback("Manual extraction fallback");

    for url in extract_urls(content) {
        let lower = url.to_lowercase();
        if lower.contains("submit") {
            task.submit_url = Some(url);
        } else if FILE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            task.file_url = Some(url);
        }
    }

    task
}
