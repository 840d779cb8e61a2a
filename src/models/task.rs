//! 任务模型
//!
//! `QuizTask` 是任务解析器从页面内容中得到的结构化任务描述，
//! 只在单次循环迭代内存活。

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 答案值
///
/// 答案的具体形态完全由 LLM 的输出决定，可能是数字、字符串、
/// 布尔值或结构化对象。用封闭的联合类型承载，序列化为原生 JSON
/// 形态（untagged），到提交边界时原样进入请求体。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// 布尔答案
    Boolean(bool),
    /// 数值答案
    Number(f64),
    /// 文本答案
    Text(String),
    /// 结构化答案（数组、对象等）
    Structured(JsonValue),
}

impl AnswerValue {
    /// 转换为提交边界使用的 JSON 值
    pub fn to_json(&self) -> JsonValue {
        match self {
            AnswerValue::Boolean(b) => JsonValue::from(*b),
            AnswerValue::Number(n) => JsonValue::from(*n),
            AnswerValue::Text(s) => JsonValue::from(s.clone()),
            AnswerValue::Structured(v) => v.clone(),
        }
    }
}

impl From<JsonValue> for AnswerValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Bool(b) => AnswerValue::Boolean(b),
            JsonValue::Number(n) => match n.as_f64() {
                Some(f) => AnswerValue::Number(f),
                None => AnswerValue::Structured(JsonValue::Number(n)),
            },
            JsonValue::String(s) => AnswerValue::Text(s),
            other => AnswerValue::Structured(other),
        }
    }
}

/// 结构化任务描述
///
/// 由任务解析器产出；当存在附件文件时，答案计算器会原地更新
/// `answer` 字段。所有字段都允许缺省，LLM 的输出必须宽松解析。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizTask {
    /// 任务类型描述（如 "sum column in PDF table"）
    #[serde(default = "default_task_type")]
    pub task_type: String,
    /// 需要下载的文件 URL
    #[serde(default)]
    pub file_url: Option<String>,
    /// 答案提交 URL
    #[serde(default)]
    pub submit_url: Option<String>,
    /// 答案
    #[serde(default)]
    pub answer: Option<AnswerValue>,
    /// LLM 给出的解题思路
    #[serde(default)]
    pub reasoning: String,
}

fn default_task_type() -> String {
    "unknown".to_string()
}

impl QuizTask {
    /// 手动提取兜底产出的空任务
    pub fn fallback(reasoning: impl Into<String>) -> Self {
        Self {
            task_type: "unknown".to_string(),
            file_url: None,
            submit_url: None,
            answer: None,
            reasoning: reasoning.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_answer_value_untagged_roundtrip() {
        let cases = vec![
            (json!(true), AnswerValue::Boolean(true)),
            (json!(42.5), AnswerValue::Number(42.5)),
            (json!("foo"), AnswerValue::Text("foo".to_string())),
            (
                json!({"a": [1, 2]}),
                AnswerValue::Structured(json!({"a": [1, 2]})),
            ),
        ];

        for (raw, expected) in cases {
            let parsed: AnswerValue = serde_json::from_value(raw.clone()).unwrap();
            assert_eq!(parsed, expected);
            assert_eq!(serde_json::to_value(&parsed).unwrap(), raw);
        }
    }

    #[test]
    fn test_quiz_task_lenient_parse() {
        // LLM 可能漏掉任意字段
        let task: QuizTask = serde_json::from_value(json!({
            "submit_url": "https://example.com/submit",
            "answer": 7
        }))
        .unwrap();

        assert_eq!(task.task_type, "unknown");
        assert!(task.file_url.is_none());
        assert_eq!(task.answer, Some(AnswerValue::Number(7.0)));
    }

    #[test]
    fn test_quiz_task_null_fields() {
        let task: QuizTask = serde_json::from_value(json!({
            "task_type": "count rows",
            "file_url": null,
            "submit_url": null,
            "answer": null,
            "reasoning": ""
        }))
        .unwrap();

        assert_eq!(task.task_type, "count rows");
        assert!(task.submit_url.is_none());
        assert!(task.answer.is_none());
    }
}
