//! 处理后文件模型
//!
//! 每次文件下载产出一个 `ProcessedFile`，只在当次迭代内使用，不做持久化。

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// 文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Csv,
    Excel,
    Json,
    Image,
    Unknown,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Csv => "csv",
            FileKind::Excel => "excel",
            FileKind::Json => "json",
            FileKind::Image => "image",
            FileKind::Unknown => "unknown",
        }
    }
}

/// 单个数值列的统计量
#[derive(Debug, Clone, Serialize)]
pub struct NumericStats {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
}

/// 表格数据的统计摘要
///
/// 形态、列类型、空值数、数值列统计量和少量示例行，
/// 足够 LLM 在不看全量数据的情况下精确计算答案。
#[derive(Debug, Clone, Serialize)]
pub struct TableAnalysis {
    /// (行数, 列数)
    pub shape: (usize, usize),
    pub columns: Vec<String>,
    pub dtypes: BTreeMap<String, String>,
    pub null_counts: BTreeMap<String, usize>,
    pub numeric_stats: BTreeMap<String, NumericStats>,
    /// 前 3 行示例
    pub sample_rows: Vec<JsonValue>,
}

/// 按文件类型区分的载荷
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilePayload {
    /// PDF 提取出的文本
    Text(String),
    /// 表格数据（行记录 + 统计摘要）
    Table {
        records: Vec<JsonValue>,
        analysis: TableAnalysis,
    },
    /// 解析后的 JSON 结构
    Json(JsonValue),
    /// 图片元信息
    Image {
        width: u32,
        height: u32,
        color: String,
    },
    /// 无法解析的内容
    Empty,
}

/// 下载并解析后的文件
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedFile {
    pub kind: FileKind,
    pub file_url: String,
    pub payload: FilePayload,
}

impl ProcessedFile {
    /// 是否携带可供 LLM 重算答案的结构化数据
    pub fn has_structured_data(&self) -> bool {
        matches!(
            self.payload,
            FilePayload::Table { .. } | FilePayload::Json(_)
        )
    }

    /// 序列化为提示词中嵌入的数据描述
    pub fn describe_for_prompt(&self) -> String {
        match &self.payload {
            FilePayload::Text(text) => text.clone(),
            FilePayload::Table { analysis, .. } => {
                serde_json::to_string_pretty(analysis).unwrap_or_default()
            }
            FilePayload::Json(value) => serde_json::to_string_pretty(value).unwrap_or_default(),
            FilePayload::Image {
                width,
                height,
                color,
            } => format!("image {}x{} ({})", width, height, color),
            FilePayload::Empty => "No data".to_string(),
        }
    }
}
