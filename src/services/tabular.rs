//! 表格数据处理 - 业务能力层
//!
//! CSV / Excel → `Table`，并产出 pandas 风格的统计摘要
//! （形态、列类型、空值数、数值列 mean/median/std/min/max/sum、示例行）。

use anyhow::{Context, Result};
use calamine::{Data, Reader, Xlsx};
use serde_json::{json, Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::io::Cursor;

use crate::models::{NumericStats, TableAnalysis};

/// 内存中的行式表格
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<String>,
    /// 每行与 columns 等长；缺失单元格为 Null
    pub rows: Vec<Vec<JsonValue>>,
}

impl Table {
    /// 解析 CSV 字节
    pub fn from_csv(content: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content);

        let columns: Vec<String> = reader
            .headers()
            .context("读取 CSV 表头失败")?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("读取 CSV 行失败")?;
            let row = (0..columns.len())
                .map(|i| cell_from_str(record.get(i).unwrap_or("")))
                .collect();
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// 解析 Excel (xlsx) 字节，取第一个工作表
    pub fn from_excel(content: Vec<u8>) -> Result<Self> {
        let mut workbook: Xlsx<_> =
            Xlsx::new(Cursor::new(content)).context("打开 Excel 工作簿失败")?;

        let range = workbook
            .worksheet_range_at(0)
            .context("Excel 工作簿为空")?
            .context("读取工作表失败")?;

        let mut iter = range.rows();
        let columns: Vec<String> = match iter.next() {
            Some(header) => header.iter().map(cell_label).collect(),
            None => return Ok(Self { columns: vec![], rows: vec![] }),
        };

        let rows = iter
            .map(|row| {
                (0..columns.len())
                    .map(|i| row.get(i).map(cell_from_excel).unwrap_or(JsonValue::Null))
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    /// 转换为行记录（列名 → 值）
    pub fn to_records(&self) -> Vec<JsonValue> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = Map::new();
                for (col, value) in self.columns.iter().zip(row.iter()) {
                    record.insert(col.clone(), value.clone());
                }
                JsonValue::Object(record)
            })
            .collect()
    }

    /// 产出统计摘要
    pub fn analyze(&self) -> TableAnalysis {
        let mut dtypes = BTreeMap::new();
        let mut null_counts = BTreeMap::new();
        let mut numeric_stats = BTreeMap::new();

        for (idx, col) in self.columns.iter().enumerate() {
            let cells: Vec<&JsonValue> = self.rows.iter().map(|r| &r[idx]).collect();

            let nulls = cells.iter().filter(|c| c.is_null()).count();
            null_counts.insert(col.clone(), nulls);

            let numbers = numeric_column(&cells);
            match &numbers {
                Some(values) => {
                    let is_int = values.iter().all(|v| v.fract() == 0.0);
                    dtypes.insert(col.clone(), if is_int { "int64" } else { "float64" }.to_string());
                    if let Some(stats) = compute_stats(values) {
                        numeric_stats.insert(col.clone(), stats);
                    }
                }
                None => {
                    dtypes.insert(col.clone(), "object".to_string());
                }
            }
        }

        TableAnalysis {
            shape: (self.rows.len(), self.columns.len()),
            columns: self.columns.clone(),
            dtypes,
            null_counts,
            numeric_stats,
            sample_rows: self.to_records().into_iter().take(3).collect(),
        }
    }
}

/// CSV 单元格推断：空 → Null，可解析为数字 → Number，其余 → String
fn cell_from_str(raw: &str) -> JsonValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return JsonValue::Null;
    }
    if let Ok(num) = trimmed.parse::<f64>() {
        if num.is_finite() {
            return json!(num);
        }
    }
    JsonValue::String(trimmed.to_string())
}

fn cell_from_excel(cell: &Data) -> JsonValue {
    match cell {
        Data::Empty => JsonValue::Null,
        Data::Int(i) => json!(*i as f64),
        Data::Float(f) => json!(*f),
        Data::Bool(b) => json!(*b),
        Data::String(s) if s.trim().is_empty() => JsonValue::Null,
        other => JsonValue::String(cell_label(other)),
    }
}

fn cell_label(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// 若列中所有非空单元格都是数字，返回这些数字
fn numeric_column(cells: &[&JsonValue]) -> Option<Vec<f64>> {
    let mut values = Vec::new();
    for cell in cells {
        match cell {
            JsonValue::Null => {}
            JsonValue::Number(n) => values.push(n.as_f64()?),
            _ => return None,
        }
    }
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// 数值列统计量（std 为样本标准差，ddof=1，与 pandas 一致）
fn compute_stats(values: &[f64]) -> Option<NumericStats> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let sum: f64 = values.iter().sum();
    let mean = sum / n;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let median = if sorted.len() % 2 == 0 {
        (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) / 2.0
    } else {
        sorted[sorted.len() / 2]
    };

    let std = if values.len() > 1 {
        let var: f64 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt()
    } else {
        0.0
    };

    Some(NumericStats {
        mean,
        median,
        std,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        sum,
    })
}
