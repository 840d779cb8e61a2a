//! 文件处理器 - 业务能力层
//!
//! 下载附件（带大小上限）、嗅探类型、分发到对应解析器。
//! 失败以 Err 返回，由流程层降级处理，绝不让循环崩溃。

use anyhow::{Context, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{FileKind, FilePayload, ProcessedFile};
use crate::services::tabular::Table;

/// 文件处理器
pub struct FileProcessor {
    http: reqwest::Client,
    max_file_size: u64,
}

impl FileProcessor {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("构建 HTTP 客户端失败");

        Self {
            http,
            max_file_size: config.max_file_size,
        }
    }

    /// 下载并解析文件
    pub async fn process(&self, file_url: &str) -> Result<ProcessedFile> {
        info!("📥 正在处理文件: {}", file_url);

        let content = self.download(file_url).await?;
        let kind = detect_kind(file_url, &content);
        info!("✓ 文件类型: {}，大小: {} 字节", kind.as_str(), content.len());

        let payload = parse_payload(kind, content)?;

        Ok(ProcessedFile {
            kind,
            file_url: file_url.to_string(),
            payload,
        })
    }

    /// 下载文件，强制大小上限
    ///
    /// Content-Length 超限时在拉取正文前拒绝；
    /// 未声明长度时边下边数，越界立即中止。
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("下载文件失败: {}", url))?
            .error_for_status()
            .with_context(|| format!("下载文件失败: {}", url))?;

        ensure_declared_within(response.content_length(), self.max_file_size)?;

        let content = collect_limited(response.bytes_stream(), self.max_file_size).await?;
        debug!("下载完成: {} 字节", content.len());
        Ok(content)
    }
}

/// 按响应声明的 Content-Length 预先拒绝超限文件，正文一个字节都不拉
pub fn ensure_declared_within(declared: Option<u64>, max_size: u64) -> Result<()> {
    if let Some(declared) = declared {
        if declared > max_size {
            warn!("⚠️ 文件声明大小 {} 字节，超出上限 {}", declared, max_size);
            anyhow::bail!(
                "文件超出大小限制: 声明 {} 字节，上限 {} 字节",
                declared,
                max_size
            );
        }
    }
    Ok(())
}

/// 聚合字节流，累计超过 `max_size` 时中止
///
/// 独立成函数以便用脚本化的流做测试。
pub async fn collect_limited<S, E>(mut stream: S, max_size: u64) -> Result<Vec<u8>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut content = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("读取下载流失败")?;
        content.extend_from_slice(&chunk);
        if content.len() as u64 > max_size {
            anyhow::bail!("文件在下载过程中超出大小限制: 上限 {} 字节", max_size);
        }
    }
    Ok(content)
}

/// 嗅探文件类型：先看 URL 扩展名，再看内容签名
pub fn detect_kind(url: &str, content: &[u8]) -> FileKind {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();

    if path.ends_with(".pdf") {
        return FileKind::Pdf;
    }
    if path.ends_with(".csv") {
        return FileKind::Csv;
    }
    if path.ends_with(".xlsx") || path.ends_with(".xls") {
        return FileKind::Excel;
    }
    if path.ends_with(".json") {
        return FileKind::Json;
    }
    if [".png", ".jpg", ".jpeg", ".gif"].iter().any(|ext| path.ends_with(ext)) {
        return FileKind::Image;
    }

    // 扩展名缺失或不认识，看内容签名
    if content.starts_with(b"%PDF") {
        return FileKind::Pdf;
    }
    if content.starts_with(b"PK") {
        // ZIP 签名，xlsx 的容器格式
        return FileKind::Excel;
    }

    FileKind::Unknown
}

/// 按类型分发解析
fn parse_payload(kind: FileKind, content: Vec<u8>) -> Result<FilePayload> {
    match kind {
        FileKind::Pdf => {
            let text = pdf_extract::extract_text_from_mem(&content)
                .context("提取 PDF 文本失败")?;
            debug!("从 PDF 提取 {} 字符", text.len());
            Ok(FilePayload::Text(text))
        }
        FileKind::Csv => {
            let table = Table::from_csv(&content)?;
            debug!("读取 CSV: {} 行 {} 列", table.rows.len(), table.columns.len());
            Ok(FilePayload::Table {
                records: table.to_records(),
                analysis: table.analyze(),
            })
        }
        FileKind::Excel => {
            let table = Table::from_excel(content)?;
            debug!("读取 Excel: {} 行 {} 列", table.rows.len(), table.columns.len());
            Ok(FilePayload::Table {
                records: table.to_records(),
                analysis: table.analyze(),
            })
        }
        FileKind::Json => {
            let value = serde_json::from_slice(&content).context("解析 JSON 文件失败")?;
            Ok(FilePayload::Json(value))
        }
        FileKind::Image => {
            let img = image::load_from_memory(&content).context("解码图片失败")?;
            Ok(FilePayload::Image {
                width: img.width(),
                height: img.height(),
                color: format!("{:?}", img.color()),
            })
        }
        FileKind::Unknown => Ok(FilePayload::Empty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(detect_kind("https://x.com/report.pdf", b""), FileKind::Pdf);
        assert_eq!(detect_kind("https://x.com/data.csv", b""), FileKind::Csv);
        assert_eq!(detect_kind("https://x.com/book.xlsx", b""), FileKind::Excel);
        assert_eq!(detect_kind("https://x.com/obj.json", b""), FileKind::Json);
        assert_eq!(detect_kind("https://x.com/pic.jpeg", b""), FileKind::Image);
    }

    #[test]
    fn test_detect_extension_with_query_string() {
        assert_eq!(
            detect_kind("https://x.com/data.csv?token=abc", b""),
            FileKind::Csv
        );
    }

    #[test]
    fn test_detect_pdf_by_magic_bytes() {
        // 无扩展名，%PDF 魔数判定为 pdf
        assert_eq!(
            detect_kind("https://x.com/download/42", b"%PDF-1.7 rest"),
            FileKind::Pdf
        );
    }

    #[test]
    fn test_detect_excel_by_zip_signature() {
        assert_eq!(
            detect_kind("https://x.com/file", b"PK\x03\x04data"),
            FileKind::Excel
        );
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_kind("https://x.com/file", b"hello"), FileKind::Unknown);
    }

    #[test]
    fn test_declared_oversize_rejected_before_body() {
        // 声明 15 MB，上限 10 MB
        let err = ensure_declared_within(Some(15 * 1024 * 1024), 10 * 1024 * 1024).unwrap_err();
        assert!(err.to_string().contains("超出大小限制"));
    }

    #[test]
    fn test_declared_size_within_or_absent_passes() {
        assert!(ensure_declared_within(Some(1024), 10 * 1024 * 1024).is_ok());
        assert!(ensure_declared_within(None, 10 * 1024 * 1024).is_ok());
    }

    #[tokio::test]
    async fn test_collect_limited_within_cap() {
        let chunks: Vec<std::result::Result<Bytes, std::io::Error>> =
            vec![Ok(Bytes::from_static(b"hello ")), Ok(Bytes::from_static(b"world"))];
        let content = collect_limited(stream::iter(chunks), 64).await.unwrap();
        assert_eq!(content, b"hello world");
    }

    #[tokio::test]
    async fn test_collect_limited_aborts_mid_stream() {
        // 总量 12 字节，上限 8：应在第二块中止
        let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"123456")),
            Ok(Bytes::from_static(b"789012")),
        ];
        let err = collect_limited(stream::iter(chunks), 8).await.unwrap_err();
        assert!(err.to_string().contains("超出大小限制"));
    }

    #[tokio::test]
    async fn test_collect_limited_propagates_stream_error() {
        let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = vec![Err(
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"),
        )];
        assert!(collect_limited(stream::iter(chunks), 64).await.is_err());
    }

    #[test]
    fn test_parse_json_payload() {
        let payload = parse_payload(FileKind::Json, br#"{"k": [1, 2]}"#.to_vec()).unwrap();
        match payload {
            FilePayload::Json(v) => assert_eq!(v["k"][1], 2),
            other => panic!("期望 Json 载荷，得到 {:?}", other),
        }
    }

    #[test]
    fn test_parse_csv_payload_has_analysis() {
        let payload = parse_payload(FileKind::Csv, b"a,b\n1,2\n3,4\n".to_vec()).unwrap();
        match payload {
            FilePayload::Table { records, analysis } => {
                assert_eq!(records.len(), 2);
                assert_eq!(analysis.shape, (2, 2));
                assert!((analysis.numeric_stats["a"].sum - 4.0).abs() < 1e-9);
            }
            other => panic!("期望 Table 载荷，得到 {:?}", other),
        }
    }
}
