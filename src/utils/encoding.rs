//! Base64 编码工具
//!
//! 测验页面常把真实题面藏在 `atob(...)` 调用或 data URI 里，
//! 本模块负责从 HTML 中提取并解码这类内容。

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

fn atob_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"atob\([`'"]([A-Za-z0-9+/=\s]+)[`'"]\)"#).expect("atob 正则非法"))
}

fn data_uri_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"data:([^;]+);base64,([A-Za-z0-9+/=]+)").expect("data URI 正则非法"))
}

/// 从 HTML 中提取 base64 载荷
///
/// 优先匹配 `atob(`...`)` 调用，其次匹配 `data:...;base64,...` URI。
/// 未找到时返回 None。
pub fn extract_base64_from_html(html: &str) -> Option<String> {
    if let Some(caps) = atob_pattern().captures(html) {
        let cleaned: String = caps[1].chars().filter(|c| !c.is_whitespace()).collect();
        debug!("从 atob() 调用中提取到 {} 字符的 base64", cleaned.len());
        return Some(cleaned);
    }

    if let Some(caps) = data_uri_pattern().captures(html) {
        debug!("从 data URI 中提取到 base64 载荷");
        return Some(caps[2].to_string());
    }

    None
}

/// 解码 base64 字符串为字节
pub fn decode_base64(encoded: &str) -> Option<Vec<u8>> {
    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).ok()
}

/// 解码 base64 字符串为 UTF-8 文本
pub fn decode_base64_text(encoded: &str) -> Option<String> {
    let bytes = decode_base64(encoded)?;
    String::from_utf8(bytes).ok()
}

/// 编码字节为 base64 字符串
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// 由字节构造 data URI
pub fn create_data_uri(data: &[u8], mime_type: &str) -> String {
    format!("data:{};base64,{}", mime_type, encode_base64(data))
}

/// 解析 data URI，返回 (mime 类型, 字节)
pub fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let caps = data_uri_pattern().captures(uri)?;
    let bytes = decode_base64(&caps[2])?;
    Some((caps[1].to_string(), bytes))
}
