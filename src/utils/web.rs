//! URL / 邮箱校验与文本工具

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// 校验字符串是否是合法的 http(s) URL
pub fn is_valid_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
        }
        Err(_) => false,
    }
}

/// 校验字符串是否是合法邮箱
pub fn is_valid_email(candidate: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let pattern = RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("邮箱正则非法")
    });
    pattern.is_match(candidate)
}

/// 从任意文本中提取所有 URL
pub fn extract_urls(text: &str) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let pattern = RE.get_or_init(|| {
        Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).expect("URL 正则非法")
    });
    pattern.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
