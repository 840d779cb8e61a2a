//! 提交客户端 - 业务能力层
//!
//! 把答案 POST 到验证端点并解读响应。
//! 网络 / HTTP / 解析失败一律合成 `correct=false` 的结果——
//! 对循环来说提交失败是数据，不是异常。

use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

use crate::models::{AnswerValue, SubmissionResult};

/// 提交请求超时
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// 提交客户端
pub struct SubmissionClient {
    http: reqwest::Client,
}

impl SubmissionClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(SUBMIT_TIMEOUT)
            .build()
            .expect("构建 HTTP 客户端失败");

        Self { http }
    }

    /// 提交答案
    ///
    /// 单次请求，不重试；调用方（循环）永远会收到
    /// `SubmissionResult` 形态的值。
    pub async fn submit(
        &self,
        email: &str,
        secret: &str,
        quiz_url: &str,
        answer: &AnswerValue,
        submit_url: &str,
    ) -> SubmissionResult {
        let payload = json!({
            "email": email,
            "secret": secret,
            "url": quiz_url,
            "answer": answer.to_json(),
        });

        info!("📤 正在提交答案到: {}", submit_url);

        let response = match self.http.post(submit_url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("⚠️ 提交请求失败: {}", e);
                return SubmissionResult::from_failure(e.to_string());
            }
        };

        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(e) => {
                warn!("⚠️ 提交被拒绝: {}", e);
                return SubmissionResult::from_failure(e.to_string());
            }
        };

        match response.json::<SubmissionResult>().await {
            Ok(result) => result,
            Err(e) => {
                warn!("⚠️ 提交响应解析失败: {}", e);
                SubmissionResult::from_failure(format!("响应解析失败: {}", e))
            }
        }
    }
}

impl Default for SubmissionClient {
    fn default() -> Self {
        Self::new()
    }
}
