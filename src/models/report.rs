//! 提交结果与运行报告模型

use serde::{Deserialize, Serialize};

/// 验证端点返回的提交结果
///
/// 提交客户端保证循环收到的永远是本类型的值：
/// 网络失败被合成为 `correct=false` 加错误文本。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// 答案是否正确
    #[serde(default)]
    pub correct: bool,
    /// 下一个测验的 URL（链式跳转）
    #[serde(default)]
    pub url: Option<String>,
    /// 错误或拒绝原因
    #[serde(default)]
    pub reason: Option<String>,
}

impl SubmissionResult {
    /// 由传输层错误合成的"未通过"结果
    pub fn from_failure(reason: impl Into<String>) -> Self {
        Self {
            correct: false,
            url: None,
            reason: Some(reason.into()),
        }
    }
}

/// 一次完整求解的终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// 整条链全部解完
    Completed,
    /// 至少尝试过一次，但未走到链尾（超时或次数耗尽）
    Partial,
    /// 一次尝试都没有发生
    Failed,
}

/// 求解循环的最终报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub attempts: u32,
    /// 总耗时（秒）
    pub time_taken: f64,
}
