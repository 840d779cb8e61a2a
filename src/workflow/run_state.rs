//! 求解循环的运行状态
//!
//! 归单次循环独占，不跨并发运行共享。
//!
//! 不变量：
//! - attempts 超过上限后循环立即停止（首个越界值即终值）
//! - 超过截止时间后不再开始新的迭代
//! - current_url 要么为 None（已终止），要么是经过校验的 URL

use std::time::{Duration, Instant};

/// 循环运行状态
#[derive(Debug)]
pub struct RunState {
    current_url: Option<String>,
    attempts: u32,
    max_attempts: u32,
    started: Instant,
    deadline: Duration,
}

impl RunState {
    pub fn new(quiz_url: impl Into<String>, max_attempts: u32, deadline: Duration) -> Self {
        Self {
            current_url: Some(quiz_url.into()),
            attempts: 0,
            max_attempts,
            started: Instant::now(),
            deadline,
        }
    }

    /// 当前待求解的 URL；None 表示链已终止
    pub fn current_url(&self) -> Option<String> {
        self.current_url.clone()
    }

    /// 进入新一轮尝试，递增计数器
    pub fn begin_attempt(&mut self) {
        self.attempts += 1;
    }

    /// 尝试次数是否已越界
    pub fn attempts_exceeded(&self) -> bool {
        self.attempts > self.max_attempts
    }

    /// 是否已超过时间预算
    pub fn deadline_exceeded(&self) -> bool {
        self.started.elapsed() >= self.deadline
    }

    /// 跳转到链上的下一个测验
    pub fn advance(&mut self, next_url: String) {
        self.current_url = Some(next_url);
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// 已消耗的时间（秒）
    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_cap_boundary() {
        let mut state = RunState::new("https://q.example.com/1", 5, Duration::from_secs(170));

        for _ in 0..5 {
            state.begin_attempt();
            assert!(!state.attempts_exceeded());
        }

        // 第 6 次越界
        state.begin_attempt();
        assert!(state.attempts_exceeded());
        assert_eq!(state.attempts(), 6);
    }

    #[test]
    fn test_zero_deadline_is_immediately_exceeded() {
        let state = RunState::new("https://q.example.com/1", 5, Duration::ZERO);
        assert!(state.deadline_exceeded());
    }

    #[test]
    fn test_advance_replaces_url() {
        let mut state = RunState::new("https://q.example.com/1", 5, Duration::from_secs(170));
        state.advance("https://q.example.com/2".to_string());
        assert_eq!(
            state.current_url().as_deref(),
            Some("https://q.example.com/2")
        );
    }
}
