//! 日志工具模块
//!
//! 提供 tracing 订阅器的初始化

use tracing_subscriber::EnvFilter;

/// 初始化日志订阅器
///
/// 日志级别可通过 RUST_LOG 环境变量覆盖；
/// `verbose` 为 true 时默认级别为 debug，否则为 info。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quiz_chain_solver={default_level},tower_http=info")));

    // 测试中可能重复初始化，忽略二次初始化的错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(model: &str, timeout_secs: u64, max_attempts: u32) {
    tracing::info!("{}", "=".repeat(60));
    tracing::info!("🚀 Quiz Chain Solver 启动");
    tracing::info!(
        "启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    tracing::info!("🤖 模型: {}", model);
    tracing::info!("⏱️ 时间预算: {} 秒, 尝试上限: {}", timeout_secs, max_attempts);
    tracing::info!("{}", "=".repeat(60));
}

/// 记录入站请求
pub fn log_request(email: &str, url: &str, action: &str) {
    tracing::info!("📨 请求{} - 邮箱: {}, URL: {}", action, email, url);
}

/// 记录求解结果
pub fn log_response(email: &str, url: &str, success: bool, message: &str) {
    if success {
        tracing::info!("✅ 求解成功 - 邮箱: {}, URL: {}, 说明: {}", email, url, message);
    } else {
        tracing::warn!("❌ 求解失败 - 邮箱: {}, URL: {}, 说明: {}", email, url, message);
    }
}
