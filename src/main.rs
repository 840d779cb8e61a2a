use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use quiz_chain_solver::infrastructure::PageRenderer;
use quiz_chain_solver::server::{create_router, AppState};
use quiz_chain_solver::utils::logging;
use quiz_chain_solver::workflow::QuizFlow;
use quiz_chain_solver::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // 校验必填配置
    config.validate()?;

    logging::log_startup(
        &config.llm_model_name,
        config.quiz_timeout_secs,
        config.max_attempts,
    );

    // 浏览器懒启动，首次渲染时初始化
    let renderer = Arc::new(PageRenderer::new(&config));
    let flow = Arc::new(QuizFlow::new(&config, renderer));

    let state = AppState {
        config: Arc::new(config.clone()),
        flow,
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("✓ 服务监听于 http://{}", addr);

    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
