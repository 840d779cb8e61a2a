//! HTTP 服务 - 对外接口层
//!
//! 职责：
//! - 暴露健康检查与测验求解两个端点
//! - 校验入站请求（字段完整性、邮箱格式、URL 格式、鉴权密钥）
//! - 把求解委托给流程层，并把运行报告翻译成 HTTP 响应
//!
//! 路由：
//! - GET  /        服务信息
//! - GET  /health  健康检查
//! - POST /quiz    求解一条测验链

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::models::RunStatus;
use crate::utils::web::{is_valid_email, is_valid_url};
use crate::workflow::QuizFlow;

/// 跨处理器共享的应用状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub flow: Arc<QuizFlow>,
}

/// POST /quiz 的请求体
#[derive(Debug, Deserialize)]
pub struct QuizRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub url: String,
}

/// 构建路由表
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/quiz", post(quiz_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - 服务信息
async fn index_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "online",
        "service": "quiz-chain-solver",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "GET /health",
            "quiz": "POST /quiz",
        },
    }))
}

/// GET /health - 健康检查，顺带暴露关键配置是否就绪
async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "llm_configured": !state.config.llm_api_key.is_empty(),
        "secret_configured": !state.config.secret_key.is_empty(),
    }))
}

/// POST /quiz - 求解一条测验链
///
/// 校验顺序：字段完整性 → 邮箱格式 → URL 格式 → 鉴权密钥。
/// 求解报告状态为 completed / partial 时返回 200，
/// failed 或流程致命错误返回 500。
async fn quiz_handler(State(state): State<AppState>, Json(request): Json<QuizRequest>) -> Response {
    if let Err(response) = validate_request(&request, &state.config) {
        return response;
    }

    info!("🧩 收到测验请求: {}", request.url);

    match state
        .flow
        .solve_quiz(&request.email, &request.secret, &request.url)
        .await
    {
        Ok(report) => match report.status {
            RunStatus::Completed | RunStatus::Partial => (
                StatusCode::OK,
                Json(json!({
                    "status": "success",
                    "url": request.url,
                    "result": report,
                })),
            )
                .into_response(),
            RunStatus::Failed => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Quiz solving failed: no attempts completed",
            ),
        },
        Err(e) => {
            error!("❌ 求解流程失败: {:#}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Internal server error: {}", e),
            )
        }
    }
}

/// 校验入站请求；失败时返回成品响应
fn validate_request(request: &QuizRequest, config: &Config) -> Result<(), Response> {
    if request.email.is_empty() || request.secret.is_empty() || request.url.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields: email, secret, url",
        ));
    }

    if !is_valid_email(&request.email) {
        return Err(error_response(StatusCode::BAD_REQUEST, "Invalid email format"));
    }

    if !is_valid_url(&request.url) {
        return Err(error_response(StatusCode::BAD_REQUEST, "Invalid URL format"));
    }

    if request.secret != config.secret_key {
        return Err(error_response(StatusCode::FORBIDDEN, "Invalid secret"));
    }

    Ok(())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message, "status": "error" }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> QuizRequest {
        QuizRequest {
            email: "quiz@example.com".to_string(),
            secret: "s3cret".to_string(),
            url: "https://q.example.com/quiz-1".to_string(),
        }
    }

    fn test_config() -> Config {
        Config {
            secret_key: "s3cret".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_request() {
        assert!(validate_request(&valid_request(), &test_config()).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let mut request = valid_request();
        request.email = String::new();
        assert!(validate_request(&request, &test_config()).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_email() {
        let mut request = valid_request();
        request.email = "not-an-email".to_string();
        assert!(validate_request(&request, &test_config()).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut request = valid_request();
        request.url = "ftp://example.com/x".to_string();
        assert!(validate_request(&request, &test_config()).is_err());
    }

    #[test]
    fn test_validate_rejects_wrong_secret() {
        let mut request = valid_request();
        request.secret = "wrong".to_string();
        let response = validate_request(&request, &test_config()).unwrap_err();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_quiz_request_lenient_parse() {
        // 缺字段的请求体应能反序列化，由校验逻辑给出明确错误
        let request: QuizRequest = serde_json::from_str(r#"{"email": "a@b.com"}"#).unwrap();
        assert!(request.secret.is_empty());
        assert!(request.url.is_empty());
    }
}
