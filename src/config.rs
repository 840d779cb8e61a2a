use anyhow::Result;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP 服务监听地址
    pub host: String,
    /// HTTP 服务监听端口
    pub port: u16,
    /// 入站请求鉴权密钥
    pub secret_key: String,
    /// 提交答案时使用的邮箱
    pub email: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 求解循环配置 ---
    /// 整条链的时间预算（秒），需控制在 3 分钟以内
    pub quiz_timeout_secs: u64,
    /// 循环的最大尝试次数
    pub max_attempts: u32,
    // --- 浏览器配置 ---
    pub headless: bool,
    /// 单次页面渲染的超时（毫秒）
    pub browser_timeout_ms: u64,
    // --- 文件处理配置 ---
    /// 下载文件的大小上限（字节）
    pub max_file_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            secret_key: String::new(),
            email: String::new(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4-turbo-preview".to_string(),
            quiz_timeout_secs: 170,
            max_attempts: 5,
            headless: true,
            browser_timeout_ms: 30_000,
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(default.host),
            port: std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.port),
            secret_key: std::env::var("SECRET_KEY").unwrap_or(default.secret_key),
            email: std::env::var("EMAIL").unwrap_or(default.email),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            quiz_timeout_secs: std::env::var("QUIZ_TIMEOUT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.quiz_timeout_secs),
            max_attempts: std::env::var("MAX_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_attempts),
            headless: std::env::var("HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.headless),
            browser_timeout_ms: std::env::var("BROWSER_TIMEOUT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.browser_timeout_ms),
            max_file_size: std::env::var("MAX_FILE_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_file_size),
        }
    }

    /// 校验必填配置项
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.llm_api_key.is_empty() {
            errors.push("LLM_API_KEY 未配置");
        }
        if self.secret_key.is_empty() {
            errors.push("SECRET_KEY 未配置");
        }
        if self.email.is_empty() {
            errors.push("EMAIL 未配置");
        }

        if !errors.is_empty() {
            anyhow::bail!("配置错误: {}", errors.join(", "));
        }

        Ok(())
    }
}
