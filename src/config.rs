use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, AppResult, ConfigError};
use crate::services::error_log_writer::DEFAULT_ERROR_LOG_FILE;

/// 默认配置文件路径（不存在时跳过）
pub const DEFAULT_CONFIG_FILE: &str = "autotest.toml";

/// 程序配置文件
///
/// 优先级从低到高：`Default` → TOML 文件 → 环境变量
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 同时处理的题目数量，`None` 表示自动
    pub max_concurrency: Option<usize>,
    // --- 答题接口配置 ---
    pub answer_api_base_url: String,
    pub answer_api_path: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: f64,
    /// 每道题最多尝试次数
    pub max_attempts: u32,
    /// 两次尝试之间的等待（秒）
    pub backoff_secs: f64,
    /// 4xx 是否重试
    pub retry_client_errors: bool,
    /// 诊断日志文件
    pub error_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 判断配置 ---
    pub judge_enabled: bool,
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            answer_api_base_url: "http://127.0.0.1:8000".to_string(),
            answer_api_path: "/answer".to_string(),
            request_timeout_secs: 30.0,
            max_attempts: 3,
            backoff_secs: 2.0,
            retry_client_errors: true,
            error_log_file: DEFAULT_ERROR_LOG_FILE.to_string(),
            verbose_logging: false,
            judge_enabled: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    /// 加载配置：默认值 → `AUTOTEST_CONFIG` 指定的 TOML 文件 → 环境变量
    pub fn load() -> AppResult<Self> {
        let path = std::env::var("AUTOTEST_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = if Path::new(&path).exists() {
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };
        let config = base.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件读取，缺失的字段使用默认值
    pub fn from_toml_file(path: &str) -> AppResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| AppError::file_read_failed(path, e))?;
        toml::from_str(&content).map_err(|source| {
            AppError::File(crate::error::FileError::TomlParseFailed {
                path: path.to_string(),
                source,
            })
        })
    }

    /// 用外部键值覆盖配置
    ///
    /// `lookup` 通常是 `std::env::var`，测试时可以传入固定的表。
    pub fn apply_overrides<F>(mut self, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MAX_CONCURRENCY") {
            self.max_concurrency = Some(parse_var("MAX_CONCURRENCY", &v, "usize")?);
        }
        if let Some(v) = lookup("ANSWER_API_BASE_URL") {
            self.answer_api_base_url = v;
        }
        if let Some(v) = lookup("ANSWER_API_PATH") {
            self.answer_api_path = v;
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", &v, "f64")?;
        }
        if let Some(v) = lookup("MAX_ATTEMPTS") {
            self.max_attempts = parse_var("MAX_ATTEMPTS", &v, "u32")?;
        }
        if let Some(v) = lookup("BACKOFF_SECS") {
            self.backoff_secs = parse_var("BACKOFF_SECS", &v, "f64")?;
        }
        if let Some(v) = lookup("RETRY_CLIENT_ERRORS") {
            self.retry_client_errors = parse_var("RETRY_CLIENT_ERRORS", &v, "bool")?;
        }
        if let Some(v) = lookup("ERROR_LOG_FILE") {
            self.error_log_file = v;
        }
        if let Some(v) = lookup("VERBOSE_LOGGING") {
            self.verbose_logging = parse_var("VERBOSE_LOGGING", &v, "bool")?;
        }
        if let Some(v) = lookup("JUDGE_ENABLED") {
            self.judge_enabled = parse_var("JUDGE_ENABLED", &v, "bool")?;
        }
        if let Some(v) = lookup("LLM_API_KEY") {
            self.llm_api_key = v;
        }
        if let Some(v) = lookup("LLM_API_BASE_URL") {
            self.llm_api_base_url = v;
        }
        if let Some(v) = lookup("LLM_MODEL_NAME") {
            self.llm_model_name = v;
        }
        Ok(self)
    }

    /// 检查取值是否合法
    pub fn validate(&self) -> AppResult<()> {
        if self.max_concurrency == Some(0) {
            return Err(invalid("max_concurrency", "必须大于 0"));
        }
        // 超出 Duration 范围的秒数同样不合法
        if !(self.request_timeout_secs > 0.0)
            || Duration::try_from_secs_f64(self.request_timeout_secs).is_err()
        {
            return Err(invalid("request_timeout_secs", "必须是有效的正数秒数"));
        }
        if Duration::try_from_secs_f64(self.backoff_secs).is_err() {
            return Err(invalid("backoff_secs", "必须是有效的非负秒数"));
        }
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts", "至少为 1"));
        }
        Ok(())
    }

    /// 实际使用的并发数
    ///
    /// 未配置时与线程池的自动大小一致：`min(32, CPU 数 + 4)`
    pub fn concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or_else(|| {
            let cpus = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            (cpus + 4).min(32)
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_secs_f64(self.backoff_secs)
    }

    /// 答题接口完整 URL
    pub fn answer_url(&self) -> String {
        format!(
            "{}/{}",
            self.answer_api_base_url.trim_end_matches('/'),
            self.answer_api_path.trim_start_matches('/')
        )
    }
}

fn parse_var<T: FromStr>(var_name: &str, value: &str, expected_type: &str) -> AppResult<T> {
    value.trim().parse().map_err(|_| {
        AppError::Config(ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        })
    })
}

fn invalid(key: &str, reason: &str) -> AppError {
    AppError::Config(ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    })
}
