/// 答题 API 客户端
///
/// 封装对外部答题接口的单次调用：限时、分类结果，不做重试
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::models::FailureKind;
use crate::utils::logging::truncate_text;

/// 单次调用的失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerError {
    /// 超过了本次调用的时限
    #[error("请求超时 (时限: {timeout:?})")]
    Timeout { timeout: Duration },
    /// 连接层面的失败
    #[error("网络错误: {message}")]
    Network { message: String },
    /// 非 2xx 响应，或响应体无法解析
    #[error("HTTP错误 (状态码: {status:?}): {message}")]
    Http {
        status: Option<u16>,
        message: String,
    },
}

impl AnswerError {
    /// 对应的失败类型
    pub fn kind(&self) -> FailureKind {
        match self {
            AnswerError::Timeout { .. } => FailureKind::Timeout,
            AnswerError::Network { .. } => FailureKind::NetworkError,
            AnswerError::Http { .. } => FailureKind::HttpError,
        }
    }

    /// 是否为 4xx 响应
    pub fn is_client_error(&self) -> bool {
        matches!(self, AnswerError::Http { status: Some(code), .. } if (400..500).contains(code))
    }
}

/// 答题能力
///
/// 实现者必须可以被多个 worker 同时调用。
#[async_trait]
pub trait Answerer: Send + Sync {
    /// 回答一道题，耗时不超过 `timeout`
    async fn answer(&self, text: &str, timeout: Duration) -> Result<String, AnswerError>;
}

#[derive(Debug, Serialize)]
struct AnswerRequest<'a> {
    question: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnswerResponse {
    answer: String,
}

/// 基于 HTTP 的答题客户端
///
/// `POST {url}`，请求体 `{"question": ...}`，响应体 `{"answer": ...}`
#[derive(Clone)]
pub struct HttpAnswerer {
    client: reqwest::Client,
    url: String,
}

impl HttpAnswerer {
    /// 创建新的答题客户端
    pub fn new(config: &Config) -> Self {
        Self::with_url(config.answer_url())
    }

    /// 使用自定义 URL 创建
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    async fn call(&self, text: &str, timeout: Duration) -> Result<String, AnswerError> {
        let response = self
            .client
            .post(&self.url)
            .json(&AnswerRequest { question: text })
            .send()
            .await
            .map_err(|e| classify_reqwest_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnswerError::Http {
                status: Some(status.as_u16()),
                message: truncate_text(&body, 200),
            });
        }

        let body: AnswerResponse = response
            .json()
            .await
            .map_err(|e| classify_reqwest_error(e, timeout))?;

        Ok(body.answer.trim().to_string())
    }
}

#[async_trait]
impl Answerer for HttpAnswerer {
    async fn answer(&self, text: &str, timeout: Duration) -> Result<String, AnswerError> {
        debug!("调用答题接口: {} (时限: {:?})", self.url, timeout);

        match tokio::time::timeout(timeout, self.call(text, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(AnswerError::Timeout { timeout }),
        }
    }
}

fn classify_reqwest_error(err: reqwest::Error, timeout: Duration) -> AnswerError {
    if err.is_timeout() {
        AnswerError::Timeout { timeout }
    } else if err.is_decode() {
        AnswerError::Http {
            status: err.status().map(|s| s.as_u16()),
            message: format!("响应体无法解析: {}", err),
        }
    } else {
        AnswerError::Network {
            message: err.to_string(),
        }
    }
}
