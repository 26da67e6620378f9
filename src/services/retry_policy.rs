//! 重试策略 - 业务能力层
//!
//! 只负责"失败后隔一段时间再试"，不关心并发和进度

use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::clients::Answerer;
use crate::config::Config;
use crate::models::{AnswerOutcome, FailureKind, Question};
use crate::services::ErrorSink;

/// 固定间隔的有限次重试
///
/// 超时、网络错误、HTTP 错误都会重试。
/// `retry_client_errors` 为 `false` 时 4xx 直接失败，不再重试。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最多尝试次数（0 按 1 处理）
    pub max_attempts: u32,
    /// 两次尝试之间的等待
    pub backoff: Duration,
    /// 单次调用时限
    pub timeout: Duration,
    /// 4xx 是否重试
    pub retry_client_errors: bool,
}

impl RetryPolicy {
    /// 创建新的重试策略
    pub fn new(max_attempts: u32, backoff: Duration, timeout: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
            timeout,
            retry_client_errors: true,
        }
    }

    /// 从配置创建
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_attempts,
            config.backoff(),
            config.request_timeout(),
        )
        .with_retry_client_errors(config.retry_client_errors)
    }

    pub fn with_retry_client_errors(mut self, retry: bool) -> Self {
        self.retry_client_errors = retry;
        self
    }

    /// 回答一道题，必要时重试
    ///
    /// 每次失败都会以"第 n/max 次尝试"的形式写入 `sink`。
    /// 等待只发生在当前任务上，不影响其他并发任务。
    pub async fn execute(
        &self,
        answerer: &dyn Answerer,
        question: &Question,
        sink: &ErrorSink,
    ) -> AnswerOutcome {
        let max_attempts = self.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match answerer.answer(&question.text, self.timeout).await {
                Ok(answer) => {
                    debug!(
                        "[题目 #{}] 第 {}/{} 次尝试成功",
                        question.index, attempt, max_attempts
                    );
                    return AnswerOutcome::Success {
                        answer,
                        attempts: attempt,
                    };
                }
                Err(err) => {
                    sink.record_message(format!(
                        "[题目 #{}] 第 {}/{} 次尝试失败 ({}): {}",
                        question.index,
                        attempt,
                        max_attempts,
                        err.kind(),
                        err
                    ));

                    if err.is_client_error() && !self.retry_client_errors {
                        return AnswerOutcome::Failure {
                            reason: FailureKind::HttpError,
                            attempts: attempt,
                        };
                    }

                    if attempt < max_attempts {
                        debug!(
                            "[题目 #{}] 等待 {:?} 后重试...",
                            question.index, self.backoff
                        );
                        sleep(self.backoff).await;
                    }
                }
            }
        }

        AnswerOutcome::Failure {
            reason: FailureKind::RetriesExhausted,
            attempts: max_attempts,
        }
    }
}
