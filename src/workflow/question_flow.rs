//! 题目处理流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整处理流程
//!
//! 流程顺序：
//! 1. 调用答题接口（RetryPolicy 负责超时和重试）
//! 2. 失败的尝试写入 ErrorSink
//! 3. 返回最终结果（成功或带类型的失败）

use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::Answerer;
use crate::models::{AnswerOutcome, Question};
use crate::services::{ErrorSink, RetryPolicy};
use crate::utils::logging::truncate_text;

/// 题目处理流程
///
/// - 编排单个题目的处理
/// - 不持有题目集合，不关心并发和进度
/// - 只依赖业务能力（clients / services）
/// - 失败是数据，不会以错误的形式返回
pub struct QuestionFlow {
    answerer: Arc<dyn Answerer>,
    retry_policy: RetryPolicy,
    error_sink: ErrorSink,
    verbose_logging: bool,
}

impl QuestionFlow {
    /// 创建新的题目处理流程
    pub fn new(answerer: Arc<dyn Answerer>, retry_policy: RetryPolicy, error_sink: ErrorSink) -> Self {
        Self {
            answerer,
            retry_policy,
            error_sink,
            verbose_logging: false,
        }
    }

    /// 是否输出每道题的详细日志
    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose_logging = verbose;
        self
    }

    pub fn error_sink(&self) -> &ErrorSink {
        &self.error_sink
    }

    /// 处理一道题
    pub async fn run(&self, question: &Question) -> AnswerOutcome {
        if self.verbose_logging {
            self.log_question(question);
        }

        let outcome = self
            .retry_policy
            .execute(self.answerer.as_ref(), question, &self.error_sink)
            .await;

        match &outcome {
            AnswerOutcome::Success { answer, attempts } => {
                if self.verbose_logging {
                    info!(
                        "[题目 #{}] ✓ 回答成功 (尝试 {} 次): {}",
                        question.index,
                        attempts,
                        truncate_text(answer, 80)
                    );
                }
            }
            AnswerOutcome::Failure { reason, attempts } => {
                warn!(
                    "[题目 #{}] ❌ 回答失败: {} (尝试 {} 次)",
                    question.index, reason, attempts
                );
            }
        }

        outcome
    }

    /// 显示题干预览
    fn log_question(&self, question: &Question) {
        info!(
            "[题目 #{}] 题干: {}",
            question.index,
            truncate_text(&question.text, 80)
        );
    }
}
