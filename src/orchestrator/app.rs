//! 应用编排 - 编排层
//!
//! 把配置、答题客户端、执行器和判断服务连在一起：
//! 题目文本 → BatchExecutor → BatchResult → （可选）LLM 判断 → AnnotatedRow

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::clients::{Answerer, HttpAnswerer};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{AnnotatedRow, BatchResult, Question};
use crate::orchestrator::BatchExecutor;
use crate::services::{AnswerJudge, ErrorLogWriter, ErrorSink, LlmJudge, RetryPolicy};
use crate::utils::logging::{log_progress, log_questions_loaded, log_startup, print_final_stats};
use crate::workflow::QuestionFlow;

/// 应用主结构
pub struct App {
    config: Config,
    executor: BatchExecutor,
    error_sink: ErrorSink,
    judge: Option<Arc<dyn AnswerJudge>>,
    error_log_writer: ErrorLogWriter,
}

impl App {
    /// 按配置初始化应用
    pub fn initialize(config: Config) -> AppResult<Self> {
        let answerer: Arc<dyn Answerer> = Arc::new(HttpAnswerer::new(&config));
        let judge: Option<Arc<dyn AnswerJudge>> = if config.judge_enabled {
            Some(Arc::new(LlmJudge::new(&config)))
        } else {
            None
        };
        Self::with_components(config, answerer, judge)
    }

    /// 使用自定义的答题和判断能力初始化
    pub fn with_components(
        config: Config,
        answerer: Arc<dyn Answerer>,
        judge: Option<Arc<dyn AnswerJudge>>,
    ) -> AppResult<Self> {
        config.validate()?;
        log_startup(&config);

        let error_sink = ErrorSink::new();
        let flow = QuestionFlow::new(answerer, RetryPolicy::from_config(&config), error_sink.clone())
            .with_verbose_logging(config.verbose_logging);
        let executor = BatchExecutor::new(Arc::new(flow), config.concurrency());
        let error_log_writer = ErrorLogWriter::with_path(config.error_log_file.clone());

        Ok(Self {
            config,
            executor,
            error_sink,
            judge,
            error_log_writer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn error_sink(&self) -> &ErrorSink {
        &self.error_sink
    }

    /// 运行一批题目
    ///
    /// # 返回
    /// 按行号排序的标注结果，每个输入行一条
    pub async fn run(
        &self,
        texts: Vec<String>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<AnnotatedRow>> {
        let questions = Question::from_texts(texts);
        log_questions_loaded(questions.len(), self.executor.concurrency());

        let result = self
            .executor
            .run(questions.clone(), log_progress, cancel)
            .await?;

        print_final_stats(&result);

        Ok(self.annotate(&questions, &result).await)
    }

    /// 把结果转换为标注行，并对成功的行做判断
    ///
    /// 判断失败只记录到 ErrorSink，不影响答案本身。
    /// 批量被取消时跳过判断。
    async fn annotate(&self, questions: &[Question], result: &BatchResult) -> Vec<AnnotatedRow> {
        let rows: Vec<AnnotatedRow> = questions
            .iter()
            .map(|q| AnnotatedRow::from_outcome(q, result.get(q.index)))
            .collect();

        let judge = match &self.judge {
            Some(judge) if !result.cancelled => Arc::clone(judge),
            _ => return rows,
        };

        info!("🤖 使用 LLM 判断 {} 个答案...", result.succeeded);

        let mut judged: Vec<AnnotatedRow> = stream::iter(rows)
            .map(|row| {
                let judge = Arc::clone(&judge);
                let sink = self.error_sink.clone();
                async move {
                    let Some(answer) = row.answer.clone() else {
                        return row;
                    };
                    match judge.judge(&row.question, &answer).await {
                        Ok(judgement) => row.with_judgement(judgement),
                        Err(e) => {
                            sink.record_message(format!("[题目 #{}] 判断失败: {}", row.index, e));
                            row
                        }
                    }
                }
            })
            .buffer_unordered(self.executor.concurrency())
            .collect()
            .await;

        judged.sort_by_key(|row| row.index);
        judged
    }

    /// 把诊断日志写入文件
    ///
    /// # 返回
    /// 写入的条目数量
    pub async fn persist_errors(&self) -> AppResult<usize> {
        let entries = self.error_sink.drain();
        let written = self.error_log_writer.write(&entries).await?;
        if written > 0 {
            info!(
                "📝 {} 条错误日志已保存至: {}",
                written,
                self.error_log_writer.path()
            );
        }
        Ok(written)
    }
}
