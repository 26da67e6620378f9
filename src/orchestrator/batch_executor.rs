//! 批量答题执行器 - 编排层
//!
//! ## 职责
//!
//! 把一组题目分派到固定数量的 worker 上，收集每道题的结果并汇报进度。
//!
//! ## 核心功能
//!
//! 1. **输入校验**：题目集合为空、行号重复或越界时，在派发任何请求之前失败
//! 2. **并发控制**：`min(concurrency, 题目数)` 个 worker 从共享队列按顺序取题，
//!    不会为每道题单独开任务
//! 3. **完成通道**：worker 通过 mpsc 通道上报 `(行号, 结果)`，
//!    协调者按完成顺序消费，每完成一道就回调一次进度
//! 4. **协作式取消**：worker 取下一道题之前检查取消信号，
//!    已经开始的题目自然结束（或超时），不会被强行中断
//! 5. **结果重排**：无论完成顺序如何，结果都按行号排序
//!
//! ## 设计特点
//!
//! - **失败是数据**：单题失败记为 `AnswerOutcome::Failure`，不会中断整批
//! - **panic 隔离**：单题 panic 时该题缺失，worker 继续处理后面的题目
//! - **无跨批状态**：每次 `run()` 都从零开始，结果的生命周期归调用方
//! - **顺序执行**：`concurrency = 1` 即为顺序执行，没有单独的代码路径

use futures::FutureExt;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{AppResult, InvalidInput};
use crate::models::{validate_question_set, AnswerOutcome, BatchResult, ProgressSnapshot, Question};
use crate::services::ProgressTracker;
use crate::workflow::QuestionFlow;

/// 批量答题执行器
pub struct BatchExecutor {
    flow: Arc<QuestionFlow>,
    concurrency: usize,
}

impl BatchExecutor {
    /// 创建新的执行器
    pub fn new(flow: Arc<QuestionFlow>, concurrency: usize) -> Self {
        Self { flow, concurrency }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn flow(&self) -> &QuestionFlow {
        &self.flow
    }

    /// 执行一批题目
    ///
    /// # 参数
    /// - `questions`: 题目集合（行号唯一，位于 `[0, 题目数)`）
    /// - `on_progress`: 每完成一道题调用一次
    /// - `cancel`: 取消信号；触发后不再开始新题目
    ///
    /// # 返回
    /// 按行号排序的结果。未取消时每道题恰好一个结果；
    /// 取消时只包含已完成的题目，缺少的行号表示未尝试。
    pub async fn run<F>(
        &self,
        questions: Vec<Question>,
        mut on_progress: F,
        cancel: &CancellationToken,
    ) -> AppResult<BatchResult>
    where
        F: FnMut(&ProgressSnapshot),
    {
        if self.concurrency == 0 {
            return Err(InvalidInput::ZeroConcurrency.into());
        }
        validate_question_set(&questions)?;

        let total = questions.len();
        let worker_count = self.concurrency.min(total);
        let start = Instant::now();

        info!(
            "🚀 开始批量处理: {} 道题, {} 个 worker",
            total, worker_count
        );

        let queue = Arc::new(Mutex::new(VecDeque::from(questions)));
        let (tx, mut rx) = mpsc::channel::<(usize, AnswerOutcome)>(worker_count);

        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            let queue = Arc::clone(&queue);
            let flow = Arc::clone(&self.flow);
            let tx = tx.clone();
            let cancel = cancel.clone();

            workers.spawn(async move {
                let mut handled = 0usize;
                loop {
                    if cancel.is_cancelled() {
                        debug!("[worker {}] 收到取消信号，不再取题", worker_id);
                        break;
                    }

                    let next = queue
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .pop_front();
                    let Some(question) = next else {
                        break;
                    };

                    // 单题 panic 只丢失这一道题，worker 继续取题
                    let outcome = match AssertUnwindSafe(flow.run(&question)).catch_unwind().await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            error!(
                                "[worker {}] 题目 #{} 处理时发生 panic，结果缺失",
                                worker_id, question.index
                            );
                            continue;
                        }
                    };
                    handled += 1;

                    if tx.send((question.index, outcome)).await.is_err() {
                        break;
                    }
                }
                debug!("[worker {}] 退出，共处理 {} 道题", worker_id, handled);
                handled
            });
        }
        // 只保留 worker 手里的发送端，全部退出后通道关闭
        drop(tx);

        let mut result = BatchResult::new(total);
        let mut completed = 0usize;
        while let Some((index, outcome)) = rx.recv().await {
            if result.insert(index, outcome) {
                completed += 1;
            } else {
                warn!("[题目 #{}] 重复的结果已忽略", index);
            }

            let snapshot =
                ProgressTracker::snapshot(completed, total, start.elapsed().as_secs_f64());
            on_progress(&snapshot);
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("worker 任务执行失败: {}", e);
            }
        }

        result.cancelled = cancel.is_cancelled();
        result.total_elapsed_seconds = start.elapsed().as_secs_f64();

        if result.cancelled && !result.is_complete() {
            warn!(
                "⏹ 批量处理已取消: 完成 {}/{}，{} 道题未尝试",
                result.len(),
                total,
                total - result.len()
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{AnswerError, Answerer};
    use crate::models::FailureKind;
    use crate::services::{ErrorSink, RetryPolicy};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// 回显题目；题目以 "fail" 开头时总是超时。记录最大同时在途数。
    struct EchoAnswerer {
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl EchoAnswerer {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Answerer for EchoAnswerer {
        async fn answer(&self, text: &str, timeout: Duration) -> Result<String, AnswerError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if text.starts_with("fail") {
                Err(AnswerError::Timeout { timeout })
            } else {
                Ok(format!("echo: {}", text))
            }
        }
    }

    fn executor(answerer: Arc<EchoAnswerer>, concurrency: usize) -> BatchExecutor {
        let policy = RetryPolicy::new(2, Duration::ZERO, Duration::from_secs(1));
        let flow = QuestionFlow::new(answerer, policy, ErrorSink::new());
        BatchExecutor::new(Arc::new(flow), concurrency)
    }

    #[tokio::test]
    async fn test_every_question_gets_one_outcome() {
        let answerer = Arc::new(EchoAnswerer::new(Duration::from_millis(5)));
        let executor = executor(answerer, 4);
        let texts: Vec<String> = (0..20).map(|i| format!("q{}", i)).collect();

        let result = executor
            .run(Question::from_texts(texts), |_| {}, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.len(), 20);
        assert!(result.is_complete());
        assert!(!result.cancelled);
        assert_eq!(
            result.outcomes.keys().copied().collect::<Vec<_>>(),
            (0..20).collect::<Vec<_>>()
        );
        assert_eq!(result.get(7).and_then(|o| o.answer()), Some("echo: q7"));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let answerer = Arc::new(EchoAnswerer::new(Duration::from_millis(10)));
        let executor = executor(Arc::clone(&answerer), 3);
        let texts: Vec<String> = (0..12).map(|i| format!("q{}", i)).collect();

        executor
            .run(Question::from_texts(texts), |_| {}, &CancellationToken::new())
            .await
            .unwrap();

        let max = answerer.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 3, "同时在途 {} 超过并发上限", max);
    }

    #[tokio::test]
    async fn test_failures_are_data() {
        let answerer = Arc::new(EchoAnswerer::new(Duration::ZERO));
        let executor = executor(answerer, 2);
        let questions = Question::from_texts(["ok", "fail me", "ok again"]);

        let result = executor
            .run(questions, |_| {}, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(
            result.get(1),
            Some(&AnswerOutcome::Failure {
                reason: FailureKind::RetriesExhausted,
                attempts: 2
            })
        );
        // 每次失败的尝试都写入了 ErrorSink
        assert_eq!(executor.flow().error_sink().len(), 2);
    }

    #[tokio::test]
    async fn test_progress_after_every_completion() {
        let answerer = Arc::new(EchoAnswerer::new(Duration::from_millis(1)));
        let executor = executor(answerer, 3);
        let texts: Vec<String> = (0..9).map(|i| format!("q{}", i)).collect();

        let mut snapshots = Vec::new();
        executor
            .run(
                Question::from_texts(texts),
                |s| snapshots.push(*s),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(snapshots.len(), 9);
        let completed: Vec<usize> = snapshots.iter().map(|s| s.completed).collect();
        assert_eq!(completed, (1..=9).collect::<Vec<_>>());
        let last = snapshots.last().unwrap();
        assert_eq!(last.fraction_complete, 1.0);
        assert_eq!(last.estimated_seconds_remaining, Some(0.0));
    }

    #[tokio::test]
    async fn test_invalid_input_fails_before_dispatch() {
        let answerer = Arc::new(EchoAnswerer::new(Duration::ZERO));
        let executor = executor(Arc::clone(&answerer), 2);

        let err = executor
            .run(Vec::new(), |_| {}, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());

        let duplicated = vec![Question::new(0, "a"), Question::new(0, "b")];
        let err = executor
            .run(duplicated, |_| {}, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(answerer.max_in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_rejected() {
        let answerer = Arc::new(EchoAnswerer::new(Duration::ZERO));
        let executor = executor(answerer, 0);

        let err = executor
            .run(Question::from_texts(["a"]), |_| {}, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    /// 遇到 "bad" 时直接 panic
    struct PanickingAnswerer;

    #[async_trait]
    impl Answerer for PanickingAnswerer {
        async fn answer(&self, text: &str, _timeout: Duration) -> Result<String, AnswerError> {
            if text == "bad" {
                panic!("答题接口崩溃");
            }
            Ok(text.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_panicking_question_does_not_stop_worker() {
        let policy = RetryPolicy::new(1, Duration::ZERO, Duration::from_secs(1));
        let flow = QuestionFlow::new(Arc::new(PanickingAnswerer), policy, ErrorSink::new());
        let executor = BatchExecutor::new(Arc::new(flow), 1);

        let mut completed = Vec::new();
        let result = executor
            .run(
                Question::from_texts(["bad", "a", "b", "c"]),
                |s| completed.push(s.completed),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(!result.cancelled);
        assert_eq!(result.len(), 3);
        assert_eq!(result.missing_indices(), vec![0]);
        assert_eq!(result.get(3).and_then(|o| o.answer()), Some("C"));
        assert_eq!(completed, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let answerer = Arc::new(EchoAnswerer::new(Duration::ZERO));
        let executor = executor(answerer, 2);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = executor
            .run(Question::from_texts(["a", "b", "c"]), |_| {}, &cancel)
            .await
            .unwrap();

        assert!(result.is_empty());
        assert!(result.cancelled);
        assert_eq!(result.missing_indices(), vec![0, 1, 2]);
    }
}
