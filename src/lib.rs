//! # Question Autotest
//!
//! 一个批量回答题目的 Rust 应用程序：
//! 把一组题目并发发送到外部答题接口，带超时、重试和进度汇报，
//! 最终按原始行号返回每道题的答案或带类型的失败。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 只暴露能力，不做重试
//! - `HttpAnswerer` - 单次调用答题接口，限时并分类结果
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个题目或单个条目
//! - `RetryPolicy` - 固定间隔的有限次重试
//! - `ProgressTracker` - 进度与剩余时间估算
//! - `ErrorSink` - 只追加的诊断日志
//! - `LlmJudge` - LLM 判断答案是否回答了题目
//! - `ErrorLogWriter` - 写错误日志文件能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整处理流程
//! - `QuestionFlow` - 流程编排（答题 → 重试 → 记录失败）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_executor` - 批量执行器，管理 worker 和并发
//! - `orchestrator/app` - 应用编排，组装各层并生成标注结果
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{AnswerError, Answerer, HttpAnswerer};
pub use config::Config;
pub use error::{AppError, AppResult, InvalidInput};
pub use models::{
    AnnotatedRow, AnswerOutcome, BatchResult, ErrorLogEntry, FailureKind, Judgement,
    ProgressSnapshot, Question,
};
pub use orchestrator::{App, BatchExecutor};
pub use services::{AnswerJudge, ErrorSink, LlmJudge, ProgressTracker, RetryPolicy};
pub use workflow::QuestionFlow;
