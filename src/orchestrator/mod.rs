//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_executor` - 批量答题执行器
//! - 校验题目集合
//! - 固定数量的 worker 从队列取题（并发上限）
//! - 通过完成通道收集结果，每完成一道回调一次进度
//! - 协作式取消
//! - 按行号重排结果
//!
//! ### `app` - 应用编排
//! - 按配置组装答题客户端、重试策略、执行器
//! - 批量完成后调用 LLM 判断，生成标注行
//! - 持久化诊断日志
//!
//! ## 层次关系
//!
//! ```text
//! app (配置 → 执行器 → 判断)
//!     ↓
//! batch_executor (处理 Vec<Question>)
//!     ↓
//! workflow::QuestionFlow (处理单个 Question)
//!     ↓
//! services (能力层：retry / progress / error sink / judge)
//!     ↓
//! clients (基础设施：答题接口)
//! ```

pub mod app;
pub mod batch_executor;

// 重新导出主要类型
pub use app::App;
pub use batch_executor::BatchExecutor;
