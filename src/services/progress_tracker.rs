//! 进度计算
//!
//! 纯函数：只依赖输入，不保存状态

use crate::models::ProgressSnapshot;

/// 进度计算器
pub struct ProgressTracker;

impl ProgressTracker {
    /// 计算进度快照
    ///
    /// 剩余时间按已观察到的平均每题耗时线性外推：
    /// `(elapsed / completed) * total - elapsed`。
    /// 还没有完成任何题目时没有样本，剩余时间为 `None`。
    ///
    /// `total` 为 0 时完成比例记为 0（执行器不会这样调用）。
    pub fn snapshot(completed: usize, total: usize, elapsed_seconds: f64) -> ProgressSnapshot {
        let fraction_complete = if total == 0 {
            0.0
        } else {
            (completed as f64 / total as f64).clamp(0.0, 1.0)
        };

        let estimated_seconds_remaining = if completed == 0 {
            None
        } else {
            let per_item = elapsed_seconds / completed as f64;
            Some((per_item * total as f64 - elapsed_seconds).max(0.0))
        };

        ProgressSnapshot {
            completed,
            total,
            fraction_complete,
            estimated_seconds_remaining,
        }
    }
}
