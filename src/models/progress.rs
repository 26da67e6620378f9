use serde::{Deserialize, Serialize};

/// 进度快照
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// 已完成数量
    pub completed: usize,
    /// 总数
    pub total: usize,
    /// 完成比例，范围 [0, 1]
    pub fraction_complete: f64,
    /// 预计剩余秒数；还没有完成任何题目时为 `None`
    pub estimated_seconds_remaining: Option<f64>,
}

impl ProgressSnapshot {
    /// 百分比形式的进度
    pub fn percent(&self) -> f64 {
        self.fraction_complete * 100.0
    }

    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }
}
