//! 错误记录服务 - 业务能力层
//!
//! 只负责"记下失败"能力，不关心展示和持久化

use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

use crate::models::ErrorLogEntry;

/// 只追加的诊断日志
///
/// 职责：
/// - 多个 worker 并发写入，不丢条目
/// - 同一个 worker 的条目保持写入顺序（跨 worker 的顺序不保证）
/// - `drain()` 按写入顺序取出全部条目
///
/// clone 出来的句柄共享同一份日志。
#[derive(Clone, Default)]
pub struct ErrorSink {
    entries: Arc<Mutex<Vec<ErrorLogEntry>>>,
}

impl ErrorSink {
    /// 创建新的错误记录
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个条目
    pub fn record(&self, entry: ErrorLogEntry) {
        warn!("⚠️ {}", entry.message);
        self.lock().push(entry);
    }

    /// 以当前时间追加一条消息
    pub fn record_message(&self, message: impl Into<String>) {
        self.record(ErrorLogEntry::now(message));
    }

    /// 取出全部条目（按写入顺序），取出后日志为空
    pub fn drain(&self) -> Vec<ErrorLogEntry> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // 持锁期间只做 push/take，某个线程 panic 也不会留下半写的状态
    fn lock(&self) -> MutexGuard<'_, Vec<ErrorLogEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
