//! 错误日志写入服务 - 业务能力层
//!
//! 只负责"把诊断条目追加到文件"能力，不关心条目从哪里来

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::ErrorLogEntry;

/// 默认错误日志文件
pub const DEFAULT_ERROR_LOG_FILE: &str = "autotest_errors.log";

/// 错误日志写入服务
///
/// 职责：
/// - 将 `ErrorSink::drain()` 取出的条目追加写入文件
/// - 每个条目一行：`[时间] 消息`
/// - 只追加，不覆盖已有内容
pub struct ErrorLogWriter {
    log_file_path: String,
}

impl ErrorLogWriter {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            log_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.log_file_path
    }

    /// 追加写入条目
    ///
    /// # 返回
    /// 返回写入的条目数量，没有条目时不创建文件
    pub async fn write(&self, entries: &[ErrorLogEntry]) -> AppResult<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        debug!(
            "写入错误日志: {} 条 -> {}",
            entries.len(),
            self.log_file_path
        );

        let content: String = entries.iter().map(|entry| format!("{}\n", entry)).collect();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .await
            .map_err(|e| AppError::file_write_failed(&self.log_file_path, e))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| AppError::file_write_failed(&self.log_file_path, e))?;
        file.flush()
            .await
            .map_err(|e| AppError::file_write_failed(&self.log_file_path, e))?;

        Ok(entries.len())
    }
}
