/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::{BatchResult, ProgressSnapshot};

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则默认 `info`（详细模式为 `debug`）。
/// 日志写到 stderr，stdout 留给结果输出。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量答题模式");
    info!("📊 最大并发数: {}", config.concurrency());
    info!(
        "🔁 每题最多尝试 {} 次, 间隔 {:.1} 秒, 单次时限 {:.1} 秒",
        config.max_attempts, config.backoff_secs, config.request_timeout_secs
    );
    info!("🌐 答题接口: {}", config.answer_url());
    info!("{}", "=".repeat(60));
}

/// 记录题目加载信息
pub fn log_questions_loaded(total: usize, concurrency: usize) {
    info!("✓ 读取到 {} 道待回答的题目", total);
    info!("📋 将以最多 {} 个并发处理\n", concurrency.min(total));
}

/// 记录进度
pub fn log_progress(snapshot: &ProgressSnapshot) {
    info!(
        "⏳ 进度 {}/{} ({:.1}%) 预计剩余: {}",
        snapshot.completed,
        snapshot.total,
        snapshot.percent(),
        format_eta(snapshot.estimated_seconds_remaining)
    );
}

/// 打印最终统计信息
pub fn print_final_stats(result: &BatchResult) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", result.succeeded, result.total);
    info!("❌ 失败: {}", result.failed);
    if result.cancelled {
        info!("⏹ 未尝试: {}", result.total - result.len());
    }
    info!("⏱ 总耗时: {:.1} 秒", result.total_elapsed_seconds);
    info!("{}", "=".repeat(60));
}

/// 格式化剩余时间
///
/// 没有样本时返回 "计算中"
pub fn format_eta(seconds: Option<f64>) -> String {
    match seconds {
        None => "计算中".to_string(),
        Some(s) => {
            let total = s.round() as u64;
            let (minutes, secs) = (total / 60, total % 60);
            if minutes > 0 {
                format!("{}分{}秒", minutes, secs)
            } else {
                format!("{}秒", secs)
            }
        }
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
