use anyhow::Result;
use question_autotest::utils::logging;
use question_autotest::{App, Config};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 每行一道题
    let texts = read_questions().await?;
    if texts.is_empty() {
        warn!("⚠️ 没有读取到题目，程序结束");
        return Ok(());
    }

    let app = App::initialize(config)?;

    // Ctrl-C 只停止派发新题目，已经开始的题目自然结束
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⏹ 收到 Ctrl-C，不再开始新的题目，等待进行中的题目结束...");
            ctrl_c.cancel();
        }
    });

    let rows = app.run(texts, &cancel).await?;
    app.persist_errors().await?;

    println!("{}", serde_json::to_string_pretty(&rows)?);

    Ok(())
}

/// 从 stdin 读取题目，跳过空行
async fn read_questions() -> Result<Vec<String>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut texts = Vec::new();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if !line.is_empty() {
            texts.push(line.to_string());
        }
    }
    Ok(texts)
}
