use anyhow::Result;
use order_tally::utils::logging;
use order_tally::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let app = App::initialize(config).await?;
    let done = app.run().await?;

    if let Some(err) = done.error {
        tracing::warn!("⚠️ 扫描提前结束: {}", err);
    }

    Ok(())
}
