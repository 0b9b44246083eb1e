use anyhow::Result;
use problem_render_submit::utils::logging;
use problem_render_submit::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：可选的 TOML 文件路径作为第一个参数
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_toml_file(&path)?,
        None => Config::from_env()?,
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
