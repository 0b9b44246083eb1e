pub mod connection;
pub mod headless;

use anyhow::Result;
use chromiumoxide::{Browser, Page};

use crate::config::Config;

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;

/// 按配置启动或连接浏览器
pub async fn open_surface_page(config: &Config) -> Result<(Browser, Page)> {
    if config.headless {
        launch_headless_browser(config.chrome_executable.as_deref()).await
    } else {
        connect_to_browser(config.browser_debug_port).await
    }
}
