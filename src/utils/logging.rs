/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化（例如测试里）时忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 题目渲染 / 提交协调器");
    info!("🌐 后端地址: {}", config.api_base_url);
    info!(
        "⏱️ 自动保存静默期: {}ms, 提交防抖: {}ms",
        config.autosave_debounce_ms, config.submit_debounce_ms
    );
    info!("{}", "=".repeat(60));
}

/// 记录程序结束信息
pub fn log_shutdown(events_handled: usize) {
    info!("\n{}", "─".repeat(60));
    info!(
        "👋 程序结束 {}，共处理 {} 个页面事件",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        events_handled
    );
    info!("{}", "─".repeat(60));
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
