//! 应用入口 - 编排层
//!
//! 持有浏览器、渲染表面和协调器，负责启动加载与事件循环

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chromiumoxide::Browser;
use tracing::{error, info, warn};

use crate::browser;
use crate::clients::HttpProblemApi;
use crate::config::Config;
use crate::infrastructure::{ChromiumSurface, JsExecutor, SerialQueue};
use crate::orchestrator::event_pump::pump_events;
use crate::utils::logging::{log_shutdown, log_startup};
use crate::workflow::{Coordinator, LoadOutcome};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    surface: Arc<ChromiumSurface>,
    coordinator: Coordinator,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let (browser, page) = browser::open_surface_page(&config).await?;

        // 页面上的所有操作共用一个串行队列
        let queue = Arc::new(SerialQueue::new("题目页面"));
        let surface = Arc::new(ChromiumSurface::new(JsExecutor::new(page, queue)));
        let api = Arc::new(HttpProblemApi::new(&config));
        let coordinator = Coordinator::new(api, surface.clone(), config.coordinator_settings());

        Ok(Self {
            config,
            _browser: browser,
            surface,
            coordinator,
        })
    }

    /// 运行应用主逻辑：加载题目，然后处理页面事件直到 Ctrl-C
    pub async fn run(&self) -> Result<()> {
        let Some(ids) = self.config.startup_problem() else {
            warn!("⚠️ 未配置 PROBLEM_ID，程序结束");
            return Ok(());
        };

        match self.coordinator.load_problem(ids.clone()).await {
            LoadOutcome::Applied => info!("{} ✓ 题目已加载", ids),
            LoadOutcome::Superseded => info!("{} 加载被取代", ids),
            LoadOutcome::Failed => {
                for alert in self.coordinator.alerts() {
                    error!("❌ {}", alert.message);
                }
            }
        }

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("监听 Ctrl-C 失败: {}", e);
            }
        };
        let handled = pump_events(
            self.surface.as_ref(),
            &self.coordinator,
            Duration::from_millis(self.config.event_poll_interval_ms),
            shutdown,
        )
        .await;

        log_shutdown(handled);
        Ok(())
    }
}
