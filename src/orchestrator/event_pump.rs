//! 页面事件泵 - 编排层
//!
//! 按固定间隔从渲染表面拉取事件并分发给协调器，直到收到停止信号

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::infrastructure::RenderSurface;
use crate::workflow::Coordinator;

/// 运行事件泵，返回处理的事件数量
pub async fn pump_events<F>(
    surface: &dyn RenderSurface,
    coordinator: &Coordinator,
    poll_interval: Duration,
    shutdown: F,
) -> usize
where
    F: Future<Output = ()>,
{
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut handled = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("收到停止信号，事件泵退出");
                break;
            }
            _ = ticker.tick() => {
                let events = match surface.poll_events().await {
                    Ok(events) => events,
                    Err(e) => {
                        warn!("拉取页面事件失败: {}", e);
                        continue;
                    }
                };
                for event in events {
                    debug!("页面事件: {:?}", event);
                    coordinator.handle_event(event).await;
                    handled += 1;
                }
            }
        }
    }
    handled
}
