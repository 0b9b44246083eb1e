//! 防抖服务 - 业务能力层
//!
//! 尾沿触发：一串连续调用只执行最后一次，且在静默期结束后才执行

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct Generations {
    /// 最近一次 schedule / cancel 的代号
    latest: AtomicU64,
    /// 已经执行或被取消的代号
    settled: AtomicU64,
}

/// 尾沿防抖器
///
/// 每次 `schedule` 都会使之前尚未触发的动作失效；
/// 已经开始执行的动作不受影响
#[derive(Debug, Clone)]
pub struct Debouncer {
    name: &'static str,
    window: Duration,
    generations: Arc<Generations>,
}

impl Debouncer {
    pub fn new(name: &'static str, window: Duration) -> Self {
        Self {
            name,
            window,
            generations: Arc::new(Generations::default()),
        }
    }

    /// 安排一次动作，静默期内的后续调用会取代它
    pub fn schedule<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generations.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let generations = Arc::clone(&self.generations);
        let window = self.window;
        let name = self.name;

        trace!("[{}] 安排第 {} 次，{:?} 后触发", name, generation, window);

        tokio::spawn(async move {
            sleep(window).await;
            if generations.latest.load(Ordering::SeqCst) != generation {
                trace!("[{}] 第 {} 次已被合并", name, generation);
                return;
            }
            generations.settled.store(generation, Ordering::SeqCst);
            debug!("[{}] 静默期结束，执行第 {} 次", name, generation);
            action().await;
        });
    }

    /// 取消尚未触发的动作
    pub fn cancel(&self) {
        let generation = self.generations.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.generations.settled.store(generation, Ordering::SeqCst);
    }

    /// 是否有尚未触发的动作
    pub fn is_pending(&self) -> bool {
        self.generations.latest.load(Ordering::SeqCst)
            != self.generations.settled.load(Ordering::SeqCst)
    }
}
