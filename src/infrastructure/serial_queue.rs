//! 串行任务队列 - 基础设施层
//!
//! 显式对象，按引用传递给需要串行执行异步任务的地方，
//! 任务按到达顺序逐个执行，不会交错

use std::future::Future;

use tokio::sync::Mutex;
use tracing::trace;

/// 串行任务队列
#[derive(Debug)]
pub struct SerialQueue {
    name: &'static str,
    turn: Mutex<()>,
}

impl SerialQueue {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            turn: Mutex::new(()),
        }
    }

    /// 等到前面的任务都完成后再执行 `task`
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let _turn = self.turn.lock().await;
        trace!("[{}] 轮到新任务", self.name);
        task.await
    }
}
