//! 用户提示服务 - 业务能力层
//!
//! 网络失败与后端错误不会向上传播，而是变成一条可关闭的提示

use chrono::{DateTime, Utc};
use tracing::warn;

/// 一条用户可见的提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub id: u64,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

/// 提示列表
#[derive(Debug, Default, Clone)]
pub struct AlertBoard {
    next_id: u64,
    alerts: Vec<Alert>,
}

impl AlertBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新增提示，返回其 ID
    pub fn raise(&mut self, message: impl Into<String>) -> u64 {
        self.next_id += 1;
        let alert = Alert {
            id: self.next_id,
            message: message.into(),
            raised_at: Utc::now(),
        };
        warn!("⚠️ 提示 #{}: {}", alert.id, alert.message);
        self.alerts.push(alert);
        self.next_id
    }

    /// 关闭提示，返回是否存在
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|a| a.id != id);
        self.alerts.len() != before
    }

    pub fn active(&self) -> &[Alert] {
        &self.alerts
    }
}
