//! 渲染表面抽象 - 基础设施层
//!
//! 在沙箱里显示不受信任的题目 HTML，并提供表单事件通道：
//! 注入监听器、读取表单、切换提交按钮、拉取事件

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{FormSnapshot, SubmitControl};

/// 渲染表面上报的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// 内容显示完成，`content` 为实际显示的内容
    Loaded { content: String },
    /// 表单字段被修改
    FieldChanged,
    /// 用户点击了提交控件
    Submit { control: SubmitControl },
}

#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// 显示题目内容；完成后应上报 `Loaded`
    async fn display(&self, markup: &str) -> AppResult<()>;

    /// 向题目表单注入监听器；找不到表单时返回 false
    async fn attach_listeners(&self) -> AppResult<bool>;

    /// 读取当前表单字段；找不到表单时返回 None
    async fn read_form(&self) -> AppResult<Option<FormSnapshot>>;

    /// 启用 / 禁用提交评分按钮
    async fn set_submit_enabled(&self, enabled: bool) -> AppResult<()>;

    /// 取出自上次调用以来的事件
    async fn poll_events(&self) -> AppResult<Vec<SurfaceEvent>>;
}
