//! 后端响应结构
//!
//! 后端统一返回 `{ "data": ..., "message": ... }`

use serde::Deserialize;

/// 统一响应外壳
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// 渲染 / 提交接口的 data 部分
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererPayload {
    #[serde(default)]
    pub renderer_data: Option<RendererData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RendererData {
    #[serde(rename = "renderedHTML", default)]
    pub rendered_html: Option<String>,
}

/// 保存作答状态接口的 data 部分
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePayload {
    #[serde(default)]
    pub updates_count: u64,
}

/// 后端渲染好的题目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedProblem {
    pub markup: String,
}

impl RenderedProblem {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }
}

/// 保存作答状态的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    /// 后端实际更新的行数
    pub updates_count: u64,
}

impl SaveOutcome {
    pub fn changed(self) -> bool {
        self.updates_count > 0
    }
}

impl RendererPayload {
    pub fn into_markup(self) -> Option<String> {
        self.renderer_data.and_then(|d| d.rendered_html)
    }
}
