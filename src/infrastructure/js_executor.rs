//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"写入内容"和"执行 JS"的能力

use std::sync::Arc;

use chromiumoxide::Page;
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult, SurfaceError};
use crate::infrastructure::serial_queue::SerialQueue;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 所有页面操作都经过同一个串行队列，事件轮询与协调器不会交错
/// - 不认识题目 / 表单
pub struct JsExecutor {
    page: Page,
    queue: Arc<SerialQueue>,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page, queue: Arc<SerialQueue>) -> Self {
        Self { page, queue }
    }

    /// 用给定 HTML 替换整个页面内容
    pub async fn set_content(&self, html: &str) -> AppResult<()> {
        self.queue
            .run(async {
                self.page
                    .set_content(html)
                    .await
                    .map_err(|e| SurfaceError::DisplayFailed {
                        source: Box::new(e),
                    })?;
                Ok::<(), AppError>(())
            })
            .await
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let js_code = js_code.into();
        self.queue
            .run(async {
                let result = self.page.evaluate(js_code).await?;
                let typed_value = result
                    .into_value()
                    .map_err(|source| SurfaceError::UnexpectedScriptResult {
                        what: std::any::type_name::<T>(),
                        source,
                    })?;
                Ok::<T, AppError>(typed_value)
            })
            .await
    }
}
