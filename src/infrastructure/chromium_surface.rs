//! 基于 chromiumoxide 页面的渲染表面
//!
//! 题目 HTML 直接写入页面；监听器把事件推入页面内的队列 `window.__problemEvents`，
//! 由 `poll_events` 取出

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::AppResult;
use crate::infrastructure::js_executor::JsExecutor;
use crate::infrastructure::surface::{RenderSurface, SurfaceEvent};
use crate::models::{FormSnapshot, SubmitAction, SubmitControl};

/// 查找题目表单的 JS 片段
const FIND_FORM: &str =
    "document.getElementById('problemMainForm') || document.querySelector('form')";

/// 页面事件队列里的原始事件
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RawEvent {
    FieldChanged,
    Submit { name: String, value: String },
}

#[derive(Debug, Deserialize)]
struct RawForm {
    found: bool,
    #[serde(default)]
    fields: Vec<(String, String)>,
}

/// chromium 渲染表面
pub struct ChromiumSurface {
    executor: JsExecutor,
    /// 由 Rust 侧产生的事件（Loaded）
    local_events: Mutex<VecDeque<SurfaceEvent>>,
}

impl ChromiumSurface {
    pub fn new(executor: JsExecutor) -> Self {
        Self {
            executor,
            local_events: Mutex::new(VecDeque::new()),
        }
    }

    fn attach_script() -> String {
        format!(
            r#"
            (() => {{
                const form = {find_form};
                if (!form) {{
                    return false;
                }}
                window.__problemEvents = window.__problemEvents || [];
                if (form.dataset.listenersAttached === '1') {{
                    return true;
                }}
                form.dataset.listenersAttached = '1';
                form.addEventListener('input', () => {{
                    window.__problemEvents.push({{ kind: 'field_changed' }});
                }});
                form.addEventListener('change', () => {{
                    window.__problemEvents.push({{ kind: 'field_changed' }});
                }});
                form.addEventListener('submit', (ev) => {{
                    ev.preventDefault();
                    const submitter = ev.submitter;
                    window.__problemEvents.push({{
                        kind: 'submit',
                        name: submitter && submitter.name ? submitter.name : '{grade_control}',
                        value: submitter && submitter.value ? submitter.value : ''
                    }});
                }});
                return true;
            }})()
            "#,
            find_form = FIND_FORM,
            grade_control = SubmitAction::GRADE_CONTROL_NAME,
        )
    }

    fn read_form_script() -> String {
        format!(
            r#"
            (() => {{
                const form = {find_form};
                if (!form) {{
                    return {{ found: false }};
                }}
                const fields = [];
                for (const [name, value] of new FormData(form).entries()) {{
                    if (typeof value === 'string') {{
                        fields.push([name, value]);
                    }}
                }}
                return {{ found: true, fields }};
            }})()
            "#,
            find_form = FIND_FORM,
        )
    }

    fn toggle_submit_script(enabled: bool) -> String {
        format!(
            r#"
            (() => {{
                const controls = document.querySelectorAll('[name="{grade_control}"]');
                controls.forEach((el) => {{ el.disabled = {disabled}; }});
                return controls.length;
            }})()
            "#,
            grade_control = SubmitAction::GRADE_CONTROL_NAME,
            disabled = !enabled,
        )
    }

    const DRAIN_SCRIPT: &'static str = r#"
        (() => {
            const queue = window.__problemEvents || [];
            window.__problemEvents = [];
            return queue;
        })()
    "#;
}

#[async_trait]
impl RenderSurface for ChromiumSurface {
    async fn display(&self, markup: &str) -> AppResult<()> {
        self.executor.set_content(markup).await?;
        self.local_events.lock().push_back(SurfaceEvent::Loaded {
            content: markup.to_string(),
        });
        debug!("页面内容已写入，{} 字节", markup.len());
        Ok(())
    }

    async fn attach_listeners(&self) -> AppResult<bool> {
        self.executor.eval_as(Self::attach_script()).await
    }

    async fn read_form(&self) -> AppResult<Option<FormSnapshot>> {
        let raw: RawForm = self.executor.eval_as(Self::read_form_script()).await?;
        if !raw.found {
            return Ok(None);
        }
        Ok(Some(FormSnapshot::from_pairs(raw.fields)))
    }

    async fn set_submit_enabled(&self, enabled: bool) -> AppResult<()> {
        let count: u64 = self
            .executor
            .eval_as(Self::toggle_submit_script(enabled))
            .await?;
        trace!("提交按钮 {} 个，enabled={}", count, enabled);
        Ok(())
    }

    async fn poll_events(&self) -> AppResult<Vec<SurfaceEvent>> {
        let mut events: Vec<SurfaceEvent> = self.local_events.lock().drain(..).collect();
        let raw: Vec<RawEvent> = self.executor.eval_as(Self::DRAIN_SCRIPT).await?;
        events.extend(raw.into_iter().map(|event| match event {
            RawEvent::FieldChanged => SurfaceEvent::FieldChanged,
            RawEvent::Submit { name, value } => SurfaceEvent::Submit {
                control: SubmitControl::new(name, value),
            },
        }));
        Ok(events)
    }
}
