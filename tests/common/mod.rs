//! 测试用的后端与渲染表面替身

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use problem_render_submit::models::{RenderedProblem, SaveOutcome};
use problem_render_submit::workflow::{PreviewParams, SaveTarget};
use problem_render_submit::{
    AppError, AppResult, Coordinator, CoordinatorSettings, FormSnapshot, ProblemApi,
    ProblemIdentifiers, RenderSurface, SurfaceEvent,
};

pub type RenderReply = AppResult<RenderedProblem>;

/// 默认返回的题目内容
pub fn markup_for(problem_id: u64) -> String {
    format!("<form id=\"problemMainForm\">problem-{}</form>", problem_id)
}

/// 后端替身
///
/// 未登记闸门的题目立即返回 `markup_for(id)`；
/// 登记了闸门的题目要等测试通过 Sender 给出结果
#[derive(Default)]
pub struct FakeApi {
    gates: Mutex<HashMap<u64, VecDeque<oneshot::Receiver<RenderReply>>>>,
    save_holds: Mutex<VecDeque<oneshot::Receiver<()>>>,
    pub render_calls: Mutex<Vec<u64>>,
    pub preview_calls: Mutex<Vec<(PreviewParams, Option<FormSnapshot>)>>,
    pub submits: Mutex<Vec<FormSnapshot>>,
    pub saves: Mutex<Vec<(SaveTarget, FormSnapshot)>>,
    pub save_updates: Mutex<u64>,
    pub fail_renders: Mutex<bool>,
    pub fail_submits: Mutex<bool>,
    pub submit_markup: Mutex<Option<String>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        let api = Self::default();
        *api.save_updates.lock() = 1;
        Arc::new(api)
    }

    /// 为下一次渲染 `problem_id` 登记闸门
    pub fn gate(&self, problem_id: u64) -> oneshot::Sender<RenderReply> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().entry(problem_id).or_default().push_back(rx);
        tx
    }

    /// 让下一次保存停在半路，直到 Sender 放行
    pub fn hold_next_save(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.save_holds.lock().push_back(rx);
        tx
    }

    fn take_gate(&self, problem_id: u64) -> Option<oneshot::Receiver<RenderReply>> {
        self.gates.lock().get_mut(&problem_id).and_then(VecDeque::pop_front)
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().len()
    }

    pub fn submit_count(&self) -> usize {
        self.submits.lock().len()
    }
}

#[async_trait]
impl ProblemApi for FakeApi {
    async fn render_stored(&self, ids: &ProblemIdentifiers) -> AppResult<RenderedProblem> {
        self.render_calls.lock().push(ids.problem_id);
        if *self.fail_renders.lock() {
            return Err(AppError::bad_response(
                "courses/question",
                500,
                Some("渲染服务不可用".to_string()),
            ));
        }
        match self.take_gate(ids.problem_id) {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(AppError::bad_response("courses/question", 503, None))),
            None => Ok(RenderedProblem::new(markup_for(ids.problem_id))),
        }
    }

    async fn render_preview(
        &self,
        params: &PreviewParams,
        form: Option<&FormSnapshot>,
    ) -> AppResult<RenderedProblem> {
        self.preview_calls
            .lock()
            .push((params.clone(), form.cloned()));
        Ok(RenderedProblem::new(format!(
            "<form id=\"problemMainForm\">preview-{}-{}</form>",
            params.seed,
            self.preview_calls.lock().len()
        )))
    }

    async fn submit(
        &self,
        ids: &ProblemIdentifiers,
        payload: &FormSnapshot,
    ) -> AppResult<RenderedProblem> {
        self.submits.lock().push(payload.clone());
        if *self.fail_submits.lock() {
            return Err(AppError::bad_response(
                "courses/question",
                400,
                Some("提交格式错误".to_string()),
            ));
        }
        let markup = self
            .submit_markup
            .lock()
            .clone()
            .unwrap_or_else(|| format!("{}<!-- submitted -->", markup_for(ids.problem_id)));
        Ok(RenderedProblem::new(markup))
    }

    async fn save_state(&self, target: SaveTarget, form: &FormSnapshot) -> AppResult<SaveOutcome> {
        self.saves.lock().push((target, form.clone()));
        let hold = self.save_holds.lock().pop_front();
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        Ok(SaveOutcome {
            updates_count: *self.save_updates.lock(),
        })
    }
}

/// 渲染表面替身
#[derive(Default)]
pub struct FakeSurface {
    pub displayed: Mutex<Vec<String>>,
    pub form: Mutex<Option<FormSnapshot>>,
    pub submit_enabled: Mutex<Option<bool>>,
    pub listeners_attached: Mutex<usize>,
    pub events: Mutex<VecDeque<SurfaceEvent>>,
}

impl FakeSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_form(&self, pairs: &[(&str, &str)]) {
        *self.form.lock() = Some(FormSnapshot::from_pairs(pairs.iter().copied()));
    }

    pub fn push_event(&self, event: SurfaceEvent) {
        self.events.lock().push_back(event);
    }

    pub fn last_displayed(&self) -> Option<String> {
        self.displayed.lock().last().cloned()
    }

    pub fn submit_enabled(&self) -> Option<bool> {
        *self.submit_enabled.lock()
    }

    pub fn listener_count(&self) -> usize {
        *self.listeners_attached.lock()
    }
}

#[async_trait]
impl RenderSurface for FakeSurface {
    async fn display(&self, markup: &str) -> AppResult<()> {
        self.displayed.lock().push(markup.to_string());
        self.events.lock().push_back(SurfaceEvent::Loaded {
            content: markup.to_string(),
        });
        Ok(())
    }

    async fn attach_listeners(&self) -> AppResult<bool> {
        if self.form.lock().is_none() {
            return Ok(false);
        }
        *self.listeners_attached.lock() += 1;
        Ok(true)
    }

    async fn read_form(&self) -> AppResult<Option<FormSnapshot>> {
        Ok(self.form.lock().clone())
    }

    async fn set_submit_enabled(&self, enabled: bool) -> AppResult<()> {
        *self.submit_enabled.lock() = Some(enabled);
        Ok(())
    }

    async fn poll_events(&self) -> AppResult<Vec<SurfaceEvent>> {
        Ok(self.events.lock().drain(..).collect())
    }
}

pub fn coordinator(api: &Arc<FakeApi>, surface: &Arc<FakeSurface>) -> Coordinator {
    coordinator_with(api, surface, CoordinatorSettings::default())
}

pub fn coordinator_with(
    api: &Arc<FakeApi>,
    surface: &Arc<FakeSurface>,
    settings: CoordinatorSettings,
) -> Coordinator {
    Coordinator::new(api.clone(), surface.clone(), settings)
}

/// 可自动保存的题目
pub fn graded(problem_id: u64) -> ProblemIdentifiers {
    ProblemIdentifiers {
        grade_id: Some(100 + problem_id),
        ..ProblemIdentifiers::new(problem_id)
    }
}

/// 让已派生的任务跑到下一个挂起点
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// 加载题目并模拟渲染表面确认显示
pub async fn load_and_show(coordinator: &Coordinator, ids: ProblemIdentifiers) {
    coordinator.load_problem(ids).await;
    let markup = coordinator.view_state().markup;
    coordinator.on_markup_loaded(&markup).await;
}

pub const AUTOSAVE_QUIET: Duration = Duration::from_millis(2100);
pub const SUBMIT_QUIET: Duration = Duration::from_millis(350);
