//! 题目渲染 / 提交协调器 - 流程层
//!
//! 核心职责：管理"一道正在显示的题目"的完整生命周期
//!
//! 状态流转：
//! 1. Idle → Loading（加载题目，新的加载会取代旧的）
//! 2. Loading → Loaded（渲染表面确认显示的是当前内容）
//! 3. Loaded ⇄ Saving / Submitting（自动保存、提交）
//! 4. 任意状态 → Loading（切换题目或作答）
//!
//! 并发约束：
//! - 同一时刻最多只有一个"存活"的请求，后发起的获胜，而不是后完成的
//! - 状态锁从不跨越 `.await` 持有
//! - 网络失败转成用户提示，不向上传播

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::clients::{render_for, ProblemApi};
use crate::error::AppResult;
use crate::infrastructure::{RenderSurface, SurfaceEvent};
use crate::models::{FormSnapshot, RenderedProblem, SubmitControl};
use crate::services::{Alert, AlertBoard, Debouncer};
use crate::utils::logging::truncate_text;
use crate::workflow::problem_ctx::{ProblemIdentifiers, SaveTarget};

/// 协调器阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    Saving,
    Submitting,
}

/// 加载结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// 结果已写入当前内容
    Applied,
    /// 被更新的请求取代，结果被丢弃
    Superseded,
    /// 加载失败，已转为用户提示
    Failed,
}

/// 字段变化的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldChangeOutcome {
    /// 表单不存在，或当前内容尚未就绪（内容可能正在替换）
    FormMissing,
    /// 与最近一次保存 / 提交一致
    Clean,
    /// 有改动
    Dirty { autosave_scheduled: bool },
}

/// 协调器的时间与取消策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorSettings {
    /// 自动保存静默期
    pub autosave_debounce: Duration,
    /// 提交防抖窗口
    pub submit_debounce: Duration,
    /// 被取代的加载是否直接丢弃进行中的网络请求
    pub abort_superseded: bool,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            autosave_debounce: Duration::from_millis(2000),
            submit_debounce: Duration::from_millis(300),
            abort_superseded: true,
        }
    }
}

/// 一个进行中的请求
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub seq: u64,
    pub problem_id: u64,
    pub attempt: Option<u64>,
    token: CancellationToken,
}

impl PendingRequest {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// 提供给宿主的状态快照
#[derive(Debug, Clone)]
pub struct ViewState {
    pub identifiers: Option<ProblemIdentifiers>,
    pub phase: Phase,
    pub loading: bool,
    pub markup: String,
    pub submit_enabled: bool,
    pub pending_request: Option<u64>,
    pub last_submission: Option<FormSnapshot>,
    pub last_submitted_at: Option<DateTime<Utc>>,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub alerts: Vec<Alert>,
}

struct CoordinatorState {
    identifiers: Option<ProblemIdentifiers>,
    phase: Phase,
    loading: bool,
    markup: String,
    pending: Option<PendingRequest>,
    next_seq: u64,
    last_submission: Option<FormSnapshot>,
    /// 快照每写入一次加一
    snapshot_rev: u64,
    submit_enabled: bool,
    last_submitted_at: Option<DateTime<Utc>>,
    last_saved_at: Option<DateTime<Utc>>,
    alerts: AlertBoard,
    /// 每次切换题目加一，用来丢弃旧题目迟到的保存 / 提交结果
    epoch: u64,
}

impl CoordinatorState {
    fn new() -> Self {
        Self {
            identifiers: None,
            phase: Phase::Idle,
            loading: false,
            markup: String::new(),
            pending: None,
            next_seq: 0,
            last_submission: None,
            snapshot_rev: 0,
            submit_enabled: false,
            last_submitted_at: None,
            last_saved_at: None,
            alerts: AlertBoard::new(),
            epoch: 0,
        }
    }

    /// 登记新请求，同时取消旧请求
    fn register_request(&mut self, ids: &ProblemIdentifiers) -> PendingRequest {
        if let Some(previous) = self.pending.take() {
            previous.token.cancel();
            debug!("请求 #{} 被取代", previous.seq);
        }
        self.next_seq += 1;
        let request = PendingRequest {
            seq: self.next_seq,
            problem_id: ids.problem_id,
            attempt: ids.attempt_key(),
            token: CancellationToken::new(),
        };
        self.pending = Some(request.clone());
        request
    }

    fn record_snapshot(&mut self, form: Option<FormSnapshot>) {
        self.last_submission = form;
        self.snapshot_rev += 1;
    }

    /// 监听器已挂在当前内容上，字段变化才有意义
    fn accepts_field_changes(&self, is_initial_load: bool) -> bool {
        !self.loading
            && matches!(self.phase, Phase::Loaded | Phase::Saving)
            && (is_initial_load || self.last_submission.is_some())
    }

    fn is_live(&self, request: &PendingRequest) -> bool {
        self.pending
            .as_ref()
            .map_or(false, |p| p.seq == request.seq && !p.is_cancelled())
    }
}

struct Inner {
    api: Arc<dyn ProblemApi>,
    surface: Arc<dyn RenderSurface>,
    settings: CoordinatorSettings,
    state: Mutex<CoordinatorState>,
    /// 保证写入渲染表面的顺序与内容被接受的顺序一致
    display_gate: tokio::sync::Mutex<()>,
    autosave: Debouncer,
    submit: Debouncer,
}

/// 题目渲染 / 提交协调器
///
/// - 绑定一个正在显示的题目视图，克隆后共享同一份状态
/// - 不持有任何持久化状态
/// - 只依赖后端能力（`ProblemApi`）和渲染表面（`RenderSurface`）
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    /// 创建新的协调器
    pub fn new(
        api: Arc<dyn ProblemApi>,
        surface: Arc<dyn RenderSurface>,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                surface,
                settings,
                state: Mutex::new(CoordinatorState::new()),
                display_gate: tokio::sync::Mutex::new(()),
                autosave: Debouncer::new("自动保存", settings.autosave_debounce),
                submit: Debouncer::new("提交", settings.submit_debounce),
            }),
        }
    }

    /// 当前状态快照
    pub fn view_state(&self) -> ViewState {
        let state = self.inner.state.lock();
        ViewState {
            identifiers: state.identifiers.clone(),
            phase: state.phase,
            loading: state.loading,
            markup: state.markup.clone(),
            submit_enabled: state.submit_enabled,
            pending_request: state.pending.as_ref().map(|p| p.seq),
            last_submission: state.last_submission.clone(),
            last_submitted_at: state.last_submitted_at,
            last_saved_at: state.last_saved_at,
            alerts: state.alerts.active().to_vec(),
        }
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.inner.state.lock().alerts.active().to_vec()
    }

    /// 关闭一条提示
    pub fn dismiss_alert(&self, id: u64) -> bool {
        self.inner.state.lock().alerts.dismiss(id)
    }

    /// 把渲染表面的事件分发到对应操作
    pub async fn handle_event(&self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Loaded { content } => {
                self.on_markup_loaded(&content).await;
            }
            SurfaceEvent::FieldChanged => {
                self.on_field_changed(false).await;
            }
            SurfaceEvent::Submit { control } => self.on_submit(control),
        }
    }

    /// 加载题目
    ///
    /// 登记新请求并取消旧请求；只有最后登记的请求能写入当前内容
    pub async fn load_problem(&self, ids: ProblemIdentifiers) -> LoadOutcome {
        let request = {
            let mut state = self.inner.state.lock();
            state.identifiers = Some(ids.clone());
            state.phase = Phase::Loading;
            state.loading = true;
            state.register_request(&ids)
        };

        info!("{} 📥 开始加载 (请求 #{})", ids, request.seq);

        let result = if self.inner.settings.abort_superseded {
            tokio::select! {
                biased;
                _ = request.token.cancelled() => {
                    debug!("{} 请求 #{} 已取消，中止网络请求", ids, request.seq);
                    return LoadOutcome::Superseded;
                }
                result = render_for(self.inner.api.as_ref(), &ids) => result,
            }
        } else {
            render_for(self.inner.api.as_ref(), &ids).await
        };

        self.accept_render(&request, result, &ids).await
    }

    /// 切换到另一道题或另一次作答
    pub async fn cancel_and_reset(&self, new_ids: ProblemIdentifiers) -> LoadOutcome {
        {
            let mut state = self.inner.state.lock();
            if let Some(previous) = state.pending.take() {
                previous.token.cancel();
                info!(
                    "🔄 取消题目 #{} 的请求 #{}",
                    previous.problem_id, previous.seq
                );
            }
            state.markup.clear();
            state.record_snapshot(None);
            state.last_submitted_at = None;
            state.last_saved_at = None;
            state.submit_enabled = false;
            state.epoch += 1;
        }
        self.inner.autosave.cancel();
        self.inner.submit.cancel();

        self.load_problem(new_ids).await
    }

    /// 渲染表面显示完成
    ///
    /// 返回是否注入了监听器
    pub async fn on_markup_loaded(&self, displayed: &str) -> bool {
        {
            let mut state = self.inner.state.lock();
            if state.markup.is_empty() || state.markup != displayed {
                warn!(
                    "收到的加载事件对应的内容已不是当前内容，忽略: {}",
                    truncate_text(displayed, 60)
                );
                return false;
            }
            state.loading = false;
            if state.phase == Phase::Loading {
                state.phase = Phase::Loaded;
            }
            if let Some(pending) = &state.pending {
                debug!("请求 #{} 仍在进行，跳过注入监听器", pending.seq);
                return false;
            }
        }

        match self.inner.surface.attach_listeners().await {
            Ok(true) => debug!("✓ 表单监听器已注入"),
            Ok(false) => {
                warn!("渲染后未找到提交表单");
                return false;
            }
            Err(e) => {
                warn!("注入监听器失败: {}", e);
                return false;
            }
        }

        self.on_field_changed(true).await;
        true
    }

    /// 表单字段变化
    ///
    /// 总是刷新提交按钮状态；非首次加载且有改动时安排自动保存
    pub async fn on_field_changed(&self, is_initial_load: bool) -> FieldChangeOutcome {
        let form = match self.inner.surface.read_form().await {
            Ok(Some(form)) => form,
            Ok(None) => {
                warn!("读取表单时未找到表单");
                return FieldChangeOutcome::FormMissing;
            }
            Err(e) => {
                warn!("读取表单失败: {}", e);
                return FieldChangeOutcome::FormMissing;
            }
        };

        let (dirty, enabled, target, epoch) = {
            let mut state = self.inner.state.lock();
            if !state.accepts_field_changes(is_initial_load) {
                debug!("当前内容尚未就绪，忽略字段变化");
                return FieldChangeOutcome::FormMissing;
            }
            if is_initial_load && state.last_submission.is_none() {
                state.record_snapshot(Some(form.clone()));
            }
            let dirty = state
                .last_submission
                .as_ref()
                .map_or(true, |last| !last.same_answers(&form));
            let read_only = state.identifiers.as_ref().map_or(true, |ids| ids.read_only);
            state.submit_enabled = dirty && !read_only;
            let target = state.identifiers.as_ref().and_then(ProblemIdentifiers::save_target);
            (dirty, state.submit_enabled, target, state.epoch)
        };

        if let Err(e) = self.inner.surface.set_submit_enabled(enabled).await {
            warn!("更新提交按钮状态失败: {}", e);
        }

        if !dirty {
            self.inner.autosave.cancel();
            return FieldChangeOutcome::Clean;
        }
        if is_initial_load {
            return FieldChangeOutcome::Dirty {
                autosave_scheduled: false,
            };
        }
        let Some(target) = target else {
            return FieldChangeOutcome::Dirty {
                autosave_scheduled: false,
            };
        };

        let this = self.clone();
        self.inner
            .autosave
            .schedule(move || async move { this.autosave(target, form, epoch).await });
        FieldChangeOutcome::Dirty {
            autosave_scheduled: true,
        }
    }

    /// 用户点击了提交控件（防抖后执行）
    pub fn on_submit(&self, control: SubmitControl) {
        // 同一批改动只走提交，不再额外自动保存
        self.inner.autosave.cancel();
        let epoch = self.inner.state.lock().epoch;
        let this = self.clone();
        self.inner
            .submit
            .schedule(move || async move { this.submit_now(control, epoch).await });
    }

    // ========== 内部流程 ==========

    /// 接受渲染结果（仅当请求仍然存活）
    async fn accept_render(
        &self,
        request: &PendingRequest,
        result: AppResult<RenderedProblem>,
        ids: &ProblemIdentifiers,
    ) -> LoadOutcome {
        let markup = {
            let mut state = self.inner.state.lock();
            if !state.is_live(request) {
                debug!("{} 丢弃已被取代的请求 #{} 的结果", ids, request.seq);
                return LoadOutcome::Superseded;
            }
            state.pending = None;
            match result {
                Ok(rendered) => {
                    state.markup = rendered.markup;
                    state.loading = true;
                    state.phase = Phase::Loading;
                    state.markup.clone()
                }
                Err(e) => {
                    error!("{} ❌ 加载失败: {}", ids, e);
                    state.markup.clear();
                    state.loading = false;
                    state.phase = Phase::Idle;
                    state
                        .alerts
                        .raise(format!("题目加载失败: {}", e.user_message()));
                    return LoadOutcome::Failed;
                }
            }
        };

        info!("{} ✓ 请求 #{} 已接受", ids, request.seq);
        self.display(markup).await;
        LoadOutcome::Applied
    }

    /// 把已接受的内容写入渲染表面
    async fn display(&self, markup: String) {
        let _gate = self.inner.display_gate.lock().await;
        let still_current = { self.inner.state.lock().markup == markup };
        if !still_current {
            debug!("已有更新的内容，跳过显示");
            return;
        }
        if let Err(e) = self.inner.surface.display(&markup).await {
            error!("❌ 显示题目失败: {}", e);
            let mut state = self.inner.state.lock();
            if state.markup == markup {
                state.loading = false;
            }
            state.alerts.raise(format!("题目显示失败: {}", e.user_message()));
        }
    }

    /// 自动保存
    async fn autosave(&self, target: SaveTarget, form: FormSnapshot, epoch: u64) {
        let rev = {
            let mut state = self.inner.state.lock();
            if state.epoch != epoch {
                return;
            }
            if state.phase == Phase::Loaded {
                state.phase = Phase::Saving;
            }
            state.snapshot_rev
        };

        info!("💾 自动保存作答状态 ({:?})", target);
        let result = self.inner.api.save_state(target, &form).await;

        let mut state = self.inner.state.lock();
        if state.epoch != epoch {
            debug!("题目已切换，忽略自动保存结果");
            return;
        }
        if state.phase == Phase::Saving {
            state.phase = Phase::Loaded;
        }
        match result {
            Ok(_) if state.snapshot_rev != rev => {
                debug!("保存期间快照已被提交更新，丢弃这次自动保存的结果");
            }
            Ok(outcome) if outcome.changed() => {
                state.record_snapshot(Some(form));
                state.last_saved_at = Some(Utc::now());
                info!("✓ 自动保存完成，更新 {} 行", outcome.updates_count);
            }
            Ok(_) => debug!("自动保存未更新任何行"),
            Err(e) => {
                state
                    .alerts
                    .raise(format!("自动保存失败: {}", e.user_message()));
            }
        }
    }

    /// 执行提交
    async fn submit_now(&self, control: SubmitControl, epoch: u64) {
        let form = match self.inner.surface.read_form().await {
            Ok(Some(form)) => form,
            Ok(None) => {
                warn!("提交时未找到表单");
                return;
            }
            Err(e) => {
                warn!("提交时读取表单失败: {}", e);
                return;
            }
        };

        let (ids, request) = {
            let mut state = self.inner.state.lock();
            if state.epoch != epoch {
                return;
            }
            let Some(ids) = state.identifiers.clone() else {
                warn!("尚未加载题目，忽略提交");
                return;
            };
            if ids.read_only {
                warn!("{} 只读视图，忽略提交", ids);
                return;
            }
            state.phase = Phase::Submitting;
            state.submit_enabled = false;
            let request = state.register_request(&ids);
            (ids, request)
        };
        if let Err(e) = self.inner.surface.set_submit_enabled(false).await {
            warn!("禁用提交按钮失败: {}", e);
        }

        let action = control.action();
        let payload = form.with_control(&control);
        info!("{} 📤 {} (请求 #{})", ids, action, request.seq);

        let result = match &ids.preview {
            Some(params) => self.inner.api.render_preview(params, Some(&payload)).await,
            None => self.inner.api.submit(&ids, &payload).await,
        };

        let rendered = match result {
            Ok(rendered) => rendered,
            Err(e) => {
                error!("{} ❌ {}失败: {}", ids, action, e);
                {
                    let mut state = self.inner.state.lock();
                    if state.epoch != epoch {
                        return;
                    }
                    if state.is_live(&request) {
                        state.pending = None;
                    }
                    if state.phase == Phase::Submitting {
                        state.phase = Phase::Loaded;
                    }
                    state.submit_enabled = true;
                    state
                        .alerts
                        .raise(format!("{}失败: {}", action, e.user_message()));
                }
                if let Err(e) = self.inner.surface.set_submit_enabled(true).await {
                    warn!("恢复提交按钮失败: {}", e);
                }
                return;
            }
        };

        if !ids.is_preview() {
            if action.is_grade_submission() {
                let mut state = self.inner.state.lock();
                if state.epoch != epoch {
                    return;
                }
                state.record_snapshot(Some(form));
                state.last_submitted_at = Some(Utc::now());
                info!("{} ✓ 已提交评分", ids);
            } else if let Some(target) = ids.save_target() {
                self.save_after_submit(target, &form, epoch).await;
            }
        }

        self.accept_render(&request, Ok(rendered), &ids).await;
    }

    /// 非评分提交后保存作答状态
    async fn save_after_submit(&self, target: SaveTarget, form: &FormSnapshot, epoch: u64) {
        let result = self.inner.api.save_state(target, form).await;
        let mut state = self.inner.state.lock();
        if state.epoch != epoch {
            return;
        }
        match result {
            Ok(outcome) if outcome.changed() => {
                state.last_saved_at = Some(Utc::now());
                debug!("✓ 作答状态已保存，更新 {} 行", outcome.updates_count);
            }
            Ok(_) => debug!("作答状态未变化"),
            Err(e) => {
                state
                    .alerts
                    .raise(format!("保存作答状态失败: {}", e.user_message()));
            }
        }
    }
}
