//! # Problem Render Submit
//!
//! 题目渲染 / 提交协调器：在沙箱页面中显示后端渲染的题目，
//! 协调自动保存与提交，并丢弃过期请求的结果
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，所有操作经过 `SerialQueue` 串行执行
//! - `RenderSurface` - 渲染表面抽象，`ChromiumSurface` 为浏览器实现
//!
//! ### ② 业务能力层（Clients / Services）
//! - `clients/` - `ProblemApi` 后端渲染、提交、保存能力
//! - `services/` - 防抖器、用户提示
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - `ProblemIdentifiers` 上下文与 `Coordinator` 状态机
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - 应用入口与页面事件泵

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{HttpProblemApi, ProblemApi};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromiumSurface, JsExecutor, RenderSurface, SerialQueue, SurfaceEvent};
pub use models::{FormSnapshot, SubmitAction, SubmitControl};
pub use orchestrator::App;
pub use workflow::{
    Coordinator, CoordinatorSettings, FieldChangeOutcome, LoadOutcome, Phase, PreviewParams,
    ProblemIdentifiers, ViewState,
};
