//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 持有浏览器、渲染表面和协调器
//!
//! ### `event_pump` - 页面事件泵
//! - 定时拉取渲染表面的事件
//! - 分发到协调器
//!
//! ## 层次关系
//!
//! ```text
//! app / event_pump
//!     ↓
//! workflow::Coordinator (单个题目视图的生命周期)
//!     ↓
//! clients / services (后端调用、防抖、提示)
//!     ↓
//! infrastructure (渲染表面、JsExecutor、串行队列)
//! ```

pub mod app;
pub mod event_pump;

pub use app::App;
pub use event_pump::pump_events;
