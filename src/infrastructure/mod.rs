pub mod chromium_surface;
pub mod js_executor;
pub mod serial_queue;
pub mod surface;

pub use chromium_surface::ChromiumSurface;
pub use js_executor::JsExecutor;
pub use serial_queue::SerialQueue;
pub use surface::{RenderSurface, SurfaceEvent};
