pub mod alerts;
pub mod debouncer;

pub use alerts::{Alert, AlertBoard};
pub use debouncer::Debouncer;
