pub mod form;
pub mod submit_action;
pub mod wire;

pub use form::{is_bookkeeping_field, FormSnapshot};
pub use submit_action::{SubmitAction, SubmitControl};
pub use wire::{RenderedProblem, SaveOutcome};
