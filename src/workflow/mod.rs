pub mod coordinator;
pub mod problem_ctx;

pub use coordinator::{
    Coordinator, CoordinatorSettings, FieldChangeOutcome, LoadOutcome, PendingRequest, Phase,
    ViewState,
};
pub use problem_ctx::{PreviewParams, ProblemIdentifiers, SaveTarget};
