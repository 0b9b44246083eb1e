pub mod problem_client;

pub use problem_client::{render_for, HttpProblemApi, ProblemApi};
