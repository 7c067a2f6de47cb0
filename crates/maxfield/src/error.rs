use thiserror::Error;

/// Errors surfaced to callers of the planner.
///
/// Validation variants are raised before any search work starts. Trial
/// failures inside the search (`triangulate::Deadend`) never show up here.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("number of agents must be positive, got {0}")]
    InvalidAgentCount(i64),
    #[error("number of extra samples must be between 1 and 100, got {0}")]
    InvalidSampleBudget(i64),
    #[error("limit of {limit} portals may be optimized at once, got {count}")]
    TooManyPortals { count: usize, limit: usize },
    #[error("no portals to plan")]
    NoPortals,
    #[error("portals {a} and {b} share the same location")]
    DuplicateLocation { a: usize, b: usize },
    #[error(
        "randomization failed in all {attempts} attempts; try again, or remove some portals"
    )]
    SearchExhausted { attempts: usize },
    #[error("malformed plan: {0}")]
    MalformedPlan(String),
}

impl PlanError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPlan(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;
