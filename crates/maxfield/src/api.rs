//! Curated surface for callers (the CLI, benches, notebooks).
//!
//! - Prefer these re-exports over reaching into modules; names here are the
//!   ones the plan artifact and the CLI use.

// Inputs and validation
pub use crate::error::{PlanError, Result};
pub use crate::plan::{validate_inputs, MAX_PORTALS};
pub use crate::portal::{Portal, PortalId, PortalInput};
// Planning
pub use crate::plan::{plan, Plan, PlanRequest, SearchReport};
pub use crate::search::{SampleBudget, SearchCfg};
pub use crate::triangulate::TriangulateCfg;
// Reporting
pub use crate::order::{AgentCount, AssignCfg, Assignment, KeyNeeds};
pub use crate::plan::{ActionPoints, KeyPrep, OwnershipPrep, Summary};
