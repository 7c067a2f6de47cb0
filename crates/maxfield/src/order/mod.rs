//! Link order and agent assignment.
//!
//! Purpose
//! - Attribute each decomposition triangle to the link that completes it.
//! - Rewrite the engine's construction order into one that is still buildable
//!   but keeps agents at a portal while they have links to throw from it.
//! - Split the ordered links among agents and tabulate the keys each needs.
//!
//! Code cross-refs: `triangulate::Decomposition`, `plan::Plan::assign`.

mod agents;
mod fields;
mod sequence;

pub use agents::{assign, AgentCount, AssignCfg, Assignment, KeyNeeds};
pub use fields::{closing_link, mark_fields};
pub use sequence::{dependencies, improve_order};

use crate::error::Result;
use crate::graph::LinkGraph;
use crate::triangulate::Decomposition;

/// Attribute fields, then settle the global order.
pub fn finalize(graph: &mut LinkGraph, decomposition: &Decomposition) -> Result<()> {
    mark_fields(graph, decomposition);
    improve_order(graph, decomposition)
}
