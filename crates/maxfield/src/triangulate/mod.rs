//! Triangulation engine: one randomized, field-maximizing link graph per call.
//!
//! Purpose
//! - Cut the convex perimeter into triangles and split each recursively on
//!   interior portals, so every portal becomes a triangle vertex and every
//!   triangle of the decomposition is a field.
//! - Emit links in an order that is physically buildable: a link drawn from a
//!   portal must not start inside an already closed field.
//!
//! Why this design
//! - The decomposition is an arena (`Vec<Generator>` + `GenId`) so a failed
//!   perimeter triangle rolls back by truncation, the same way the graph does.
//! - Randomness only enters through the caller's rng; with a fixed seed a run
//!   is fully reproducible, which the search driver relies on.
//! - `Deadend` is an ordinary value: the per-portal outgoing cap makes some
//!   random choices infeasible, and the driver simply discards that trial.
//!
//! Code cross-refs: `geo::{perimeter, strictly_inside, on_segment}`,
//! `graph::LinkGraph`, `search::search`, `order::mark_fields`.

mod build;
mod types;

pub use build::max_fields;
pub use types::{Deadend, Decomposition, GenId, Generator, TriangulateCfg, Triangulation};

#[cfg(test)]
mod tests;
