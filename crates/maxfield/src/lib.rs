//! Max-field planner: maximal non-crossing link graphs over portal sets.
//!
//! Pipeline
//! - `geo` projects portals onto a gnomonic chart where links are segments.
//! - `triangulate` builds one randomized maximal triangulation and its
//!   construction order; `search` keeps the trial that needs the fewest keys.
//! - `order` settles the final link order and splits it among agents.
//! - `plan` ties it together into a serializable artifact.
//!
//! No I/O happens here; ingestion and persistence live in the CLI crate.

pub mod api;
pub mod error;
pub mod geo;
pub mod graph;
pub mod order;
pub mod plan;
pub mod portal;
pub mod search;
pub mod triangulate;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{PlanError, Result};
pub use plan::{plan, Plan, PlanRequest};
pub use portal::{Portal, PortalInput};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::geo::GeomCfg;
    pub use crate::order::{AgentCount, AssignCfg, Assignment};
    pub use crate::plan::{plan, Plan, PlanRequest, Summary};
    pub use crate::portal::{Portal, PortalInput};
    pub use crate::search::{KeyLack, SampleBudget, SearchCfg};
    pub use crate::triangulate::TriangulateCfg;
    pub use crate::{PlanError, Result};
}

#[cfg(test)]
mod proptests;

/// Shared fixtures: small portal layouts in micro-degree offsets.
#[cfg(test)]
pub(crate) mod testkit {
    use crate::geo::GeomCfg;
    use crate::graph::LinkGraph;
    use crate::order::closing_link;
    use crate::portal::{Portal, PortalInput};
    use crate::triangulate::Decomposition;

    /// Offsets are added to this base (lat, lon) in micro-degrees.
    pub const BASE: (i64, i64) = (48_137_000, 11_575_000);

    pub const TRIANGLE: [(i64, i64); 3] = [(0, 0), (0, 1_000), (1_000, 0)];
    pub const SQUARE: [(i64, i64); 4] = [(0, 0), (0, 1_000), (1_000, 1_000), (1_000, 0)];

    pub fn inputs_at(base: (i64, i64), coords: &[(i64, i64)], keys: u32) -> Vec<PortalInput> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(dlat, dlon))| PortalInput::new(format!("P{i}"), base.0 + dlat, base.1 + dlon, keys))
            .collect()
    }

    pub fn inputs(coords: &[(i64, i64)], keys: u32) -> Vec<PortalInput> {
        inputs_at(BASE, coords, keys)
    }

    pub fn portals_at(base: (i64, i64), coords: &[(i64, i64)], keys: u32) -> Vec<Portal> {
        Portal::from_inputs(&inputs_at(base, coords, keys))
    }

    pub fn portals(coords: &[(i64, i64)], keys: u32) -> Vec<Portal> {
        portals_at(BASE, coords, keys)
    }

    pub fn crossing_pairs(graph: &LinkGraph, portals: &[Portal]) -> Vec<(usize, usize)> {
        crate::plan::crossings(graph, portals, GeomCfg::default())
    }

    /// No link starts strictly inside a triangle after that triangle closed.
    pub fn assert_buildable(graph: &LinkGraph, decomposition: &Decomposition) {
        for (id, g) in decomposition.iter() {
            let close = closing_link(graph, g).unwrap();
            for l in graph.links().iter().filter(|l| g.contents.contains(&l.origin)) {
                assert!(
                    l.order < close,
                    "link {} from inside triangle {} made after it closed at {close}",
                    l.order,
                    id.0
                );
            }
        }
    }
}
