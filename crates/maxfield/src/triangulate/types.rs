//! Decomposition arena, engine configuration, and the trial-failure type.
//!
//! Kept small and explicit so `build` reads as the algorithm and nothing else.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::GeomCfg;
use crate::graph::LinkGraph;
use crate::portal::PortalId;

/// Index of a generator in the decomposition arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenId(pub usize);

/// One triangular region of the recursive decomposition (and one field).
///
/// `verts[0]` is the final vertex: its links close the triangle. `exterior`
/// marks triangles whose final links may be reversed (their vertices are never
/// inside a closed field when those links are made).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generator {
    pub verts: [PortalId; 3],
    pub depth: u32,
    pub exterior: bool,
    /// Portals strictly inside this triangle.
    pub contents: Vec<PortalId>,
    /// Portal this triangle was split on, if any.
    pub center: Option<PortalId>,
    /// `[opposite, adjacent, adjacent]` when split; empty for a leaf.
    pub children: Vec<GenId>,
}

impl Generator {
    /// The three edges of this triangle as portal pairs.
    #[inline]
    pub fn edges(&self) -> [(PortalId, PortalId); 3] {
        let [a, b, c] = self.verts;
        [(a, b), (b, c), (c, a)]
    }

    /// The triangle as a sorted triple (field identity).
    #[inline]
    pub fn field(&self) -> [PortalId; 3] {
        let mut f = self.verts;
        f.sort_unstable();
        f
    }
}

/// Arena of generators plus the ids of the perimeter-level roots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decomposition {
    pub nodes: Vec<Generator>,
    pub roots: Vec<GenId>,
}

/// Arena length marks used to roll back a failed root.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Checkpoint {
    nodes: usize,
    roots: usize,
}

impl Decomposition {
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn get(&self, id: GenId) -> &Generator {
        &self.nodes[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (GenId, &Generator)> {
        self.nodes.iter().enumerate().map(|(i, g)| (GenId(i), g))
    }

    pub fn max_depth(&self) -> Option<u32> {
        self.nodes.iter().map(|g| g.depth).max()
    }

    /// Portal pairs introduced at decomposition depth `depth`.
    ///
    /// Depth 0 is the perimeter triangles' edges (shared diagonals once);
    /// depth `k >= 1` is the three spokes of every depth `k - 1` split.
    pub fn edges_by_depth(&self, depth: u32) -> Vec<(PortalId, PortalId)> {
        if depth == 0 {
            let mut seen = std::collections::HashSet::new();
            return self
                .roots
                .iter()
                .flat_map(|&r| self.get(r).edges())
                .filter(|&(p, q)| seen.insert((p.min(q), p.max(q))))
                .collect();
        }
        self.nodes
            .iter()
            .filter(|g| g.depth + 1 == depth)
            .filter_map(|g| g.center.map(|c| g.verts.map(|v| (v, c))))
            .flatten()
            .collect()
    }

    pub(crate) fn push(&mut self, g: Generator) -> GenId {
        self.nodes.push(g);
        GenId(self.nodes.len() - 1)
    }

    pub(crate) fn push_root(&mut self, g: Generator) -> GenId {
        let id = self.push(g);
        self.roots.push(id);
        id
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            nodes: self.nodes.len(),
            roots: self.roots.len(),
        }
    }

    pub(crate) fn rollback(&mut self, cp: Checkpoint) {
        self.nodes.truncate(cp.nodes);
        self.roots.truncate(cp.roots);
    }
}

/// Engine configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangulateCfg {
    pub geom: GeomCfg,
    /// Outgoing links a single portal may anchor (the game allows 8).
    pub max_outgoing: u32,
    /// Perimeter triangles tried per trial before giving up.
    pub max_root_attempts: usize,
}

impl Default for TriangulateCfg {
    fn default() -> Self {
        Self {
            geom: GeomCfg::default(),
            max_outgoing: 8,
            max_root_attempts: 4096,
        }
    }
}

/// A successful engine run.
#[derive(Clone, Debug)]
pub struct Triangulation {
    pub graph: LinkGraph,
    pub decomposition: Decomposition,
}

/// Recoverable trial failure: this random ordering admits no planar build.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("dead end: {reason}")]
pub struct Deadend {
    pub reason: String,
}

impl Deadend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
