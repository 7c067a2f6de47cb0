//! Directed link graph with degree bookkeeping.
//!
//! Links live in a `Vec` whose position is the link's `order`; the undirected
//! index `(min, max) → position` answers "is there a link between p and q"
//! in O(1). Only `links` and the portal count are serialized; the index and
//! degrees are rebuilt (and validated) on load.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::portal::{Portal, PortalId};

/// A field as the sorted triple of its portal ids.
pub type Field = [PortalId; 3];

/// Directed link `origin → target`; consumes one key of `target`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub origin: PortalId,
    pub target: PortalId,
    /// Global construction index; equals the link's position in the graph.
    pub order: usize,
    /// The engine was free to pick the direction of this link.
    pub reversible: bool,
    /// Fields completed by this link (at most one on each side).
    pub fields: Vec<Field>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredGraph", into = "StoredGraph")]
pub struct LinkGraph {
    portals: usize,
    links: Vec<Link>,
    index: HashMap<(PortalId, PortalId), usize>,
    in_degree: Vec<u32>,
    out_degree: Vec<u32>,
}

#[inline]
fn key(p: PortalId, q: PortalId) -> (PortalId, PortalId) {
    (p.min(q), p.max(q))
}

impl LinkGraph {
    pub fn new(portals: usize) -> Self {
        Self {
            portals,
            links: Vec::new(),
            index: HashMap::new(),
            in_degree: vec![0; portals],
            out_degree: vec![0; portals],
        }
    }

    #[inline]
    pub fn portal_count(&self) -> usize {
        self.portals
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Links in global order.
    #[inline]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    #[inline]
    pub fn link(&self, i: usize) -> &Link {
        &self.links[i]
    }

    /// Position of the link between `p` and `q`, in either direction.
    #[inline]
    pub fn find(&self, p: PortalId, q: PortalId) -> Option<usize> {
        self.index.get(&key(p, q)).copied()
    }

    #[inline]
    pub fn in_degree(&self, p: PortalId) -> u32 {
        self.in_degree[p]
    }

    #[inline]
    pub fn out_degree(&self, p: PortalId) -> u32 {
        self.out_degree[p]
    }

    /// Keys missing at `p`: `max(in_degree - keys, 0)`.
    #[inline]
    pub fn deficit(&self, portal: &Portal) -> u32 {
        self.in_degree[portal.id].saturating_sub(portal.keys)
    }

    /// Total number of fields attributed to links.
    pub fn field_count(&self) -> usize {
        self.links.iter().map(|l| l.fields.len()).sum()
    }

    /// Append `origin → target` at the next order. The pair must be unlinked.
    pub(crate) fn add(&mut self, origin: PortalId, target: PortalId, reversible: bool) -> usize {
        debug_assert!(origin != target);
        debug_assert!(self.find(origin, target).is_none());
        let order = self.links.len();
        self.links.push(Link {
            origin,
            target,
            order,
            reversible,
            fields: Vec::new(),
        });
        self.index.insert(key(origin, target), order);
        self.out_degree[origin] += 1;
        self.in_degree[target] += 1;
        order
    }

    /// Drop every link with order `>= len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        while self.links.len() > len {
            if let Some(l) = self.links.pop() {
                self.index.remove(&key(l.origin, l.target));
                self.out_degree[l.origin] -= 1;
                self.in_degree[l.target] -= 1;
            }
        }
    }

    /// Rewrite orders so that `sequence[k]` (an old position) becomes order `k`.
    ///
    /// Pre: `sequence` is a permutation of `0..len`.
    pub(crate) fn reorder(&mut self, sequence: &[usize]) {
        debug_assert_eq!(sequence.len(), self.links.len());
        let mut old: Vec<Option<Link>> = std::mem::take(&mut self.links)
            .into_iter()
            .map(Some)
            .collect();
        self.links = sequence
            .iter()
            .enumerate()
            .filter_map(|(k, &i)| {
                old[i].take().map(|mut l| {
                    l.order = k;
                    l
                })
            })
            .collect();
        self.index = self
            .links
            .iter()
            .map(|l| (key(l.origin, l.target), l.order))
            .collect();
    }

    pub(crate) fn clear_fields(&mut self) {
        for l in &mut self.links {
            l.fields.clear();
        }
    }

    pub(crate) fn push_field(&mut self, link: usize, field: Field) {
        self.links[link].fields.push(field);
    }

    /// Outgoing link positions per portal, each list in order.
    pub fn outgoing(&self) -> Vec<Vec<usize>> {
        let mut out = vec![Vec::new(); self.portals];
        for l in &self.links {
            out[l.origin].push(l.order);
        }
        out
    }
}

/// Serialized shape of `LinkGraph`.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredGraph {
    portals: usize,
    links: Vec<Link>,
}

impl From<LinkGraph> for StoredGraph {
    fn from(g: LinkGraph) -> Self {
        Self {
            portals: g.portals,
            links: g.links,
        }
    }
}

impl TryFrom<StoredGraph> for LinkGraph {
    type Error = PlanError;

    fn try_from(stored: StoredGraph) -> Result<Self, Self::Error> {
        let mut links = stored.links;
        links.sort_by_key(|l| l.order);
        let mut graph = LinkGraph::new(stored.portals);
        for (k, l) in links.into_iter().enumerate() {
            if l.order != k {
                return Err(PlanError::malformed(format!(
                    "link orders are not a dense permutation (missing {k})"
                )));
            }
            if l.origin >= stored.portals || l.target >= stored.portals {
                return Err(PlanError::malformed(format!(
                    "link {k} references a portal outside 0..{}",
                    stored.portals
                )));
            }
            if l.origin == l.target {
                return Err(PlanError::malformed(format!("link {k} is a loop")));
            }
            if graph.find(l.origin, l.target).is_some() {
                return Err(PlanError::malformed(format!(
                    "duplicate link between {} and {}",
                    l.origin, l.target
                )));
            }
            let i = graph.add(l.origin, l.target, l.reversible);
            graph.links[i].fields = l.fields;
        }
        Ok(graph)
    }
}
