use std::collections::BTreeSet;

use crate::error::{PlanError, Result};
use crate::graph::LinkGraph;
use crate::portal::PortalId;
use crate::triangulate::{Decomposition, GenId, Generator};

use super::fields::{closing_link, mark_fields};

/// Precedence edges `before → after` between link positions.
///
/// For every triangle `T` with closing link `c`:
/// - its two other edges come before `c`;
/// - every link whose origin lies strictly inside `T` comes before `c`;
/// - a nested triangle sharing an edge with `T` keeps its closing link on the
///   same side of `c` as now, so one link never closes two fields on one side.
///
/// Returned as successor sets indexed by link position.
pub fn dependencies(graph: &LinkGraph, decomposition: &Decomposition) -> Vec<BTreeSet<usize>> {
    let mut succ = vec![BTreeSet::new(); graph.len()];
    let outgoing = graph.outgoing();
    let closes: Vec<Option<usize>> = decomposition
        .iter()
        .map(|(_, g)| closing_link(graph, g))
        .collect();
    for (id, g) in decomposition.iter() {
        let Some(close) = closes[id.0] else {
            continue;
        };
        let edges = g.edges().into_iter().filter_map(|(p, q)| graph.find(p, q));
        let inner = g.contents.iter().flat_map(|&p| outgoing[p].iter().copied());
        for before in edges.chain(inner) {
            if before != close {
                succ[before].insert(close);
            }
        }
        let mut stack: Vec<GenId> = g.children.clone();
        while let Some(d) = stack.pop() {
            let nested = decomposition.get(d);
            if !shares_edge(g, nested) {
                continue;
            }
            match closes[d.0] {
                Some(other) if other < close => {
                    succ[other].insert(close);
                }
                Some(other) if other > close => {
                    succ[close].insert(other);
                }
                _ => {}
            }
            stack.extend(nested.children.iter().copied());
        }
    }
    succ
}

fn shares_edge(a: &Generator, b: &Generator) -> bool {
    let key = |(p, q): (PortalId, PortalId)| (p.min(q), p.max(q));
    a.edges()
        .iter()
        .any(|&e| b.edges().iter().any(|&f| key(e) == key(f)))
}

/// Reorder links into a buildable sequence that keeps agents in place.
///
/// Kahn's algorithm over `dependencies`: among ready links prefer one leaving
/// the previous link's origin, otherwise the lowest current order. Orders are
/// rewritten densely and fields re-attributed. Running it twice is the same as
/// running it once.
///
/// Errors: `MalformedPlan` if the dependencies are cyclic (only possible for
/// an externally supplied graph).
pub fn improve_order(graph: &mut LinkGraph, decomposition: &Decomposition) -> Result<()> {
    let succ = dependencies(graph, decomposition);
    let mut pending = vec![0usize; graph.len()];
    for s in succ.iter().flatten() {
        pending[*s] += 1;
    }
    let mut ready: BTreeSet<usize> = (0..graph.len()).filter(|&i| pending[i] == 0).collect();
    let mut sequence = Vec::with_capacity(graph.len());
    let mut here = None;
    while !ready.is_empty() {
        let next = ready
            .iter()
            .copied()
            .find(|&i| Some(graph.link(i).origin) == here)
            .or_else(|| ready.first().copied());
        let Some(next) = next else { break };
        ready.remove(&next);
        here = Some(graph.link(next).origin);
        sequence.push(next);
        for &s in &succ[next] {
            pending[s] -= 1;
            if pending[s] == 0 {
                ready.insert(s);
            }
        }
    }
    if sequence.len() != graph.len() {
        return Err(PlanError::malformed(
            "link dependencies are cyclic; no buildable order exists",
        ));
    }
    graph.reorder(&sequence);
    mark_fields(graph, decomposition);
    Ok(())
}
