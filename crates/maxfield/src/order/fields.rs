use crate::graph::LinkGraph;
use crate::triangulate::{Decomposition, Generator};

/// The link that completes `g`: the latest of its three edges.
///
/// `None` if an edge is missing from `graph`.
pub fn closing_link(graph: &LinkGraph, g: &Generator) -> Option<usize> {
    g.edges()
        .iter()
        .map(|&(p, q)| graph.find(p, q))
        .try_fold(0usize, |acc, pos| pos.map(|i| acc.max(i)))
}

/// Attribute every decomposition triangle to its closing link.
///
/// Previous attributions are discarded. Generators with a missing edge are
/// skipped (callers validate edges beforehand).
pub fn mark_fields(graph: &mut LinkGraph, decomposition: &Decomposition) {
    graph.clear_fields();
    for (_, g) in decomposition.iter() {
        if let Some(link) = closing_link(graph, g) {
            graph.push_field(link, g.field());
        }
    }
    debug_assert!(graph.links().iter().all(|l| l.fields.len() <= 2));
}
