//! Randomized field-maximizing build over the convex perimeter.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::trace;

use crate::geo::{on_segment, orient, perimeter, strictly_inside};
use crate::graph::LinkGraph;
use crate::order::closing_link;
use crate::portal::{Portal, PortalId};

use super::types::{Deadend, Decomposition, GenId, Generator, TriangulateCfg, Triangulation};

/// Build one maximal planar link graph over `portals`.
///
/// The perimeter polygon is cut into triangles (random choice of apex,
/// backtracking on dead ends); each triangle is split recursively on a random
/// interior portal and then linked in an order that keeps every link from an
/// interior portal ahead of the field enclosing it.
pub fn max_fields<R: Rng>(
    portals: &[Portal],
    cfg: &TriangulateCfg,
    rng: &mut R,
) -> Result<Triangulation, Deadend> {
    let xy: Vec<_> = portals.iter().map(|p| p.xy).collect();
    let perim = perimeter(&xy, cfg.geom);
    let mut builder = Builder {
        portals,
        cfg,
        rng,
        graph: LinkGraph::new(portals.len()),
        arena: Decomposition::default(),
        root_attempts: 0,
    };
    if !builder.triangulate(&perim) {
        return Err(Deadend::new(format!(
            "no feasible triangulation after {} perimeter triangles",
            builder.root_attempts
        )));
    }
    builder.check_coverage()?;
    Ok(Triangulation {
        graph: builder.graph,
        decomposition: builder.arena,
    })
}

struct Builder<'a, R: Rng> {
    portals: &'a [Portal],
    cfg: &'a TriangulateCfg,
    rng: &'a mut R,
    graph: LinkGraph,
    arena: Decomposition,
    root_attempts: usize,
}

impl<'a, R: Rng> Builder<'a, R> {
    /// Triangulate the convex polygon `poly` (CCW portal ids).
    fn triangulate(&mut self, poly: &[PortalId]) -> bool {
        if poly.len() < 3 {
            return true;
        }
        let links0 = self.graph.len();
        let arena0 = self.arena.checkpoint();
        let mut apexes: Vec<usize> = (2..poly.len()).collect();
        apexes.shuffle(&mut *self.rng);
        for k in apexes {
            if self.root_attempts >= self.cfg.max_root_attempts {
                return false;
            }
            self.root_attempts += 1;
            let verts = [poly[0], poly[1], poly[k]];
            if self.is_degenerate(verts) {
                continue;
            }
            let contents = self.contents_of(verts, 0..self.portals.len());
            let nodes0 = self.arena.len();
            let root = self.arena.push_root(Generator {
                verts,
                depth: 0,
                exterior: true,
                contents,
                center: None,
                children: Vec::new(),
            });
            let built = self
                .split(root)
                .and_then(|_| self.build(root))
                .and_then(|_| self.check_enclosures(nodes0));
            if let Err(dead) = built {
                trace!(?verts, %dead, "perimeter triangle rejected");
                self.graph.truncate(links0);
                self.arena.rollback(arena0);
                continue;
            }
            let left = poly[1..=k].to_vec();
            let mut right = poly[k..].to_vec();
            right.push(poly[0]);
            if self.triangulate(&left) && self.triangulate(&right) {
                return true;
            }
            self.graph.truncate(links0);
            self.arena.rollback(arena0);
        }
        false
    }

    /// Recursively split `id` on random interior portals.
    fn split(&mut self, id: GenId) -> Result<(), Deadend> {
        let node = self.arena.get(id);
        if node.contents.is_empty() {
            return Ok(());
        }
        let verts = node.verts;
        let depth = node.depth;
        let contents = node.contents.clone();

        let mut candidates = contents.clone();
        candidates.shuffle(&mut *self.rng);
        let center = candidates
            .into_iter()
            .find(|&c| self.spokes_are_clear(verts, c, &contents))
            .ok_or_else(|| Deadend::new(format!("no clean split point inside {verts:?}")))?;

        let [v0, v1, v2] = verts;
        // Opposite first: it is built completely before this triangle closes.
        let child_verts = [[center, v1, v2], [v0, v2, center], [v0, v1, center]];
        let mut children = Vec::with_capacity(3);
        for (k, cv) in child_verts.into_iter().enumerate() {
            let inside = self.contents_of(cv, contents.iter().copied().filter(|&p| p != center));
            children.push(self.arena.push(Generator {
                verts: cv,
                depth: depth + 1,
                exterior: k == 0,
                contents: inside,
                center: None,
                children: Vec::new(),
            }));
        }
        let node = &mut self.arena.nodes[id.0];
        node.center = Some(center);
        node.children = children.clone();
        for child in children {
            self.split(child)?;
        }
        Ok(())
    }

    fn build(&mut self, id: GenId) -> Result<(), Deadend> {
        self.build_except_final(id)?;
        self.build_final(id)
    }

    /// Every link of `id` except those anchored at its final vertex.
    fn build_except_final(&mut self, id: GenId) -> Result<(), Deadend> {
        let node = self.arena.get(id);
        let [_, v1, v2] = node.verts;
        let children = node.children.clone();
        match children[..] {
            [] => self.try_link(v2, v1, true),
            [opposite, a, b] => {
                self.build(opposite)?;
                self.build_except_final(a)?;
                self.build_except_final(b)
            }
            _ => unreachable!("generators have zero or three children"),
        }
    }

    /// Links from the final vertex: own edges first, then inward spokes.
    fn build_final(&mut self, id: GenId) -> Result<(), Deadend> {
        let node = self.arena.get(id);
        let [v0, v1, v2] = node.verts;
        let exterior = node.exterior;
        let adjacents: Vec<GenId> = node.children.iter().skip(1).copied().collect();
        self.try_link(v0, v1, exterior)?;
        self.try_link(v0, v2, exterior)?;
        for a in adjacents {
            self.build_final(a)?;
        }
        Ok(())
    }

    /// Add `p → q` unless the pair is already linked.
    ///
    /// Reversible links point at the endpoint with more spare keys (coin flip
    /// on ties). A full origin flips a reversible link; otherwise dead end.
    fn try_link(&mut self, p: PortalId, q: PortalId, reversible: bool) -> Result<(), Deadend> {
        if self.graph.find(p, q).is_some() {
            return Ok(());
        }
        let (mut from, mut to) = (p, q);
        if reversible {
            let (sp, sq) = (self.spare_keys(p), self.spare_keys(q));
            if sp > sq || (sp == sq && self.rng.gen_bool(0.5)) {
                std::mem::swap(&mut from, &mut to);
            }
        }
        let cap = self.cfg.max_outgoing;
        if self.graph.out_degree(from) >= cap {
            if !reversible || self.graph.out_degree(to) >= cap {
                return Err(Deadend::new(format!(
                    "portal {from} has no outgoing links left"
                )));
            }
            std::mem::swap(&mut from, &mut to);
        }
        self.graph.add(from, to, reversible);
        Ok(())
    }

    #[inline]
    fn spare_keys(&self, p: PortalId) -> i64 {
        i64::from(self.portals[p].keys) - i64::from(self.graph.in_degree(p))
    }

    fn is_degenerate(&self, [a, b, c]: [PortalId; 3]) -> bool {
        let xy = |i: PortalId| self.portals[i].xy;
        orient(xy(a), xy(b), xy(c)).abs() <= self.cfg.geom.eps_area
    }

    fn contents_of(
        &self,
        verts: [PortalId; 3],
        candidates: impl IntoIterator<Item = PortalId>,
    ) -> Vec<PortalId> {
        let tri = verts.map(|v| self.portals[v].xy);
        let eps = self.cfg.geom.eps_area;
        candidates
            .into_iter()
            .filter(|p| !verts.contains(p))
            .filter(|&p| strictly_inside(tri, self.portals[p].xy, eps))
            .collect()
    }

    /// No other interior portal sits on a spoke from `center` to a vertex.
    fn spokes_are_clear(&self, verts: [PortalId; 3], center: PortalId, contents: &[PortalId]) -> bool {
        let eps = self.cfg.geom.eps_area;
        let c = self.portals[center].xy;
        verts.iter().all(|&v| {
            let vx = self.portals[v].xy;
            contents
                .iter()
                .filter(|&&p| p != center)
                .all(|&p| !on_segment(vx, c, self.portals[p].xy, eps))
        })
    }

    /// Links leaving a portal inside a triangle must precede its closing link.
    ///
    /// Fails when a perimeter triangle reuses sides drawn by earlier
    /// triangles, since those close it before its interior is linked.
    fn check_enclosures(&self, from: usize) -> Result<(), Deadend> {
        let links = self.graph.links();
        for g in &self.arena.nodes[from..] {
            if g.contents.is_empty() {
                continue;
            }
            let Some(close) = closing_link(&self.graph, g) else {
                return Err(Deadend::new(format!("triangle {:?} left open", g.verts)));
            };
            if let Some(late) = links[close + 1..].iter().find(|l| g.contents.contains(&l.origin)) {
                return Err(Deadend::new(format!(
                    "link {} -> {} drawn after {:?} closed",
                    late.origin, late.target, g.verts
                )));
            }
        }
        Ok(())
    }

    /// Every portal must be a vertex of some triangle once three or more exist.
    fn check_coverage(&self) -> Result<(), Deadend> {
        if self.portals.len() < 3 {
            return Ok(());
        }
        let mut placed = vec![false; self.portals.len()];
        for g in &self.arena.nodes {
            for &v in &g.verts {
                placed[v] = true;
            }
        }
        match placed.iter().position(|&ok| !ok) {
            Some(p) => Err(Deadend::new(format!("portal {p} lies on a link"))),
            None => Ok(()),
        }
    }
}
