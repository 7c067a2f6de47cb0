//! The finished plan: validated inputs in, ordered links and fields out.
//!
//! A `Plan` is either produced by `plan` (search + finalize) or rebuilt from a
//! stored one with `Plan::from_parts`/`Plan::validate`, which re-checks the
//! graph against the portals and re-runs only the ordering step. Assignment
//! to agents is not part of the plan; it is cheap and depends on the agent
//! count, so callers run `Plan::assign` as often as they like.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PlanError, Result};
use crate::geo::{segments_cross, GeomCfg};
use crate::graph::LinkGraph;
use crate::order::{self, AgentCount, AssignCfg, Assignment};
use crate::portal::{Portal, PortalId, PortalInput};
use crate::search::{search, KeyLack, SearchCfg};
use crate::triangulate::{Decomposition, Triangulation};

/// Largest portal set planned in one go.
pub const MAX_PORTALS: usize = 65;

/// Action points per captured portal (8 resonators, 2 mods, capture bonus).
pub const AP_PER_PORTAL: u64 = 125 * 8 + 500 + 250;
pub const AP_PER_LINK: u64 = 313;
pub const AP_PER_FIELD: u64 = 1250;

/// Reject empty, oversized, or self-overlapping portal lists.
pub fn validate_inputs(inputs: &[PortalInput]) -> Result<()> {
    if inputs.is_empty() {
        return Err(PlanError::NoPortals);
    }
    if inputs.len() > MAX_PORTALS {
        return Err(PlanError::TooManyPortals {
            count: inputs.len(),
            limit: MAX_PORTALS,
        });
    }
    let mut seen: HashMap<(i64, i64), usize> = HashMap::with_capacity(inputs.len());
    for (b, p) in inputs.iter().enumerate() {
        if let Some(&a) = seen.get(&(p.lat_e6, p.lon_e6)) {
            return Err(PlanError::DuplicateLocation { a, b });
        }
        seen.insert((p.lat_e6, p.lon_e6), b);
    }
    Ok(())
}

/// Pairs of link positions whose segments properly cross on the chart.
pub fn crossings(graph: &LinkGraph, portals: &[Portal], cfg: GeomCfg) -> Vec<(usize, usize)> {
    let links = graph.links();
    let mut out = Vec::new();
    for (i, a) in links.iter().enumerate() {
        for (j, b) in links.iter().enumerate().skip(i + 1) {
            let crossed = segments_cross(
                portals[a.origin].xy,
                portals[a.target].xy,
                portals[b.origin].xy,
                portals[b.target].xy,
                cfg.eps_area,
            );
            if crossed {
                out.push((i, j));
            }
        }
    }
    out
}

#[derive(Clone, Debug, Default)]
pub struct PlanRequest {
    pub portals: Vec<PortalInput>,
    pub search: SearchCfg,
}

/// How the plan's graph was found.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    pub seed: u64,
    pub trials: usize,
    pub failures: usize,
    pub best_history: Vec<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub portals: Vec<Portal>,
    pub graph: LinkGraph,
    pub decomposition: Decomposition,
    pub lack: KeyLack,
    #[serde(default)]
    pub search: Option<SearchReport>,
}

/// Validate, search, and order.
pub fn plan(request: &PlanRequest) -> Result<Plan> {
    validate_inputs(&request.portals)?;
    let portals = Portal::from_inputs(&request.portals);
    info!(portals = portals.len(), "planning");
    let outcome = search(&portals, &request.search)?;
    let Triangulation {
        mut graph,
        decomposition,
    } = outcome.triangulation;
    order::finalize(&mut graph, &decomposition)?;
    info!(
        links = graph.len(),
        fields = graph.field_count(),
        lack = outcome.lack.total,
        "plan finalized"
    );
    Ok(Plan {
        portals,
        graph,
        decomposition,
        lack: outcome.lack,
        search: Some(SearchReport {
            seed: outcome.seed,
            trials: outcome.trials,
            failures: outcome.failures,
            best_history: outcome.best_history,
        }),
    })
}

/// Headline counts of a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub portals: usize,
    pub links: usize,
    pub fields: usize,
    pub total_lack: u64,
    pub max_lack: u32,
}

impl Summary {
    pub fn action_points(&self) -> ActionPoints {
        ActionPoints {
            portals: AP_PER_PORTAL * self.portals as u64,
            links: AP_PER_LINK * self.links as u64,
            fields: AP_PER_FIELD * self.fields as u64,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPoints {
    pub portals: u64,
    pub links: u64,
    pub fields: u64,
}

impl ActionPoints {
    #[inline]
    pub fn total(&self) -> u64 {
        self.portals + self.links + self.fields
    }
}

/// Keys to farm before the operation, per portal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPrep {
    pub portal: PortalId,
    pub name: String,
    pub have: u32,
    pub need: u32,
    pub lack: u32,
}

/// Portals split by the direction of their first link.
///
/// A portal whose first link is incoming must be captured before anyone links
/// to it; one whose first link is outgoing is captured by the agent on arrival.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipPrep {
    pub incoming_first: Vec<PortalId>,
    pub outgoing_first: Vec<PortalId>,
}

impl Plan {
    /// Rebuild a plan from stored parts.
    ///
    /// Portal geometry is recomputed from the raw records; the graph and the
    /// decomposition are checked for consistency and planarity, then the link
    /// order is settled again.
    ///
    /// Errors: input validation errors, or `MalformedPlan`.
    pub fn from_parts(
        portals: Vec<Portal>,
        mut graph: LinkGraph,
        decomposition: Decomposition,
    ) -> Result<Self> {
        let inputs: Vec<PortalInput> = portals.iter().map(Portal::input).collect();
        validate_inputs(&inputs)?;
        if let Some((i, p)) = portals.iter().enumerate().find(|(i, p)| p.id != *i) {
            return Err(PlanError::malformed(format!(
                "portal at position {i} carries id {}",
                p.id
            )));
        }
        let portals = Portal::from_inputs(&inputs);
        if graph.portal_count() != portals.len() {
            return Err(PlanError::malformed(format!(
                "graph spans {} portals, plan has {}",
                graph.portal_count(),
                portals.len()
            )));
        }
        check_decomposition(&graph, &decomposition, portals.len())?;
        if let Some(&(i, j)) = crossings(&graph, &portals, GeomCfg::default()).first() {
            return Err(PlanError::malformed(format!("links {i} and {j} cross")));
        }
        order::finalize(&mut graph, &decomposition)?;
        let lack = KeyLack::of(&graph, &portals);
        Ok(Self {
            portals,
            graph,
            decomposition,
            lack,
            search: None,
        })
    }

    /// Re-check a deserialized plan; see `from_parts`.
    pub fn validate(self) -> Result<Self> {
        let search = self.search;
        let mut plan = Self::from_parts(self.portals, self.graph, self.decomposition)?;
        plan.search = search;
        Ok(plan)
    }

    pub fn assign(&self, agents: AgentCount, cfg: &AssignCfg) -> Assignment {
        order::assign(&self.graph, &self.portals, agents, cfg)
    }

    pub fn summary(&self) -> Summary {
        Summary {
            portals: self.portals.len(),
            links: self.graph.len(),
            fields: self.graph.field_count(),
            total_lack: self.lack.total,
            max_lack: self.lack.max,
        }
    }

    pub fn key_prep(&self) -> Vec<KeyPrep> {
        self.portals
            .iter()
            .map(|p| KeyPrep {
                portal: p.id,
                name: p.name.clone(),
                have: p.keys,
                need: self.graph.in_degree(p.id),
                lack: self.graph.deficit(p),
            })
            .collect()
    }

    /// First-link direction per portal, each list sorted by portal name.
    pub fn ownership_prep(&self) -> OwnershipPrep {
        let mut first: Vec<Option<bool>> = vec![None; self.portals.len()];
        for l in self.graph.links() {
            first[l.origin].get_or_insert(false);
            first[l.target].get_or_insert(true);
        }
        let mut prep = OwnershipPrep::default();
        for (p, incoming) in first.into_iter().enumerate() {
            match incoming {
                Some(true) => prep.incoming_first.push(p),
                Some(false) => prep.outgoing_first.push(p),
                None => {}
            }
        }
        let by_name = |a: &PortalId, b: &PortalId| {
            self.portals[*a].name.cmp(&self.portals[*b].name).then(a.cmp(b))
        };
        prep.incoming_first.sort_by(by_name);
        prep.outgoing_first.sort_by(by_name);
        prep
    }
}

fn check_decomposition(graph: &LinkGraph, d: &Decomposition, portals: usize) -> Result<()> {
    let nodes = d.len();
    if let Some(r) = d.roots.iter().find(|r| r.0 >= nodes) {
        return Err(PlanError::malformed(format!("root {} out of range", r.0)));
    }
    for (id, g) in d.iter() {
        let ids = g.verts.iter().chain(&g.contents).chain(g.center.iter());
        if ids.copied().any(|p| p >= portals) {
            return Err(PlanError::malformed(format!(
                "triangle {} references an unknown portal",
                id.0
            )));
        }
        if g.children.iter().any(|c| c.0 <= id.0 || c.0 >= nodes) {
            return Err(PlanError::malformed(format!(
                "triangle {} has an invalid child",
                id.0
            )));
        }
        if let Some(&(p, q)) = g.edges().iter().find(|&&(p, q)| graph.find(p, q).is_none()) {
            return Err(PlanError::malformed(format!(
                "triangle {} is missing the link {p}-{q}",
                id.0
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SampleBudget;
    use crate::testkit::{assert_buildable, crossing_pairs, inputs, SQUARE, TRIANGLE};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;

    fn request(coords: &[(i64, i64)], keys: u32, budget: i64, seed: u64) -> PlanRequest {
        PlanRequest {
            portals: inputs(coords, keys),
            search: SearchCfg {
                budget: SampleBudget::new(budget).unwrap(),
                seed: Some(seed),
                ..SearchCfg::default()
            },
        }
    }

    #[test]
    fn three_portals_without_keys() {
        let p = plan(&request(&TRIANGLE, 0, 1, 1)).unwrap();
        let s = p.summary();
        assert_eq!((s.portals, s.links, s.fields), (3, 3, 1));
        assert!(s.total_lack > 0);
        let a = p.assign(AgentCount::new(1).unwrap(), &AssignCfg::default());
        assert_eq!(a.link_agent, vec![0, 0, 0]);
        assert_eq!(a.movements.len(), 1);
    }

    #[test]
    fn convex_quad_counts() {
        let p = plan(&request(&SQUARE, 2, 5, 3)).unwrap();
        assert_eq!(p.summary().links, 5);
        assert_eq!(p.summary().fields, 2);
        assert_eq!(p.lack, KeyLack::default());
    }

    #[test]
    fn triangle_with_center_has_four_fields() {
        let coords = [TRIANGLE[0], TRIANGLE[1], TRIANGLE[2], (300, 300)];
        let p = plan(&request(&coords, 3, 3, 8)).unwrap();
        assert_eq!((p.summary().links, p.summary().fields), (6, 4));
    }

    #[test]
    fn random_layouts_always_plan_with_default_engine() {
        let mut rng = StdRng::seed_from_u64(2024);
        for case in 0..40 {
            let n = rng.gen_range(5..20);
            let coords: BTreeSet<(i64, i64)> = (0..n)
                .map(|_| (rng.gen_range(0..20_000), rng.gen_range(0..20_000)))
                .collect();
            let coords: Vec<_> = coords.into_iter().collect();
            let p = plan(&request(&coords, 1, 3, case))
                .unwrap_or_else(|e| panic!("case {case}, {} portals: {e}", coords.len()));
            assert!(crossing_pairs(&p.graph, &p.portals).is_empty(), "case {case}");
            assert!(p.graph.links().iter().enumerate().all(|(k, l)| l.order == k));
            assert_buildable(&p.graph, &p.decomposition);
        }
    }

    #[test]
    fn too_many_portals_rejected_before_search() {
        let coords: Vec<(i64, i64)> = (0..66).map(|i| (i * 1_000, (i * i) % 97 * 1_000)).collect();
        assert_eq!(
            plan(&request(&coords, 0, 1, 0)),
            Err(PlanError::TooManyPortals {
                count: 66,
                limit: 65
            })
        );
    }

    #[test]
    fn empty_and_duplicate_inputs_rejected() {
        assert_eq!(plan(&request(&[], 0, 1, 0)), Err(PlanError::NoPortals));
        let dup = [(0, 0), (100, 100), (0, 0)];
        assert_eq!(
            plan(&request(&dup, 0, 1, 0)),
            Err(PlanError::DuplicateLocation { a: 0, b: 2 })
        );
    }

    #[test]
    fn single_portal_plans_nothing() {
        let p = plan(&request(&TRIANGLE[..1], 0, 1, 0)).unwrap();
        assert_eq!(p.summary().links, 0);
        assert_eq!(p.ownership_prep(), OwnershipPrep::default());
    }

    #[test]
    fn json_round_trip_then_reassign() {
        let coords = [(0, 0), (4_000, 200), (3_500, 3_900), (-300, 4_100), (1_200, 1_100), (2_600, 1_700)];
        let p = plan(&request(&coords, 1, 5, 21)).unwrap();
        let one = p.assign(AgentCount::new(1).unwrap(), &AssignCfg::default());
        let text = serde_json::to_string(&p).unwrap();
        let back: Plan = serde_json::from_str::<Plan>(&text).unwrap().validate().unwrap();
        assert_eq!(back.graph, p.graph);
        assert_eq!(back.summary(), p.summary());
        assert_eq!(back.search, p.search);
        let two = back.assign(AgentCount::new(2).unwrap(), &AssignCfg::default());
        assert_eq!(two.movements.len(), 2);
        assert_eq!(one.movements.concat().len(), two.movements.concat().len());
    }

    #[test]
    fn from_parts_rejects_missing_links() {
        let p = plan(&request(&SQUARE, 0, 1, 2)).unwrap();
        let mut graph = LinkGraph::new(4);
        graph.add(0, 1, false);
        let err = Plan::from_parts(p.portals.clone(), graph, p.decomposition.clone()).unwrap_err();
        assert!(matches!(err, PlanError::MalformedPlan(_)));
        let wrong_size = LinkGraph::new(3);
        assert!(Plan::from_parts(p.portals, wrong_size, p.decomposition).is_err());
    }

    #[test]
    fn key_and_ownership_prep_cover_every_link() {
        let p = plan(&request(&SQUARE, 0, 1, 6)).unwrap();
        let prep = p.key_prep();
        assert_eq!(prep.iter().map(|k| k.need).sum::<u32>(), 5);
        assert!(prep.iter().all(|k| k.lack == k.need));
        let own = p.ownership_prep();
        assert_eq!(own.incoming_first.len() + own.outgoing_first.len(), 4);
        let first = p.graph.link(0);
        assert!(own.outgoing_first.contains(&first.origin));
        assert!(own.incoming_first.contains(&first.target));
    }

    #[test]
    fn action_points_follow_counts() {
        let s = Summary {
            portals: 3,
            links: 3,
            fields: 1,
            total_lack: 0,
            max_lack: 0,
        };
        let ap = s.action_points();
        assert_eq!(ap.portals, 3 * 1750);
        assert_eq!(ap.total(), 3 * 1750 + 3 * 313 + 1250);
    }
}
