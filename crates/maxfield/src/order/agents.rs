use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::geo::great_circle_distance;
use crate::graph::LinkGraph;
use crate::portal::{Portal, PortalId};

/// Number of cooperating agents (at least one).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCount(u32);

impl AgentCount {
    pub fn new(n: i64) -> Result<Self> {
        match u32::try_from(n) {
            Ok(k) if k > 0 => Ok(Self(k)),
            _ => Err(PlanError::InvalidAgentCount(n)),
        }
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// Timing model for route assignment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssignCfg {
    pub walk_speed_mps: f64,
    /// Time to throw one link once at the portal.
    pub link_secs: f64,
    /// Hand-over delay when the next visit belongs to another agent.
    pub comm_secs: f64,
}

impl Default for AssignCfg {
    fn default() -> Self {
        Self {
            walk_speed_mps: 1.4,
            link_secs: 15.0,
            comm_secs: 30.0,
        }
    }
}

/// Keys each agent consumes at each portal (`agents × portals`, row-major).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyNeeds {
    agents: usize,
    portals: usize,
    counts: Vec<u32>,
}

impl KeyNeeds {
    pub fn new(agents: usize, portals: usize) -> Self {
        Self {
            agents,
            portals,
            counts: vec![0; agents * portals],
        }
    }

    #[inline]
    pub fn get(&self, agent: usize, portal: PortalId) -> u32 {
        self.counts[agent * self.portals + portal]
    }

    /// Keys agent `agent` needs, indexed by portal.
    #[inline]
    pub fn row(&self, agent: usize) -> &[u32] {
        &self.counts[agent * self.portals..(agent + 1) * self.portals]
    }

    /// Keys all agents together need at `portal`.
    pub fn total(&self, portal: PortalId) -> u32 {
        (0..self.agents).map(|a| self.get(a, portal)).sum()
    }

    #[inline]
    pub fn agents(&self) -> usize {
        self.agents
    }

    fn bump(&mut self, agent: usize, portal: PortalId) {
        self.counts[agent * self.portals + portal] += 1;
    }
}

/// Links split among agents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Per agent, the link orders it makes, ascending.
    pub movements: Vec<Vec<usize>>,
    /// Agent making each link, indexed by order.
    pub link_agent: Vec<usize>,
    pub key_needs: KeyNeeds,
    /// Walking distance per agent in metres.
    pub distances: Vec<f64>,
    /// Estimated time until the last link is made.
    pub total_secs: f64,
}

#[derive(Clone, Copy, Debug, Default)]
struct AgentState {
    at: Option<PortalId>,
    free: f64,
}

/// Greedy earliest-finish assignment of visits to agents.
///
/// A visit is a maximal run of consecutive links sharing an origin; it goes
/// to one agent in full. Visits are taken in link order. The winner has the
/// earliest finish time; ties prefer the shorter walk, then the lower index.
pub fn assign(
    graph: &LinkGraph,
    portals: &[Portal],
    agents: AgentCount,
    cfg: &AssignCfg,
) -> Assignment {
    let n = agents.get();
    let mut state = vec![AgentState::default(); n];
    let mut out = Assignment {
        movements: vec![Vec::new(); n],
        link_agent: vec![0; graph.len()],
        key_needs: KeyNeeds::new(n, portals.len()),
        distances: vec![0.0; n],
        total_secs: 0.0,
    };
    let mut prev: Option<(usize, f64)> = None;

    for visit in graph.links().chunk_by(|a, b| a.origin == b.origin) {
        let at = visit[0].origin;
        let work = cfg.link_secs * visit.len() as f64;
        let (agent, walk, finish) = (0..n)
            .map(|a| {
                let walk = state[a]
                    .at
                    .map_or(0.0, |q| great_circle_distance(portals[q].geo, portals[at].geo));
                let arrive = state[a].free + walk / cfg.walk_speed_mps;
                let start = match prev {
                    Some((pa, pf)) if pa != a => arrive.max(pf + cfg.comm_secs),
                    Some((_, pf)) => arrive.max(pf),
                    None => arrive,
                };
                (a, walk, start + work)
            })
            .min_by(|x, y| x.2.total_cmp(&y.2).then(x.1.total_cmp(&y.1)).then(x.0.cmp(&y.0)))
            .unwrap_or((0, 0.0, work));

        state[agent] = AgentState {
            at: Some(at),
            free: finish,
        };
        out.distances[agent] += walk;
        for l in visit {
            out.movements[agent].push(l.order);
            out.link_agent[l.order] = agent;
            out.key_needs.bump(agent, l.target);
        }
        out.total_secs = out.total_secs.max(finish);
        prev = Some((agent, finish));
    }
    out
}
