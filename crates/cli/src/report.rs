//! JSON reports printed by the CLI.

use maxfield::api::{ActionPoints, Assignment, KeyPrep, Plan, SearchReport, Summary};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PlanReport {
    pub summary: Summary,
    pub action_points: ActionPoints,
    pub action_points_total: u64,
    /// Portals that still need keys farmed.
    pub keys_to_farm: Vec<KeyPrep>,
    /// Portal names to capture before the first incoming link.
    pub capture_first: Vec<String>,
    /// Portal names captured on arrival, as their first link is outgoing.
    pub capture_on_arrival: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agents: Option<Vec<AgentReport>>,
}

#[derive(Debug, Serialize)]
pub struct AgentReport {
    pub agent: usize,
    pub links: usize,
    pub walk_m: f64,
    pub keys: u32,
}

impl PlanReport {
    pub fn new(plan: &Plan, assignment: Option<&Assignment>) -> Self {
        let summary = plan.summary();
        let action_points = summary.action_points();
        let names = |ids: &[usize]| -> Vec<String> {
            ids.iter().map(|&p| plan.portals[p].name.clone()).collect()
        };
        let ownership = plan.ownership_prep();
        Self {
            summary,
            action_points,
            action_points_total: action_points.total(),
            keys_to_farm: plan.key_prep().into_iter().filter(|k| k.lack > 0).collect(),
            capture_first: names(&ownership.incoming_first),
            capture_on_arrival: names(&ownership.outgoing_first),
            search: plan.search.clone(),
            agents: assignment.map(agent_reports),
        }
    }
}

fn agent_reports(a: &Assignment) -> Vec<AgentReport> {
    a.movements
        .iter()
        .enumerate()
        .map(|(agent, links)| AgentReport {
            agent,
            links: links.len(),
            walk_m: a.distances[agent],
            keys: a.key_needs.row(agent).iter().sum(),
        })
        .collect()
}
