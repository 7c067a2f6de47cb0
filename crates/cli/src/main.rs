use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use maxfield::api::{
    plan, AgentCount, AssignCfg, Assignment, Plan, PlanRequest, SampleBudget, SearchCfg,
};
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::EnvFilter;

mod input;
mod provenance;
mod report;

use provenance::{write_sidecar, Payload};
use report::PlanReport;

#[derive(Parser)]
#[command(name = "maxfield")]
#[command(about = "Plan maximal field operations and split them among agents")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Read a portal list, search for a plan, and assign it to agents
    Plan {
        #[arg(long)]
        input: PathBuf,
        #[arg(short = 'n', long, default_value_t = 1, allow_negative_numbers = true)]
        agents: i64,
        /// Trials without improvement before the search stops (1..=100)
        #[arg(short = 's', long, default_value_t = 100, allow_negative_numbers = true)]
        samples: i64,
        #[arg(long)]
        seed: Option<u64>,
        /// Run trials on all cores
        #[arg(long)]
        parallel: bool,
        #[arg(long)]
        out: PathBuf,
    },
    /// Re-assign a stored plan to a different number of agents
    Assign {
        #[arg(long)]
        plan: PathBuf,
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        agents: i64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print counts, action points, and key prep of a stored plan
    Report {
        #[arg(long)]
        plan: PathBuf,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    SubscriberBuilder::default()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Plan {
            input,
            agents,
            samples,
            seed,
            parallel,
            out,
        } => run_plan(&input, agents, samples, seed, parallel, &out),
        Action::Assign { plan, agents, out } => run_assign(&plan, agents, &out),
        Action::Report { plan } => run_report(&plan),
    }
}

fn run_plan(
    input: &Path,
    agents: i64,
    samples: i64,
    seed: Option<u64>,
    parallel: bool,
    out: &Path,
) -> Result<()> {
    let agents = AgentCount::new(agents)?;
    let budget = SampleBudget::new(samples)?;
    tracing::info!(input = %input.display(), agents = agents.get(), samples, "plan");
    let request = PlanRequest {
        portals: input::read_portals(input)?,
        search: SearchCfg {
            budget,
            seed,
            parallel,
            ..SearchCfg::default()
        },
    };
    let plan = plan(&request).context("planning failed")?;
    let assignment = plan.assign(agents, &AssignCfg::default());

    fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
    let params = json!({
        "agents": agents.get(),
        "samples": samples,
        "seed": plan.search.as_ref().map(|s| s.seed),
        "parallel": parallel,
    });
    let plan_path = out.join("plan.json");
    write_json(&plan_path, &plan)?;
    write_sidecar(
        &plan_path,
        Payload::new(params.clone()).with_input(input).with_plan(&plan),
    )?;
    let assignment_path = out.join("assignment.json");
    write_json(&assignment_path, &assignment)?;
    write_sidecar(
        &assignment_path,
        Payload::new(params)
            .with_input(input)
            .with_assignment(&assignment),
    )?;

    print_report(&plan, Some(&assignment))
}

fn run_assign(plan_path: &Path, agents: i64, out: &Path) -> Result<()> {
    let agents = AgentCount::new(agents)?;
    let plan = load_plan(plan_path)?;
    tracing::info!(plan = %plan_path.display(), agents = agents.get(), "assign");
    let assignment: Assignment = plan.assign(agents, &AssignCfg::default());
    fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
    let path = out.join("assignment.json");
    write_json(&path, &assignment)?;
    write_sidecar(
        &path,
        Payload::new(json!({ "agents": agents.get() }))
            .with_input(plan_path)
            .with_assignment(&assignment),
    )?;
    print_report(&plan, Some(&assignment))
}

fn run_report(plan_path: &Path) -> Result<()> {
    let plan = load_plan(plan_path)?;
    print_report(&plan, None)
}

fn load_plan(path: &Path) -> Result<Plan> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let stored: Plan = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing plan {}", path.display()))?;
    stored
        .validate()
        .with_context(|| format!("validating plan {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    fs::write(path, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))
}

fn print_report(plan: &Plan, assignment: Option<&Assignment>) -> Result<()> {
    let report = PlanReport::new(plan, assignment);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
