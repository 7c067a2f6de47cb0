//! Time full plans over growing random portal sets.
//!
//! Usage:
//!   cargo run -p maxfield --release --example plan_timing -- [max_portals] [--parallel]
//!
//! Prints one line per size: portals, links, fields, key lack, trials, seconds.

use std::time::Instant;

use maxfield::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let max = args
        .iter()
        .find_map(|a| a.parse::<usize>().ok())
        .unwrap_or(40)
        .clamp(3, maxfield::plan::MAX_PORTALS);
    let parallel = args.iter().any(|a| a == "--parallel");
    let mut rng = StdRng::seed_from_u64(2024);

    println!("portals  links  fields  lack  trials  secs");
    for n in (5..=max).step_by(5) {
        let portals = (0..n)
            .map(|i| {
                PortalInput::new(
                    format!("P{i}"),
                    51_500_000 + rng.gen_range(0..20_000),
                    -120_000 + rng.gen_range(0..30_000),
                    rng.gen_range(0..2),
                )
            })
            .collect();
        let request = PlanRequest {
            portals,
            search: SearchCfg {
                budget: SampleBudget::new(20).unwrap_or_default(),
                seed: Some(n as u64),
                parallel,
                ..SearchCfg::default()
            },
        };
        let start = Instant::now();
        match plan(&request) {
            Ok(p) => {
                let s = p.summary();
                let trials = p.search.as_ref().map_or(0, |r| r.trials);
                println!(
                    "{:>7}  {:>5}  {:>6}  {:>4}  {:>6}  {:.3}",
                    s.portals,
                    s.links,
                    s.fields,
                    s.total_lack,
                    trials,
                    start.elapsed().as_secs_f64()
                );
            }
            Err(e) => eprintln!("{n:>7}  failed: {e}"),
        }
    }
}
