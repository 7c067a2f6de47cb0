//! Randomized search driver: many engine trials, keep the least key-hungry.
//!
//! Purpose
//! - Run `triangulate::max_fields` repeatedly with independent rngs and keep
//!   the graph whose key lack (`total + 2·max`) is smallest.
//! - Stop after `budget` consecutive successful trials without improvement, on
//!   a graph that needs no extra keys, or after too many consecutive failures.
//!
//! Determinism
//! - Trial `i` draws from `TrialToken { seed, index: i }`, so the outcome for a
//!   given seed does not depend on thread count or batch size.
//! - Trials run in rayon batches but are reduced one by one in index order;
//!   trials past the stopping point of a batch are discarded unseen.
//!
//! Code cross-refs: `triangulate::{max_fields, TriangulateCfg}`,
//! `plan::plan`.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PlanError, Result};
use crate::graph::LinkGraph;
use crate::portal::Portal;
use crate::triangulate::{max_fields, Deadend, TriangulateCfg, Triangulation};

/// Successful trials without improvement before the search stops.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleBudget(u32);

impl SampleBudget {
    pub const MAX: u32 = 100;

    pub fn new(n: i64) -> Result<Self> {
        if (1..=i64::from(Self::MAX)).contains(&n) {
            Ok(Self(n as u32))
        } else {
            Err(PlanError::InvalidSampleBudget(n))
        }
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for SampleBudget {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

/// Missing keys of a graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLack {
    /// Sum of per-portal deficits.
    pub total: u64,
    /// Largest single-portal deficit.
    pub max: u32,
}

impl KeyLack {
    pub fn of(graph: &LinkGraph, portals: &[Portal]) -> Self {
        portals.iter().fold(Self::default(), |acc, p| {
            let d = graph.deficit(p);
            Self {
                total: acc.total + u64::from(d),
                max: acc.max.max(d),
            }
        })
    }

    /// Search score; one badly short portal costs more than spread-out lack.
    #[inline]
    pub fn weighted(&self) -> u64 {
        self.total + 2 * u64::from(self.max)
    }

    #[inline]
    pub fn is_perfect(&self) -> bool {
        self.total == 0
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SearchCfg {
    pub budget: SampleBudget,
    /// Base seed; `None` draws one from the OS and reports it in the outcome.
    pub seed: Option<u64>,
    /// Consecutive failed trials tolerated before giving up.
    pub max_failures: usize,
    pub parallel: bool,
    pub triangulate: TriangulateCfg,
}

impl Default for SearchCfg {
    fn default() -> Self {
        Self {
            budget: SampleBudget::default(),
            seed: None,
            max_failures: 1000,
            parallel: false,
            triangulate: TriangulateCfg::default(),
        }
    }
}

/// Per-trial rng address: `(seed, index)` mixed into one `StdRng` seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrialToken {
    pub seed: u64,
    pub index: u64,
}

impl TrialToken {
    #[inline]
    pub fn to_std_rng(self) -> StdRng {
        // SplitMix64 finalizer.
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        StdRng::seed_from_u64(mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15))))
    }
}

/// One engine run with the rng addressed by `token`.
pub fn run_trial(
    portals: &[Portal],
    cfg: &TriangulateCfg,
    token: TrialToken,
) -> std::result::Result<Triangulation, Deadend> {
    let mut rng = token.to_std_rng();
    max_fields(portals, cfg, &mut rng)
}

#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub triangulation: Triangulation,
    pub lack: KeyLack,
    /// Base seed actually used.
    pub seed: u64,
    /// Trials reduced (successes and failures).
    pub trials: usize,
    pub failures: usize,
    /// Lack of every successful trial, in trial order.
    pub history: Vec<KeyLack>,
    /// Best weighted lack after each successful trial (non-increasing).
    pub best_history: Vec<u64>,
}

struct Best {
    triangulation: Triangulation,
    lack: KeyLack,
}

/// Search for the triangulation with the least weighted key lack.
///
/// Errors: `SearchExhausted` when `max_failures` consecutive trials fail before
/// any succeeds.
pub fn search(portals: &[Portal], cfg: &SearchCfg) -> Result<SearchOutcome> {
    let seed = cfg.seed.unwrap_or_else(rand::random);
    let batch = if cfg.parallel {
        rayon::current_num_threads().max(1)
    } else {
        1
    };
    let budget = cfg.budget.get();
    let max_failures = cfg.max_failures.max(1);

    let mut best: Option<Best> = None;
    let mut history = Vec::new();
    let mut best_history = Vec::new();
    let (mut trials, mut failures, mut streak, mut since_improve) = (0usize, 0usize, 0usize, 0usize);
    let mut next = 0usize;

    'search: loop {
        let indices = next..next + batch;
        next += batch;
        let trial = |i: usize| {
            let token = TrialToken {
                seed,
                index: i as u64,
            };
            (i, run_trial(portals, &cfg.triangulate, token))
        };
        let results: Vec<_> = if cfg.parallel {
            indices.into_par_iter().map(trial).collect()
        } else {
            indices.map(trial).collect()
        };

        for (i, result) in results {
            trials += 1;
            let triangulation = match result {
                Ok(t) => t,
                Err(dead) => {
                    failures += 1;
                    streak += 1;
                    debug!(trial = i, %dead, "trial failed");
                    if streak >= max_failures {
                        warn!(
                            failures = streak,
                            "randomization failed repeatedly; stopping search"
                        );
                        break 'search;
                    }
                    continue;
                }
            };
            streak = 0;
            let lack = KeyLack::of(&triangulation.graph, portals);
            history.push(lack);
            let improved = best
                .as_ref()
                .map_or(true, |b| lack.weighted() < b.lack.weighted());
            if improved {
                info!(
                    trial = i,
                    total = lack.total,
                    max = lack.max,
                    links = triangulation.graph.len(),
                    "new best key lack"
                );
                best = Some(Best {
                    triangulation,
                    lack,
                });
                since_improve = 0;
            } else {
                debug!(trial = i, weighted = lack.weighted(), "no improvement");
                since_improve += 1;
            }
            let best_lack = best.as_ref().map_or(lack, |b| b.lack);
            best_history.push(best_lack.weighted());
            if best_lack.weighted() == 0 {
                info!(trial = i, "key perfection");
                break 'search;
            }
            if since_improve >= budget {
                break 'search;
            }
        }
    }

    let Some(best) = best else {
        return Err(PlanError::SearchExhausted { attempts: trials });
    };
    info!(
        trials,
        failures,
        total = best.lack.total,
        max = best.lack.max,
        "search finished"
    );
    Ok(SearchOutcome {
        triangulation: best.triangulation,
        lack: best.lack,
        seed,
        trials,
        failures,
        history,
        best_history,
    })
}
