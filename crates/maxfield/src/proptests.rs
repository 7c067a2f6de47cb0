//! Properties of finalized plans over random portal sets.

use std::collections::BTreeSet;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::geo::{orient, perimeter, GeomCfg};
use crate::order::{finalize, improve_order};
use crate::plan::{plan, PlanRequest};
use crate::portal::Portal;
use crate::search::{search, SampleBudget, SearchCfg};
use crate::testkit::{assert_buildable, crossing_pairs, inputs, portals};
use crate::triangulate::{max_fields, TriangulateCfg};

fn layouts() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::btree_set((0i64..20_000, 0i64..20_000), 3..24)
        .prop_map(|s: BTreeSet<(i64, i64)>| s.into_iter().collect())
}

/// No three portals within a square metre of collinear.
fn general_position(ps: &[Portal]) -> bool {
    let n = ps.len();
    (0..n).all(|a| {
        (a + 1..n).all(|b| (b + 1..n).all(|c| orient(ps[a].xy, ps[b].xy, ps[c].xy).abs() > 1.0))
    })
}

fn uncapped() -> TriangulateCfg {
    TriangulateCfg {
        max_outgoing: u32::MAX,
        ..TriangulateCfg::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Property: a finalized graph is planar, densely ordered and buildable.
    #[test]
    fn prop_finalized_graph_is_consistent(coords in layouts(), keys in 0u32..4, seed in any::<u64>()) {
        let ps = portals(&coords, keys);
        prop_assume!(general_position(&ps));
        let mut rng = StdRng::seed_from_u64(seed);
        let mut t = max_fields(&ps, &uncapped(), &mut rng).unwrap();
        finalize(&mut t.graph, &t.decomposition).unwrap();

        prop_assert!(crossing_pairs(&t.graph, &ps).is_empty());
        for (k, l) in t.graph.links().iter().enumerate() {
            prop_assert_eq!(l.order, k);
            prop_assert!(l.fields.len() <= 2);
        }
        assert_buildable(&t.graph, &t.decomposition);

        // Each field sits on the latest of its edges; two fields lie on opposite sides.
        for l in t.graph.links() {
            for f in &l.fields {
                let [a, b, c] = *f;
                let latest = [(a, b), (b, c), (a, c)]
                    .iter()
                    .filter_map(|&(p, q)| t.graph.find(p, q))
                    .max();
                prop_assert_eq!(latest, Some(l.order));
            }
            if let [f, g] = &l.fields[..] {
                let apex = |f: &[usize; 3]| f.iter().copied().find(|&v| v != l.origin && v != l.target);
                let (o, d) = (ps[l.origin].xy, ps[l.target].xy);
                let sides = (apex(f).map(|v| orient(o, d, ps[v].xy)), apex(g).map(|v| orient(o, d, ps[v].xy)));
                prop_assert!(matches!(sides, (Some(x), Some(y)) if x * y < 0.0));
            }
        }
    }

    /// Property: triangle and link counts follow from hull size alone.
    #[test]
    fn prop_counts_follow_hull_size(coords in layouts(), seed in any::<u64>()) {
        let ps = portals(&coords, 0);
        prop_assume!(general_position(&ps));
        let xy: Vec<_> = ps.iter().map(|p| p.xy).collect();
        let h = perimeter(&xy, GeomCfg::default()).len();
        let n = ps.len();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut t = max_fields(&ps, &uncapped(), &mut rng).unwrap();
        finalize(&mut t.graph, &t.decomposition).unwrap();
        prop_assert_eq!(t.graph.field_count(), (h - 2) + 3 * (n - h));
        prop_assert_eq!(t.graph.len(), 3 * n - 3 - h);
    }

    /// Property: re-running the reorder on a finalized graph changes nothing.
    #[test]
    fn prop_improve_order_idempotent(coords in layouts(), seed in any::<u64>()) {
        let ps = portals(&coords, 1);
        prop_assume!(general_position(&ps));
        let mut rng = StdRng::seed_from_u64(seed);
        let mut t = max_fields(&ps, &uncapped(), &mut rng).unwrap();
        finalize(&mut t.graph, &t.decomposition).unwrap();
        let once = t.graph.clone();
        improve_order(&mut t.graph, &t.decomposition).unwrap();
        prop_assert_eq!(t.graph, once);
    }

    /// Property: planning with the stock engine succeeds and is buildable.
    #[test]
    fn prop_plan_with_default_engine(coords in layouts(), keys in 0u32..3, seed in any::<u64>()) {
        prop_assume!(general_position(&portals(&coords, keys)));
        let request = PlanRequest {
            portals: inputs(&coords, keys),
            search: SearchCfg {
                budget: SampleBudget::new(4).unwrap(),
                seed: Some(seed),
                ..SearchCfg::default()
            },
        };
        let p = plan(&request);
        prop_assert!(p.is_ok(), "{:?}", p.as_ref().err());
        let p = p.unwrap();
        prop_assert!(crossing_pairs(&p.graph, &p.portals).is_empty());
        for (k, l) in p.graph.links().iter().enumerate() {
            prop_assert_eq!(l.order, k);
        }
        let cap = SearchCfg::default().triangulate.max_outgoing;
        prop_assert!((0..p.portals.len()).all(|v| p.graph.out_degree(v) <= cap));
        assert_buildable(&p.graph, &p.decomposition);
    }

    /// Property: the best score of a search never gets worse.
    #[test]
    fn prop_search_best_non_increasing(coords in layouts(), seed in any::<u64>()) {
        let ps = portals(&coords, 1);
        prop_assume!(general_position(&ps));
        let cfg = SearchCfg {
            budget: SampleBudget::new(8).unwrap(),
            seed: Some(seed),
            triangulate: uncapped(),
            ..SearchCfg::default()
        };
        let out = search(&ps, &cfg).unwrap();
        prop_assert!(out.best_history.windows(2).all(|w| w[1] <= w[0]));
        prop_assert_eq!(out.best_history.last().copied(), Some(out.lack.weighted()));
    }
}
