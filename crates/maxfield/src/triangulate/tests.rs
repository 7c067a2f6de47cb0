use super::*;
use crate::testkit::{assert_buildable, crossing_pairs, portals, SQUARE, TRIANGLE};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn run(coords: &[(i64, i64)], keys: u32, seed: u64) -> Result<Triangulation, Deadend> {
    let ps = portals(coords, keys);
    let mut rng = StdRng::seed_from_u64(seed);
    max_fields(&ps, &TriangulateCfg::default(), &mut rng)
}

#[test]
fn single_triangle_is_one_field_three_links() {
    let t = run(&TRIANGLE, 0, 1).unwrap();
    assert_eq!(t.graph.len(), 3);
    assert_eq!(t.decomposition.len(), 1);
    assert_eq!(t.decomposition.roots.len(), 1);
    assert_eq!(t.decomposition.max_depth(), Some(0));
    assert_eq!(t.decomposition.edges_by_depth(0).len(), 3);
}

#[test]
fn convex_quad_has_two_fields_five_links() {
    for seed in 0..16 {
        let t = run(&SQUARE, 1, seed).unwrap();
        assert_eq!(t.graph.len(), 5, "seed {seed}");
        assert_eq!(t.decomposition.len(), 2);
        // The shared diagonal is reported once.
        assert_eq!(t.decomposition.edges_by_depth(0).len(), 5);
    }
}

#[test]
fn interior_portal_splits_into_three() {
    let coords = [TRIANGLE[0], TRIANGLE[1], TRIANGLE[2], (300, 300)];
    let t = run(&coords, 2, 7).unwrap();
    assert_eq!(t.graph.len(), 6);
    assert_eq!(t.decomposition.len(), 4);
    let root = t.decomposition.get(t.decomposition.roots[0]);
    assert_eq!(root.center, Some(3));
    assert_eq!(root.children.len(), 3);
    let opposite = t.decomposition.get(root.children[0]);
    assert!(opposite.exterior);
    assert_eq!(opposite.verts[0], 3);
    let spokes = t.decomposition.edges_by_depth(1);
    assert_eq!(spokes.len(), 3);
    assert!(spokes.iter().all(|&(_, c)| c == 3));
}

#[test]
fn links_from_interior_portal_precede_enclosing_closure() {
    let coords = [TRIANGLE[0], TRIANGLE[1], TRIANGLE[2], (300, 300)];
    for seed in 0..16 {
        let t = run(&coords, 0, seed).unwrap();
        let root = t.decomposition.get(t.decomposition.roots[0]);
        let closing = root
            .edges()
            .iter()
            .filter_map(|&(p, q)| t.graph.find(p, q))
            .max()
            .unwrap();
        for l in t.graph.links().iter().filter(|l| l.origin == 3) {
            assert!(l.order < closing, "seed {seed}: {l:?} after {closing}");
        }
    }
}

#[test]
fn triangle_of_earlier_diagonals_is_built_before_it_closes() {
    // Ears cut first leave the middle triangle with all sides drawn.
    let coords = [
        (500, 0),
        (0, 300),
        (0, 700),
        (500, 1_000),
        (1_000, 700),
        (1_000, 300),
        (560, 430),
    ];
    for seed in 0..64 {
        let t = run(&coords, 1, seed).unwrap_or_else(|d| panic!("seed {seed}: {d}"));
        assert_buildable(&t.graph, &t.decomposition);
        assert_eq!(t.graph.len(), 3 * 7 - 3 - 6, "seed {seed}");
    }
}

#[test]
fn fewer_than_three_portals_give_empty_graph() {
    for coords in [&TRIANGLE[..1], &TRIANGLE[..2]] {
        let t = run(coords, 0, 3).unwrap();
        assert!(t.graph.is_empty());
        assert!(t.decomposition.is_empty());
    }
}

#[test]
fn outgoing_cap_zero_is_a_dead_end() {
    let ps = portals(&TRIANGLE, 0);
    let cfg = TriangulateCfg {
        max_outgoing: 0,
        ..TriangulateCfg::default()
    };
    let mut rng = StdRng::seed_from_u64(0);
    assert!(max_fields(&ps, &cfg, &mut rng).is_err());
}

#[test]
fn hub_with_many_spokes_respects_outgoing_cap() {
    // A fan of 12 interior-ish points around one hub stresses the cap.
    let mut coords = vec![(0, 0)];
    for k in 0..12 {
        let a = k as f64 * std::f64::consts::TAU / 12.0;
        coords.push(((a.cos() * 2_000.0) as i64, (a.sin() * 2_000.0) as i64));
    }
    let ps = portals(&coords, 0);
    let cfg = TriangulateCfg::default();
    for seed in 0..8 {
        let mut rng = StdRng::seed_from_u64(seed);
        if let Ok(t) = max_fields(&ps, &cfg, &mut rng) {
            assert!((0..ps.len()).all(|p| t.graph.out_degree(p) <= cfg.max_outgoing));
        }
    }
}

#[test]
fn portal_on_a_diagonal_is_a_dead_end() {
    // Centered on (0, 0) the square's diagonals are great circles through the
    // middle portal, so it can only ever sit on a link.
    let coords = [(-1_000, -1_000), (-1_000, 1_000), (1_000, 1_000), (1_000, -1_000), (0, 0)];
    let ps = crate::testkit::portals_at((0, 0), &coords, 0);
    let mut rng = StdRng::seed_from_u64(5);
    let err = max_fields(&ps, &TriangulateCfg::default(), &mut rng).unwrap_err();
    assert!(err.reason.contains("portal 4"), "{err}");
}

#[test]
fn scattered_portals_are_planar_and_fully_used() {
    let coords = [
        (0, 0),
        (4_000, 200),
        (3_500, 3_900),
        (-300, 4_100),
        (1_200, 1_100),
        (2_600, 1_700),
        (1_900, 3_000),
        (700, 2_600),
        (3_000, 800),
    ];
    let ps = portals(&coords, 3);
    let cfg = TriangulateCfg {
        max_outgoing: 64,
        ..TriangulateCfg::default()
    };
    for seed in 0..8 {
        let mut rng = StdRng::seed_from_u64(seed);
        let t = max_fields(&ps, &cfg, &mut rng).unwrap();
        assert!(crossing_pairs(&t.graph, &ps).is_empty(), "seed {seed}");
        // Hull has 4 vertices: (4 - 2) + 3·(9 - 4) triangles.
        assert_eq!(t.decomposition.len(), 17);
        assert_eq!(t.graph.len(), 3 * 9 - 3 - 4);
    }
}

#[test]
fn same_seed_same_graph() {
    let coords = [TRIANGLE[0], TRIANGLE[1], TRIANGLE[2], (300, 300), (500, 200)];
    let a = run(&coords, 1, 11).unwrap();
    let b = run(&coords, 1, 11).unwrap();
    assert_eq!(a.graph, b.graph);
    assert_eq!(a.decomposition, b.decomposition);
}
