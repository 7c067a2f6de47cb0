//! Planar predicates on the gnomonic chart.
//!
//! - `GeomCfg`: the single area tolerance shared by all predicates.
//! - `orient`: twice the signed triangle area (positive for a→b→c CCW).
//! - `perimeter`: convex hull indices (CCW), keeping collinear boundary points.

use std::cmp::Ordering;

use nalgebra::Vector2;

/// Geometry configuration (tolerances).
///
/// `eps_area` bounds `|orient|` below which three points count as collinear.
/// Chart units are metres, so the default is a sliver well under a millimetre
/// wide for kilometre-scale baselines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeomCfg {
    pub eps_area: f64,
}

impl Default for GeomCfg {
    fn default() -> Self {
        Self { eps_area: 1e-4 }
    }
}

/// Twice the signed area of triangle `abc`.
#[inline]
pub fn orient(a: Vector2<f64>, b: Vector2<f64>, c: Vector2<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    ab.x * ac.y - ab.y * ac.x
}

/// `p` lies strictly inside triangle `tri` (either winding), off all edges.
pub fn strictly_inside(tri: [Vector2<f64>; 3], p: Vector2<f64>, eps: f64) -> bool {
    let [a, b, c] = tri;
    let s = orient(a, b, c).signum();
    s * orient(a, b, p) > eps && s * orient(b, c, p) > eps && s * orient(c, a, p) > eps
}

/// `p` lies on the open segment `ab`.
pub fn on_segment(a: Vector2<f64>, b: Vector2<f64>, p: Vector2<f64>, eps: f64) -> bool {
    orient(a, b, p).abs() <= eps && (p - a).dot(&(b - a)) > 0.0 && (p - b).dot(&(a - b)) > 0.0
}

/// Segments `ab` and `cd` cross at a point interior to both.
///
/// Touching at a shared endpoint is not a crossing.
pub fn segments_cross(
    a: Vector2<f64>,
    b: Vector2<f64>,
    c: Vector2<f64>,
    d: Vector2<f64>,
    eps: f64,
) -> bool {
    let straddles = |s: f64, t: f64| (s > eps && t < -eps) || (s < -eps && t > eps);
    straddles(orient(c, d, a), orient(c, d, b)) && straddles(orient(a, b, c), orient(a, b, d))
}

/// Convex perimeter of `points` as indices in CCW order.
///
/// Andrew's monotone chain for the strict hull, then points lying on a hull
/// edge are spliced back in between its endpoints. Fewer than three
/// non-collinear points return the strict chain unchanged.
pub fn perimeter(points: &[Vector2<f64>], cfg: GeomCfg) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..points.len()).collect();
    idx.sort_by(|&a, &b| {
        let (pa, pb) = (points[a], points[b]);
        match pa.x.partial_cmp(&pb.x).unwrap_or(Ordering::Equal) {
            Ordering::Equal => pa.y.partial_cmp(&pb.y).unwrap_or(Ordering::Equal),
            o => o,
        }
    });
    if idx.len() < 3 {
        return idx;
    }
    let eps = cfg.eps_area;
    let mut lower: Vec<usize> = Vec::with_capacity(idx.len());
    for &i in &idx {
        while lower.len() >= 2
            && orient(
                points[lower[lower.len() - 2]],
                points[lower[lower.len() - 1]],
                points[i],
            ) <= eps
        {
            lower.pop();
        }
        lower.push(i);
    }
    let mut upper: Vec<usize> = Vec::with_capacity(idx.len());
    for &i in idx.iter().rev() {
        while upper.len() >= 2
            && orient(
                points[upper[upper.len() - 2]],
                points[upper[upper.len() - 1]],
                points[i],
            ) <= eps
        {
            upper.pop();
        }
        upper.push(i);
    }
    lower.pop();
    upper.pop();
    let mut hull = lower;
    hull.extend(upper);
    if hull.len() < 3 {
        return hull;
    }

    let mut on_hull = vec![false; points.len()];
    for &h in &hull {
        on_hull[h] = true;
    }
    let mut out = Vec::with_capacity(points.len());
    for k in 0..hull.len() {
        let a = hull[k];
        let b = hull[(k + 1) % hull.len()];
        out.push(a);
        let dir = points[b] - points[a];
        let mut between: Vec<(f64, usize)> = (0..points.len())
            .filter(|&i| !on_hull[i] && on_segment(points[a], points[b], points[i], eps))
            .map(|i| ((points[i] - points[a]).dot(&dir), i))
            .collect();
        between.sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap_or(Ordering::Equal));
        for (_, i) in between {
            on_hull[i] = true;
            out.push(i);
        }
    }
    out
}
