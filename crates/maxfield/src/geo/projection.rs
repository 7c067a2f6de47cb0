use nalgebra::{Vector2, Vector3};

use super::sphere::EARTH_RADIUS_M;

/// Gnomonic chart tangent to the unit sphere at `center`.
///
/// Axes: `east` and `north` span the tangent plane; coordinates are scaled by
/// the Earth radius so planar lengths near the center read as metres.
#[derive(Clone, Copy, Debug)]
pub struct GnomonicProjection {
    center: Vector3<f64>,
    east: Vector3<f64>,
    north: Vector3<f64>,
}

impl GnomonicProjection {
    /// Chart centred on the normalized centroid of `points`.
    ///
    /// Returns `None` for an empty slice or when the centroid vanishes
    /// (antipodal input, which no portal set produces).
    pub fn centered_on(points: &[Vector3<f64>]) -> Option<Self> {
        let sum: Vector3<f64> = points.iter().sum();
        let center = sum.try_normalize(1e-15)?;
        // East is k × center; at the poles any tangent direction works.
        let east = Vector3::new(-center.y, center.x, 0.0)
            .try_normalize(1e-12)
            .unwrap_or_else(|| Vector3::new(0.0, 1.0, 0.0));
        let north = center.cross(&east);
        Some(Self {
            center,
            east,
            north,
        })
    }

    #[inline]
    pub fn center(&self) -> Vector3<f64> {
        self.center
    }

    /// Project a unit-sphere point onto the tangent plane.
    ///
    /// Pre: `p` lies in the open hemisphere around the center.
    #[inline]
    pub fn project(&self, p: Vector3<f64>) -> Vector2<f64> {
        let depth = p.dot(&self.center);
        debug_assert!(depth > 0.0, "point outside the projection hemisphere");
        let scale = EARTH_RADIUS_M / depth;
        Vector2::new(p.dot(&self.east) * scale, p.dot(&self.north) * scale)
    }
}

/// Project a point set onto the gnomonic chart tangent at its own centroid.
pub fn gnomonic_project(points: &[Vector3<f64>]) -> Vec<Vector2<f64>> {
    match GnomonicProjection::centered_on(points) {
        Some(chart) => points.iter().map(|&p| chart.project(p)).collect(),
        None => vec![Vector2::zeros(); points.len()],
    }
}
