use nalgebra::{Vector2, Vector3};

/// Mean Earth radius in metres (spherical model).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Micro-degree latitude/longitude to radians, packed as `(lat, lon)`.
#[inline]
pub fn to_radians(lat_e6: i64, lon_e6: i64) -> Vector2<f64> {
    Vector2::new(
        (lat_e6 as f64 * 1e-6).to_radians(),
        (lon_e6 as f64 * 1e-6).to_radians(),
    )
}

/// Point on the unit sphere for `(lat, lon)` in radians.
#[inline]
pub fn to_unit_sphere(geo: Vector2<f64>) -> Vector3<f64> {
    let (lat, lon) = (geo.x, geo.y);
    Vector3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

/// Great-circle distance in metres between two `(lat, lon)` radian pairs.
///
/// Haversine form; well conditioned for the short baselines between portals.
pub fn great_circle_distance(a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    let dlat = b.x - a.x;
    let dlon = b.y - a.y;
    let h = (0.5 * dlat).sin().powi(2) + a.x.cos() * b.x.cos() * (0.5 * dlon).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}
