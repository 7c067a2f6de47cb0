//! Portals: graph nodes with key budgets and derived coordinates.

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::geo::{gnomonic_project, to_radians, to_unit_sphere};

/// Dense portal index; equal to the portal's position in the input list.
pub type PortalId = usize;

/// Raw portal record as handed over by the ingestion layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalInput {
    pub name: String,
    /// Latitude in micro-degrees.
    pub lat_e6: i64,
    /// Longitude in micro-degrees.
    pub lon_e6: i64,
    /// Keys the team already holds for this portal.
    pub keys: u32,
}

impl PortalInput {
    pub fn new(name: impl Into<String>, lat_e6: i64, lon_e6: i64, keys: u32) -> Self {
        Self {
            name: name.into(),
            lat_e6,
            lon_e6,
            keys,
        }
    }
}

/// Portal with derived geometry.
///
/// Invariants: `geo`, `xyz`, `xy` are derived once from `lat_e6/lon_e6` (the
/// chart depends on the whole set) and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    pub id: PortalId,
    pub name: String,
    pub keys: u32,
    pub lat_e6: i64,
    pub lon_e6: i64,
    /// `(lat, lon)` in radians.
    pub geo: Vector2<f64>,
    /// Unit-sphere position.
    pub xyz: Vector3<f64>,
    /// Gnomonic chart position in metres.
    pub xy: Vector2<f64>,
}

impl Portal {
    /// Build the portal set, projecting onto the chart tangent at its centroid.
    pub fn from_inputs(inputs: &[PortalInput]) -> Vec<Portal> {
        let geo: Vec<Vector2<f64>> = inputs
            .iter()
            .map(|p| to_radians(p.lat_e6, p.lon_e6))
            .collect();
        let xyz: Vec<Vector3<f64>> = geo.iter().map(|&g| to_unit_sphere(g)).collect();
        let xy = gnomonic_project(&xyz);
        inputs
            .iter()
            .enumerate()
            .map(|(id, p)| Portal {
                id,
                name: p.name.clone(),
                keys: p.keys,
                lat_e6: p.lat_e6,
                lon_e6: p.lon_e6,
                geo: geo[id],
                xyz: xyz[id],
                xy: xy[id],
            })
            .collect()
    }

    /// Recover the raw record this portal was derived from.
    pub fn input(&self) -> PortalInput {
        PortalInput::new(self.name.clone(), self.lat_e6, self.lon_e6, self.keys)
    }
}
