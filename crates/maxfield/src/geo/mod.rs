//! Geometry: sphere conversions, gnomonic projection, planar predicates.
//!
//! Purpose
//! - Turn fixed-point latitude/longitude into the three coordinate views every
//!   other module needs: radians (`geo`), unit-sphere vectors (`xyz`), and a
//!   local planar chart in metres (`xy`).
//! - Provide the planar predicates (orientation, containment, crossing) and the
//!   convex perimeter used by the triangulation engine.
//!
//! Why gnomonic
//! - The gnomonic chart maps great circles to straight lines, so a straight
//!   segment in `xy` is exactly the link an agent draws on the globe. Crossing
//!   and containment tests in the chart are therefore exact up to rounding.
//!
//! Code cross-refs: `portal::Portal`, `triangulate::max_fields`, `order::assign`.

pub mod planar;
mod projection;
mod sphere;

pub use planar::{
    on_segment, orient, perimeter, segments_cross, strictly_inside, GeomCfg,
};
pub use projection::{gnomonic_project, GnomonicProjection};
pub use sphere::{great_circle_distance, to_radians, to_unit_sphere, EARTH_RADIUS_M};
