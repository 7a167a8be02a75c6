//! The physics query seam the engine runs against.

use rapier3d::math::{Point, Vector};
use rapier3d::prelude::Real;
use serde::{Deserialize, Serialize};

/// Opaque identity of a world collider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColliderId(pub u64);

#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    pub point: Point<Real>,
    pub normal: Vector<Real>,
    pub collider: ColliderId,
    pub distance: Real,
}

#[derive(Clone, Copy, Debug)]
pub struct OverlapContact {
    pub collider: ColliderId,
    pub point: Point<Real>,
}

/// Convex probe volumes used by the obstruction detector.
#[derive(Clone, Debug, PartialEq)]
pub enum ProbeShape {
    Triangle([Point<Real>; 3]),
    /// Convex hull of the given world-space points.
    Hull(Vec<Point<Real>>),
}

#[derive(Clone, Copy, Debug)]
pub struct QueryOptions<'a> {
    pub exclude: &'a [ColliderId],
    pub mask: u32,
}

impl<'a> QueryOptions<'a> {
    pub fn new(exclude: &'a [ColliderId], mask: u32) -> Self {
        Self { exclude, mask }
    }
}

/// Synchronous scene queries; every call completes within the tick.
pub trait WorldQuery {
    fn cast_ray(
        &self,
        origin: Point<Real>,
        dir: Vector<Real>,
        max_distance: Real,
        options: &QueryOptions<'_>,
    ) -> Option<RayHit>;

    fn overlap(&self, shape: &ProbeShape, options: &QueryOptions<'_>) -> Vec<OverlapContact>;
}
