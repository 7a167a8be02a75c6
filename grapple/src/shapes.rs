//! Probe geometry for the obstruction detector: swept triangles and the split capsule shell.
//!
//! Everything here is pure vertex math; the physics backend turns each point list into a convex
//! hull. A capsule half is emitted as many thin convex slabs so that only the shell near the
//! lateral surface is tested, not the solid interior.

use std::f32::consts::FRAC_PI_2;

use rapier3d::math::{Point, Vector};
use rapier3d::prelude::Real;

use crate::config::GrappleConfig;
use crate::query::ProbeShape;

const AXIS_EPS: Real = 1.0e-4;
/// Tangential speeds below this fall back to world up for the split plane.
const MIN_SWING_SPEED: Real = 0.1;
const MIN_TRIANGLE_AREA: Real = 1.0e-4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShellSide {
    Left,
    Right,
}

impl ShellSide {
    fn sign(self) -> Real {
        match self {
            ShellSide::Left => 1.0,
            ShellSide::Right => -1.0,
        }
    }
}

/// Orthonormal frame along the rope, split by the plane spanned by `axis` and `swing_dir`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RopeFrame {
    pub start: Point<Real>,
    pub end: Point<Real>,
    pub axis: Vector<Real>,
    pub length: Real,
    pub swing_dir: Vector<Real>,
    /// Normal of the split plane; the left half lies on its positive side.
    pub normal: Vector<Real>,
}

pub fn rope_frame(start: Point<Real>, end: Point<Real>, velocity: Vector<Real>) -> RopeFrame {
    let span = end - start;
    let length = span.norm();
    let axis = if length > AXIS_EPS {
        span / length
    } else {
        Vector::y()
    };
    let tangential = velocity - axis * velocity.dot(&axis);
    let swing_dir = if tangential.norm() > MIN_SWING_SPEED {
        tangential.normalize()
    } else {
        perpendicular_fallback(axis)
    };
    let normal = axis.cross(&swing_dir).normalize();
    RopeFrame {
        start,
        end,
        axis,
        length,
        swing_dir,
        normal,
    }
}

/// World up projected off `axis`, or world right when the axis is vertical.
fn perpendicular_fallback(axis: Vector<Real>) -> Vector<Real> {
    for candidate in [Vector::y(), Vector::x(), Vector::z()] {
        let projected = candidate - axis * candidate.dot(&axis);
        if projected.norm() > 0.1 {
            return projected.normalize();
        }
    }
    Vector::x()
}

/// Triangle swept by the rope between two checks, or `None` when it has no area.
pub fn swept_triangle(
    previous_chest: Point<Real>,
    chest: Point<Real>,
    anchor: Point<Real>,
) -> Option<ProbeShape> {
    let area = (chest - previous_chest).cross(&(anchor - previous_chest)).norm() * 0.5;
    if !area.is_finite() || area < MIN_TRIANGLE_AREA {
        return None;
    }
    Some(ProbeShape::Triangle([previous_chest, chest, anchor]))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShellParams {
    pub radius: Real,
    pub thickness: Real,
    pub segments: u32,
    pub cap_rings: u32,
    pub split_gap: Real,
}

impl ShellParams {
    pub fn from_config(config: &GrappleConfig) -> Self {
        Self {
            radius: config.capsule_radius,
            thickness: config.shell_thickness,
            segments: config.shell_segments,
            cap_rings: config.shell_cap_rings,
            split_gap: config.shell_split_gap,
        }
    }

    fn radii(&self) -> [Real; 2] {
        let outer = self.radius.max(AXIS_EPS);
        let inner = (outer - self.thickness.max(0.0)).max(outer * 0.1);
        [inner, outer]
    }
}

/// Thin shell over one lateral half of a capsule wrapped around the rope, as convex slabs.
pub fn half_capsule_shell(frame: &RopeFrame, side: ShellSide, params: &ShellParams) -> Vec<ProbeShape> {
    let normal = frame.normal * side.sign();
    let segments = params.segments.max(1);
    let gap = params.split_gap.clamp(0.0, FRAC_PI_2 - 1.0e-3);
    let arc_start = -FRAC_PI_2 + gap;
    let arc_step = (FRAC_PI_2 - gap - arc_start) / segments as Real;
    let radii = params.radii();
    let around = |theta: Real| normal * theta.cos() + frame.swing_dir * theta.sin();

    let mut pieces = Vec::new();
    for i in 0..segments {
        let thetas = [
            arc_start + arc_step * i as Real,
            arc_start + arc_step * (i + 1) as Real,
        ];
        let mut points = Vec::with_capacity(8);
        for theta in thetas {
            for radius in radii {
                let offset = around(theta) * radius;
                points.push(frame.start + offset);
                points.push(frame.end + offset);
            }
        }
        pieces.push(ProbeShape::Hull(points));

        for (center, pole) in [(frame.start, -frame.axis), (frame.end, frame.axis)] {
            for ring in 0..params.cap_rings {
                let phi_step = FRAC_PI_2 / params.cap_rings as Real;
                let phis = [phi_step * ring as Real, phi_step * (ring + 1) as Real];
                let mut points = Vec::with_capacity(8);
                for theta in thetas {
                    for phi in phis {
                        let dir = around(theta) * phi.cos() + pole * phi.sin();
                        for radius in radii {
                            points.push(center + dir * radius);
                        }
                    }
                }
                pieces.push(ProbeShape::Hull(points));
            }
        }
    }
    pieces
}
