//! Bounded velocity modifiers layered on the swing integrator.

use rapier3d::math::Vector;
use rapier3d::prelude::Real;

use crate::config::GrappleConfig;

/// 1.0 at or beyond `damping_range`, easing down to `damping_min` at the anchor.
pub fn proximity_damping(distance: Real, config: &GrappleConfig) -> Real {
    let range = config.damping_range.max(1.0e-3);
    let t = (distance / range).clamp(0.0, 1.0);
    let smooth = t * t * (3.0 - 2.0 * t);
    let min = config.damping_min.clamp(0.0, 1.0);
    min + (1.0 - min) * smooth
}

/// Tangential speed allowed around the anchor for the current rope length.
pub fn tangential_cap(rope_length: Real, config: &GrappleConfig) -> Real {
    config
        .max_tangential_speed
        .min(config.max_angular_rate * rope_length.max(0.0))
}

/// Clips the horizontal velocity component perpendicular to the horizontal radial direction.
pub fn cap_tangential_speed(
    velocity: Vector<Real>,
    offset_from_anchor: Vector<Real>,
    rope_length: Real,
    config: &GrappleConfig,
) -> Vector<Real> {
    let radial = Vector::new(offset_from_anchor.x, 0.0, offset_from_anchor.z);
    let radial_len = radial.norm();
    if radial_len <= 1.0e-4 {
        return velocity;
    }
    let radial = radial / radial_len;
    let horizontal = Vector::new(velocity.x, 0.0, velocity.z);
    let tangential = horizontal - radial * horizontal.dot(&radial);
    let speed = tangential.norm();
    let cap = tangential_cap(rope_length, config);
    if speed <= cap || speed <= 1.0e-6 {
        return velocity;
    }
    velocity - tangential * (1.0 - cap / speed)
}

/// Drags horizontal speed back toward `max_horizontal_speed` in proportion to the excess.
pub fn cap_horizontal_speed(velocity: Vector<Real>, config: &GrappleConfig, dt: Real) -> Vector<Real> {
    let speed = (velocity.x * velocity.x + velocity.z * velocity.z).sqrt();
    let max = config.max_horizontal_speed;
    if speed <= max || speed <= 0.0 {
        return velocity;
    }
    let excess = speed - max;
    let removed = excess * (config.horizontal_drag * dt).clamp(0.0, 1.0);
    let scale = (speed - removed) / speed;
    Vector::new(velocity.x * scale, velocity.y, velocity.z * scale)
}
