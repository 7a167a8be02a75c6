//! Position-based pendulum step for an active swing.
//!
//! Each tick integrates gravity and steering into an intermediate velocity, reels the rope,
//! predicts the next position and, when the prediction leaves the rope sphere, projects it back
//! and re-derives the velocity from the projection. The projection only ever removes outward
//! radial velocity; the tangential part passes through untouched.

use rapier3d::math::{Point, Vector};
use rapier3d::prelude::Real;

use crate::config::GrappleConfig;
use crate::governors::{cap_horizontal_speed, cap_tangential_speed, proximity_damping};
use crate::session::GrappleSession;

const DIST_EPS: Real = 1.0e-4;

#[derive(Clone, Copy, Debug)]
pub struct SwingContext {
    pub position: Point<Real>,
    pub velocity: Vector<Real>,
    pub grounded: bool,
    /// `[right, forward]` in `[-1, 1]`.
    pub move_axis: [Real; 2],
    pub dt: Real,
}

#[derive(Clone, Copy, Debug)]
pub struct SwingStep {
    pub velocity: Vector<Real>,
    pub rope_length: Real,
    /// The prediction left the rope sphere and was projected back.
    pub constrained: bool,
}

pub fn integrate_swing(
    session: &mut GrappleSession,
    config: &GrappleConfig,
    ctx: SwingContext,
) -> SwingStep {
    let anchor = match (session.active, session.anchor) {
        (true, Some(anchor)) => anchor,
        _ => {
            return SwingStep {
                velocity: ctx.velocity,
                rope_length: session.rope_length,
                constrained: false,
            }
        }
    };
    let dt = ctx.dt.max(0.0);
    let offset = ctx.position - anchor;
    let distance = offset.norm();
    let radial = radial_dir(offset);
    let damping = proximity_damping(distance, config);

    let mut velocity = ctx.velocity;
    if !ctx.grounded {
        velocity.y -= config.gravity * dt;
    }
    velocity = apply_steering(velocity, ctx.move_axis, ctx.grounded, damping, config, dt);
    velocity = apply_climb_assist(session, velocity, radial, distance, damping, config, dt);
    velocity = cap_tangential_speed(velocity, offset, session.rope_length, config);
    velocity = cap_horizontal_speed(velocity, config, dt);

    session.rope_length = reel_rope(session.rope_length, distance, config, dt);

    let (mut velocity, mut constrained) =
        constrain_to_rope(ctx.position, velocity, anchor, session.rope_length, dt);

    if session.rope_length < config.short_rope_threshold && config.short_rope_threshold > 0.0 {
        let closeness = 1.0 - session.rope_length / config.short_rope_threshold;
        velocity += radial * config.short_rope_push * closeness * dt;
        let (pushed, hit) =
            constrain_to_rope(ctx.position, velocity, anchor, session.rope_length, dt);
        velocity = pushed;
        constrained |= hit;
    }

    SwingStep {
        velocity,
        rope_length: session.rope_length,
        constrained,
    }
}

/// Projects `position + velocity * dt` onto the rope sphere when it lies outside, returning the
/// velocity that lands exactly on the projection.
pub fn constrain_to_rope(
    position: Point<Real>,
    velocity: Vector<Real>,
    anchor: Point<Real>,
    rope_length: Real,
    dt: Real,
) -> (Vector<Real>, bool) {
    if dt <= 0.0 {
        return (velocity, false);
    }
    let predicted = position + velocity * dt;
    let offset = predicted - anchor;
    let distance = offset.norm();
    if distance <= rope_length || distance <= DIST_EPS {
        return (velocity, false);
    }
    let corrected = anchor + offset * (rope_length / distance);
    ((corrected - position) / dt, true)
}

/// Shortens the rope by the reel rate and ratchets it down to the actor's real distance. Neither
/// takes it below `min_rope_length`; a rope attached shorter than that only ever stays put.
pub fn reel_rope(rope_length: Real, distance: Real, config: &GrappleConfig, dt: Real) -> Real {
    let rate = config.reel_speed * proximity_damping(distance, config);
    let floor = config.min_rope_length.min(rope_length);
    let reeled = (rope_length - rate * dt).max(config.min_rope_length);
    reeled.min(rope_length).min(distance.max(floor))
}

/// Rotates the horizontal part of `v` about world up; positive angles turn counter-clockwise seen
/// from above.
pub fn rotate_about_up(v: Vector<Real>, angle: Real) -> Vector<Real> {
    let (sin, cos) = angle.sin_cos();
    Vector::new(v.x * cos + v.z * sin, v.y, -v.x * sin + v.z * cos)
}

fn apply_steering(
    velocity: Vector<Real>,
    move_axis: [Real; 2],
    grounded: bool,
    damping: Real,
    config: &GrappleConfig,
    dt: Real,
) -> Vector<Real> {
    let lateral = move_axis[0].clamp(-1.0, 1.0);
    let forward = move_axis[1].clamp(-1.0, 1.0);
    let mut velocity = velocity;
    if lateral != 0.0 {
        velocity = rotate_about_up(velocity, -lateral * config.steer_rate * damping * dt);
    }
    if forward > 0.0 && !grounded {
        let speed = velocity.norm();
        if speed > 1.0e-3 {
            velocity += velocity / speed * (config.pump_accel * forward * damping * dt);
        }
    } else if forward < 0.0 {
        let scale = (1.0 - config.brake_rate * -forward * dt).clamp(0.0, 1.0);
        velocity.x *= scale;
        velocity.z *= scale;
    }
    velocity
}

fn apply_climb_assist(
    session: &mut GrappleSession,
    velocity: Vector<Real>,
    radial: Vector<Real>,
    distance: Real,
    damping: Real,
    config: &GrappleConfig,
    dt: Real,
) -> Vector<Real> {
    let tangential = velocity - radial * velocity.dot(&radial);
    let angular_rate = tangential.norm() / distance.max(DIST_EPS);
    if angular_rate < config.assist_angular_threshold {
        session.low_momentum_timer += dt;
    } else {
        session.low_momentum_timer = 0.0;
        session.fresh = false;
    }
    let delay = if session.fresh { 0.0 } else { config.assist_delay };
    if session.low_momentum_timer <= delay
        || config.assist_pull <= 0.0
        || distance <= config.min_rope_length
    {
        return velocity;
    }
    let ramp = if config.assist_ramp > 0.0 {
        ((session.low_momentum_timer - delay) / config.assist_ramp).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let inward = -radial;
    let climb = velocity.dot(&inward);
    // Never close more than the remaining gap to the shortest rope in one tick.
    let gap_speed = if dt > 0.0 {
        (distance - config.min_rope_length) / dt
    } else {
        0.0
    };
    let room = config.assist_climb_speed.min(gap_speed) - climb;
    if room <= 0.0 {
        return velocity;
    }
    let add = (config.assist_pull * ramp * damping * dt).min(room);
    velocity + inward * add
}

fn radial_dir(offset: Vector<Real>) -> Vector<Real> {
    let len = offset.norm();
    if len > DIST_EPS {
        offset / len
    } else {
        Vector::y()
    }
}
