//! Ending a swing and the optional exit boost.

use rapier3d::math::{Point, Vector};
use rapier3d::prelude::Real;
use serde::{Deserialize, Serialize};

use crate::config::GrappleConfig;
use crate::session::GrappleSession;

const COOLDOWN_EPSILON: Real = 1.0e-4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseReason {
    /// The player toggled the grapple off.
    Voluntary,
    /// No go-around path remained past an obstacle.
    Obstructed,
    /// The actor ended up far outside any reachable rope length.
    DistanceSafety,
    /// The grapple tool was put away mid-swing.
    Unequipped,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReleaseOutcome {
    pub reason: ReleaseReason,
    pub point: Point<Real>,
    pub velocity: Vector<Real>,
    pub boosted: bool,
}

/// Clears the swing. Returns `None` (touching nothing) when no swing is active.
pub fn release(
    session: &mut GrappleSession,
    config: &GrappleConfig,
    position: Point<Real>,
    velocity: Vector<Real>,
    reason: ReleaseReason,
) -> Option<ReleaseOutcome> {
    if !session.active {
        return None;
    }
    session.detach();
    let boost = if reason == ReleaseReason::Voluntary && session.boost_cooldown <= COOLDOWN_EPSILON {
        exit_boost(velocity, config)
    } else {
        None
    };
    if boost.is_some() {
        session.boost_cooldown = config.boost_cooldown;
    }
    let boosted = boost.is_some();
    log::info!(
        "grapple released ({:?}) at speed {:.2}{}",
        reason,
        velocity.norm(),
        if boosted { " with boost" } else { "" }
    );
    Some(ReleaseOutcome {
        reason,
        point: position,
        velocity: boost.unwrap_or(velocity),
        boosted,
    })
}

/// Tilts the exit velocity upward (never past `boost_max_up_angle`, never downward) and adds
/// speed interpolated on the pre-boost speed. `None` below `boost_min_speed`.
pub fn exit_boost(velocity: Vector<Real>, config: &GrappleConfig) -> Option<Vector<Real>> {
    let speed = velocity.norm();
    if !speed.is_finite() || speed < config.boost_min_speed || speed <= 1.0e-4 {
        return None;
    }
    let horizontal = Vector::new(velocity.x, 0.0, velocity.z);
    let horizontal_speed = horizontal.norm();
    let mut dir = velocity / speed;
    if horizontal_speed > 1.0e-4 {
        let pitch = velocity.y.atan2(horizontal_speed);
        let target = (pitch + config.boost_tilt).min(config.boost_max_up_angle);
        if target > pitch {
            let flat = horizontal / horizontal_speed;
            dir = flat * target.cos() + Vector::y() * target.sin();
        }
    }
    let span = config.boost_full_speed - config.boost_min_speed;
    let t = if span > 0.0 {
        ((speed - config.boost_min_speed) / span).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let amount = config.boost_min + (config.boost_max - config.boost_min) * t;
    Some(dir * (speed + amount))
}
