//! Resolving a fire request into an anchor point.

use rapier3d::math::{Point, Vector};
use rapier3d::prelude::Real;

use crate::config::GrappleConfig;
use crate::events::{EventSink, GrappleEvent};
use crate::query::{ColliderId, QueryOptions, RayHit, WorldQuery};
use crate::session::GrappleSession;

/// Where the actor looks from and where the tether leaves the hand.
#[derive(Clone, Copy, Debug)]
pub struct AimRequest {
    pub eye: Point<Real>,
    pub look_dir: Vector<Real>,
    pub hand: Point<Real>,
}

/// Two-step aim: find what the eye is looking at, then fire the hand ray at that point so the
/// anchor lands under the reticle even though hand and eye are offset.
pub fn resolve_anchor<Q: WorldQuery + ?Sized>(
    query: &Q,
    config: &GrappleConfig,
    aim: AimRequest,
    exclude: &[ColliderId],
) -> Option<RayHit> {
    let options = QueryOptions::new(exclude, config.query_mask);
    let look_len = aim.look_dir.norm();
    if look_len <= 1.0e-6 {
        return None;
    }
    let look_dir = aim.look_dir / look_len;
    let target = query
        .cast_ray(aim.eye, look_dir, config.aim_probe_distance, &options)
        .map(|hit| hit.point)
        .unwrap_or_else(|| aim.eye + look_dir * config.aim_probe_distance);
    let to_target = target - aim.hand;
    let hand_dir = if to_target.norm() > 1.0e-3 {
        to_target.normalize()
    } else {
        look_dir
    };
    // Reach past the eye target slightly so a hit exactly on the surface still registers.
    let hit = query.cast_ray(aim.hand, hand_dir, config.max_range + 0.05, &options)?;
    if hit.distance > config.max_range {
        return None;
    }
    Some(hit)
}

#[derive(Clone, Copy, Debug)]
pub struct FireRequest {
    pub aim: AimRequest,
    /// Actor origin; the rope length is measured from here.
    pub position: Point<Real>,
    pub chest: Point<Real>,
}

/// Fires the grapple. A no-op (returning false) while a swing is active, with no charge left, or
/// when nothing is in range; charges are only spent on success.
pub fn try_fire<Q: WorldQuery + ?Sized, E: EventSink + ?Sized>(
    session: &mut GrappleSession,
    config: &GrappleConfig,
    query: &Q,
    request: FireRequest,
    exclude: &[ColliderId],
    events: &mut E,
) -> bool {
    if session.active || !session.charges.has_charge() {
        log::debug!(
            "grapple fire ignored (active={}, charges={})",
            session.active,
            session.charges.charges()
        );
        return false;
    }
    let hit = match resolve_anchor(query, config, request.aim, exclude) {
        Some(hit) => hit,
        None => {
            log::debug!("grapple fire found no anchor within {}", config.max_range);
            return false;
        }
    };
    if !session.charges.try_consume() {
        return false;
    }
    let rope_length = (request.position - hit.point).norm();
    session.attach(hit.point, hit.collider, rope_length, request.chest);
    log::debug!(
        "grapple attached at {:?} (rope {:.2}, charges left {})",
        hit.point,
        rope_length,
        session.charges.charges()
    );
    events.emit(GrappleEvent::Fired {
        muzzle: request.aim.hand,
        anchor: hit.point,
    });
    true
}
