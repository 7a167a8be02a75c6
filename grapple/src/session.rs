//! Per-actor grapple state. Mutated only through the engine's component operations.

use rapier3d::math::{Point, Vector};
use rapier3d::prelude::Real;
use serde::{Deserialize, Serialize};

use crate::charges::ChargePool;
use crate::config::GrappleConfig;
use crate::query::ColliderId;

/// Scratch and result state of the latest obstruction check.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstructionState {
    pub swing_normal: Vector<Real>,
    pub blocked_left: bool,
    pub blocked_right: bool,
    /// Rope passes an obstacle but a go-around path keeps it intact.
    pub near_obstruction: bool,
    pub last_check_chest: Option<Point<Real>>,
    /// Consecutive checks tolerated as a bend around an edge.
    pub bend_checks: u32,
}

impl Default for ObstructionState {
    fn default() -> Self {
        Self {
            swing_normal: Vector::x(),
            blocked_left: false,
            blocked_right: false,
            near_obstruction: false,
            last_check_chest: None,
            bend_checks: 0,
        }
    }
}

impl ObstructionState {
    pub(crate) fn clear_flags(&mut self) {
        self.blocked_left = false;
        self.blocked_right = false;
        self.near_obstruction = false;
        self.bend_checks = 0;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrappleSession {
    pub(crate) active: bool,
    pub(crate) anchor: Option<Point<Real>>,
    pub(crate) anchor_collider: Option<ColliderId>,
    pub(crate) rope_length: Real,
    pub(crate) charges: ChargePool,
    pub(crate) low_momentum_timer: Real,
    pub(crate) fresh: bool,
    /// Seconds until the exit boost is available again; counts down each tick.
    pub(crate) boost_cooldown: Real,
    pub(crate) obstruction: ObstructionState,
}

/// Minimal authoritative state observers need to rebuild the visual rope.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplicatedGrapple {
    pub active: bool,
    pub anchor: Option<Point<Real>>,
    pub blocked_left: bool,
    pub blocked_right: bool,
    pub near_obstruction: bool,
}

impl GrappleSession {
    pub fn new(config: &GrappleConfig) -> Self {
        Self {
            active: false,
            anchor: None,
            anchor_collider: None,
            rope_length: 0.0,
            charges: ChargePool::full(config.max_charges, config.recharge_interval),
            low_momentum_timer: 0.0,
            fresh: false,
            boost_cooldown: 0.0,
            obstruction: ObstructionState::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn anchor(&self) -> Option<Point<Real>> {
        self.anchor
    }

    pub fn anchor_collider(&self) -> Option<ColliderId> {
        self.anchor_collider
    }

    pub fn rope_length(&self) -> Real {
        self.rope_length
    }

    pub fn charges(&self) -> &ChargePool {
        &self.charges
    }

    pub fn obstruction(&self) -> &ObstructionState {
        &self.obstruction
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn boost_cooldown(&self) -> Real {
        self.boost_cooldown
    }

    pub fn replicated(&self) -> ReplicatedGrapple {
        ReplicatedGrapple {
            active: self.active,
            anchor: self.anchor,
            blocked_left: self.obstruction.blocked_left,
            blocked_right: self.obstruction.blocked_right,
            near_obstruction: self.obstruction.near_obstruction,
        }
    }

    pub(crate) fn attach(
        &mut self,
        anchor: Point<Real>,
        collider: ColliderId,
        rope_length: Real,
        chest: Point<Real>,
    ) {
        self.active = true;
        self.anchor = Some(anchor);
        self.anchor_collider = Some(collider);
        self.rope_length = rope_length;
        self.fresh = true;
        self.low_momentum_timer = 0.0;
        self.obstruction = ObstructionState {
            last_check_chest: Some(chest),
            ..ObstructionState::default()
        };
    }

    pub(crate) fn tick_cooldowns(&mut self, dt: Real) {
        self.boost_cooldown = (self.boost_cooldown - dt).max(0.0);
    }

    pub(crate) fn detach(&mut self) {
        self.active = false;
        self.anchor = None;
        self.anchor_collider = None;
        self.rope_length = 0.0;
        self.fresh = false;
        self.low_momentum_timer = 0.0;
        self.obstruction.clear_flags();
        self.obstruction.last_check_chest = None;
    }

    /// Death/respawn: drops the swing and restores charge and cooldown defaults.
    pub(crate) fn hard_reset(&mut self, config: &GrappleConfig) {
        *self = Self::new(config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_idle_with_full_charges() {
        let config = GrappleConfig::default();
        let session = GrappleSession::new(&config);
        assert!(!session.is_active());
        assert!(session.anchor().is_none());
        assert_eq!(session.rope_length(), 0.0);
        assert_eq!(session.charges().charges(), config.max_charges);
    }

    #[test]
    fn detach_restores_idle_invariant() {
        let config = GrappleConfig::default();
        let mut session = GrappleSession::new(&config);
        session.attach(
            Point::new(0.0, 0.0, -20.0),
            ColliderId(1),
            20.0,
            Point::origin(),
        );
        assert!(session.is_active());
        assert!(session.is_fresh());
        session.detach();
        assert!(!session.is_active());
        assert!(session.anchor().is_none());
        assert!(session.anchor_collider().is_none());
        assert_eq!(session.rope_length(), 0.0);
    }

    #[test]
    fn session_serializes_to_toml() {
        let config = GrappleConfig::default();
        let mut session = GrappleSession::new(&config);
        session.attach(Point::new(1.0, 2.0, 3.0), ColliderId(9), 4.0, Point::origin());
        let text = toml::to_string(&session.replicated()).expect("serialize");
        let back: ReplicatedGrapple = toml::from_str(&text).expect("deserialize");
        assert_eq!(back, session.replicated());
    }
}
