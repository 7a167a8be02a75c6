//! Per-actor grapple engine: one authoritative instance per actor, ticked at the physics rate.

use rapier3d::math::{Point, Vector};
use rapier3d::prelude::Real;

use crate::acquisition::{try_fire, AimRequest, FireRequest};
use crate::config::GrappleConfig;
use crate::events::{EventSink, GrappleEvent};
use crate::integrator::{integrate_swing, SwingContext};
use crate::obstruction::{check_rope, ObstructionVerdict, RopeProbe};
use crate::query::{ColliderId, WorldQuery};
use crate::release::{release, ReleaseOutcome, ReleaseReason};
use crate::session::{GrappleSession, ReplicatedGrapple};

/// What the engine reads from the actor each tick.
#[derive(Clone, Copy, Debug)]
pub struct ActorState {
    pub position: Point<Real>,
    pub velocity: Vector<Real>,
    pub grounded: bool,
    pub eye: Point<Real>,
    pub look_dir: Vector<Real>,
    pub hand: Point<Real>,
    pub chest: Point<Real>,
    /// The actor's own collider, if it has one in the query world.
    pub collider: Option<ColliderId>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GrappleInput {
    /// The grapple tool is selected; the engine only runs while this holds.
    pub equipped: bool,
    /// Level-triggered fire button; the engine edge-detects it.
    pub fire: bool,
    /// `[right, forward]` in `[-1, 1]`.
    pub move_axis: [Real; 2],
}

#[derive(Clone, Copy, Debug)]
pub struct TickOutcome {
    /// Velocity to hand to the actor's collision-resolved move.
    pub velocity: Vector<Real>,
    pub active: bool,
    pub fired: bool,
    pub released: Option<ReleaseOutcome>,
    pub obstruction: Option<ObstructionVerdict>,
}

impl TickOutcome {
    fn passthrough(velocity: Vector<Real>, active: bool) -> Self {
        Self {
            velocity,
            active,
            fired: false,
            released: None,
            obstruction: None,
        }
    }
}

pub struct GrappleEngine {
    config: GrappleConfig,
    session: GrappleSession,
    fire_held: bool,
    active_ticks: u64,
}

impl GrappleEngine {
    pub fn new(config: GrappleConfig) -> Self {
        Self {
            session: GrappleSession::new(&config),
            config,
            fire_held: false,
            active_ticks: 0,
        }
    }

    pub fn config(&self) -> &GrappleConfig {
        &self.config
    }

    pub fn session(&self) -> &GrappleSession {
        &self.session
    }

    pub fn replicated(&self) -> ReplicatedGrapple {
        self.session.replicated()
    }

    /// Death or respawn: drop the swing and restore charges and cooldowns.
    pub fn hard_reset(&mut self) {
        self.session.hard_reset(&self.config);
        self.fire_held = false;
        self.active_ticks = 0;
    }

    /// Ends the swing for `reason`. No-op while idle.
    pub fn release<E: EventSink + ?Sized>(
        &mut self,
        position: Point<Real>,
        velocity: Vector<Real>,
        reason: ReleaseReason,
        events: &mut E,
    ) -> Option<ReleaseOutcome> {
        let outcome = release(&mut self.session, &self.config, position, velocity, reason)?;
        self.active_ticks = 0;
        events.emit(GrappleEvent::Released {
            point: outcome.point,
            boosted: outcome.boosted,
            reason: outcome.reason,
        });
        Some(outcome)
    }

    pub fn tick<Q: WorldQuery + ?Sized, E: EventSink + ?Sized>(
        &mut self,
        query: &Q,
        actor: &ActorState,
        input: GrappleInput,
        dt: Real,
        events: &mut E,
    ) -> TickOutcome {
        let dt = dt.max(0.0);
        self.session.tick_cooldowns(dt);
        let restored = self.session.charges.tick(dt);
        if restored > 0 {
            log::debug!(
                "grapple recharged to {}/{}",
                self.session.charges.charges(),
                self.session.charges.max_charges()
            );
        }

        let pressed = input.fire && !self.fire_held;
        self.fire_held = input.fire;

        if !input.equipped {
            let released = self.release(
                actor.position,
                actor.velocity,
                ReleaseReason::Unequipped,
                events,
            );
            return self.finish_release(actor.velocity, released);
        }

        let mut fired = false;
        if pressed {
            if self.session.active {
                let released = self.release(
                    actor.position,
                    actor.velocity,
                    ReleaseReason::Voluntary,
                    events,
                );
                return self.finish_release(actor.velocity, released);
            }
            let request = FireRequest {
                aim: AimRequest {
                    eye: actor.eye,
                    look_dir: actor.look_dir,
                    hand: actor.hand,
                },
                position: actor.position,
                chest: actor.chest,
            };
            let exclude: Vec<ColliderId> = actor.collider.into_iter().collect();
            fired = try_fire(
                &mut self.session,
                &self.config,
                query,
                request,
                &exclude,
                events,
            );
            if fired {
                self.active_ticks = 0;
            }
        }

        let anchor = match (self.session.active, self.session.anchor) {
            (true, Some(anchor)) => anchor,
            _ => return TickOutcome::passthrough(actor.velocity, false),
        };

        let distance = (actor.position - anchor).norm();
        if !distance.is_finite() || distance > self.config.safety_distance() {
            log::warn!(
                "grapple distance {:.2} beyond safety limit {:.2}; releasing",
                distance,
                self.config.safety_distance()
            );
            let released = self.release(
                actor.position,
                actor.velocity,
                ReleaseReason::DistanceSafety,
                events,
            );
            return self.finish_release(actor.velocity, released);
        }

        let step = integrate_swing(
            &mut self.session,
            &self.config,
            SwingContext {
                position: actor.position,
                velocity: actor.velocity,
                grounded: actor.grounded,
                move_axis: input.move_axis,
                dt,
            },
        );

        self.active_ticks += 1;
        let interval = u64::from(self.config.obstruction_interval_ticks.max(1));
        let mut obstruction = None;
        if self.active_ticks % interval == 0 {
            let mut exclude: Vec<ColliderId> = actor.collider.into_iter().collect();
            exclude.extend(self.session.anchor_collider);
            let verdict = check_rope(
                query,
                &self.config,
                &mut self.session.obstruction,
                RopeProbe {
                    chest: actor.chest,
                    anchor,
                    velocity: step.velocity,
                },
                &exclude,
            );
            obstruction = Some(verdict);
            if verdict.cuts_rope() {
                let released = self.release(
                    actor.position,
                    step.velocity,
                    ReleaseReason::Obstructed,
                    events,
                );
                let mut outcome = self.finish_release(step.velocity, released);
                outcome.obstruction = obstruction;
                outcome.fired = fired;
                return outcome;
            }
        }

        TickOutcome {
            velocity: step.velocity,
            active: true,
            fired,
            released: None,
            obstruction,
        }
    }

    fn finish_release(
        &self,
        velocity: Vector<Real>,
        released: Option<ReleaseOutcome>,
    ) -> TickOutcome {
        TickOutcome {
            velocity: released.map_or(velocity, |outcome| outcome.velocity),
            active: self.session.active,
            fired: false,
            released,
            obstruction: None,
        }
    }
}
