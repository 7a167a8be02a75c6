use grapple::{
    ActorState, ColliderId, GrappleConfig, GrappleEngine, GrappleEvent, GrappleInput,
    ReleaseReason, TickOutcome,
};
use physics_rapier::PhysicsWorld;
use rapier3d::prelude::*;

const DT: Real = 1.0 / 60.0;

/// Wall whose face sits at z = -20, directly ahead of an actor at the origin.
fn build_anchor_wall(world: &mut PhysicsWorld) -> ColliderId {
    let wall = ColliderBuilder::cuboid(10.0, 10.0, 0.25)
        .translation(vector![0.0, 0.0, -20.25])
        .build();
    world.insert_static_collider(wall).into()
}

fn scene() -> PhysicsWorld {
    let mut world = PhysicsWorld::new(vector![0.0, -9.81, 0.0]);
    build_anchor_wall(&mut world);
    world.step(DT);
    world
}

/// Free-flying test actor: moves by exactly the velocity the engine hands back.
struct Actor {
    position: Point<Real>,
    velocity: Vector<Real>,
    look_dir: Vector<Real>,
}

impl Actor {
    fn at_origin() -> Self {
        Self {
            position: Point::origin(),
            velocity: Vector::zeros(),
            look_dir: Vector::new(0.0, 0.0, -1.0),
        }
    }

    fn state(&self) -> ActorState {
        ActorState {
            position: self.position,
            velocity: self.velocity,
            grounded: false,
            eye: self.position,
            look_dir: self.look_dir,
            hand: self.position + Vector::new(0.3, -0.2, 0.0),
            chest: self.position,
            collider: None,
        }
    }

    fn tick(
        &mut self,
        engine: &mut GrappleEngine,
        world: &PhysicsWorld,
        input: GrappleInput,
        events: &mut Vec<GrappleEvent>,
    ) -> TickOutcome {
        let outcome = engine.tick(world, &self.state(), input, DT, events);
        self.velocity = outcome.velocity;
        self.position += self.velocity * DT;
        outcome
    }
}

fn held(fire: bool) -> GrappleInput {
    GrappleInput {
        equipped: true,
        fire,
        move_axis: [0.0, 0.0],
    }
}

fn distance_to_anchor(engine: &GrappleEngine, actor: &Actor) -> Real {
    let anchor = engine.session().anchor().expect("anchored");
    (actor.position - anchor).norm()
}

#[test]
fn scenario_a_free_swing_stays_on_rope_sphere() {
    let world = scene();
    let mut engine = GrappleEngine::new(GrappleConfig::default());
    let mut actor = Actor::at_origin();
    let mut events = Vec::new();

    let first = actor.tick(&mut engine, &world, held(true), &mut events);
    assert!(first.fired);
    assert!(engine.session().is_active());
    assert!((engine.session().rope_length() - 20.0).abs() < 0.1);

    let mut last_rope = engine.session().rope_length();
    for _ in 0..60 {
        actor.tick(&mut engine, &world, held(false), &mut events);
        let rope = engine.session().rope_length();
        assert!(engine.session().is_active());
        assert!(distance_to_anchor(&engine, &actor) <= rope + 1.0e-3);
        assert!(rope <= last_rope + 1.0e-6);
        last_rope = rope;
    }
    let rope = engine.session().rope_length();
    assert!((distance_to_anchor(&engine, &actor) - rope).abs() < 0.05);
    assert!(actor.position.y < -1.0);
}

#[test]
fn scenario_b_spanning_wall_cuts_rope_within_one_interval() {
    let mut world = scene();
    let config = GrappleConfig::default();
    let mut engine = GrappleEngine::new(config);
    let mut actor = Actor::at_origin();
    let mut events = Vec::new();

    actor.tick(&mut engine, &world, held(true), &mut events);
    assert!(engine.session().is_active());
    let slab = ColliderBuilder::cuboid(3.0, 3.0, 0.05)
        .translation(vector![0.0, 0.0, -10.0])
        .build();
    world.insert_static_collider(slab);

    let mut released = None;
    for _ in 0..config.obstruction_interval_ticks {
        let outcome = actor.tick(&mut engine, &world, held(false), &mut events);
        if let Some(release) = outcome.released {
            released = Some(release);
            break;
        }
    }
    let release = released.expect("rope cut");
    assert_eq!(release.reason, ReleaseReason::Obstructed);
    assert!(!release.boosted);
    assert!(!engine.session().is_active());
    assert!(events.iter().any(|event| matches!(
        event,
        GrappleEvent::Released {
            reason: ReleaseReason::Obstructed,
            ..
        }
    )));
}

#[test]
fn scenario_c_half_covering_wall_keeps_rope() {
    let mut world = scene();
    let config = GrappleConfig::default();
    let mut engine = GrappleEngine::new(config);
    let mut actor = Actor::at_origin();
    let mut events = Vec::new();

    actor.tick(&mut engine, &world, held(true), &mut events);
    // The actor falls as it starts to swing, so the split plane follows -y and its left
    // half lies toward -x. This slab covers the rope line and that half only.
    let slab = ColliderBuilder::cuboid(1.5, 3.0, 0.05)
        .translation(vector![-1.45, 0.0, -10.0])
        .build();
    world.insert_static_collider(slab);

    for _ in 0..config.obstruction_interval_ticks * 3 {
        let outcome = actor.tick(&mut engine, &world, held(false), &mut events);
        assert!(outcome.released.is_none());
    }
    let replicated = engine.replicated();
    assert!(replicated.active);
    assert!(replicated.blocked_left);
    assert!(!replicated.blocked_right);
    assert!(replicated.near_obstruction);
}

#[test]
fn scenario_d_charge_recharges_after_interval() {
    let world = scene();
    let config = GrappleConfig::default();
    let mut engine = GrappleEngine::new(config);
    let mut actor = Actor::at_origin();
    let mut events = Vec::new();

    actor.tick(&mut engine, &world, held(true), &mut events);
    actor.tick(&mut engine, &world, held(false), &mut events);
    actor.tick(&mut engine, &world, held(true), &mut events);
    assert!(!engine.session().is_active());
    assert_eq!(engine.session().charges().charges(), 1);

    actor = Actor::at_origin();
    actor.tick(&mut engine, &world, held(false), &mut events);
    let fired = actor.tick(&mut engine, &world, held(true), &mut events);
    assert!(fired.fired);
    assert_eq!(engine.session().charges().charges(), 0);
    assert!(engine.session().charges().is_recharging());

    let ticks = (config.recharge_interval / DT).ceil() as usize;
    for _ in 0..ticks {
        actor.tick(&mut engine, &world, held(false), &mut events);
    }
    assert_eq!(engine.session().charges().charges(), 1);
}

#[test]
fn scenario_e_voluntary_fast_release_boosts() {
    let world = scene();
    let config = GrappleConfig::default();
    let mut engine = GrappleEngine::new(config);
    let mut events = Vec::new();

    let mut state = Actor::at_origin().state();
    engine.tick(&world, &state, held(true), DT, &mut events);
    engine.tick(&world, &state, held(false), DT, &mut events);

    state.velocity = Vector::new(40.0, 0.0, 0.0);
    let outcome = engine.tick(&world, &state, held(true), DT, &mut events);
    let release = outcome.released.expect("released");
    assert_eq!(release.reason, ReleaseReason::Voluntary);
    assert!(release.boosted);

    let exit = outcome.velocity;
    let horizontal = (exit.x * exit.x + exit.z * exit.z).sqrt();
    let pitch = exit.y.atan2(horizontal);
    assert!(pitch > 0.0);
    assert!(pitch <= config.boost_max_up_angle + 1.0e-4);
    let gain = exit.norm() - 40.0;
    assert!(gain >= config.boost_min - 1.0e-3 && gain <= config.boost_max + 1.0e-3);
    assert!(matches!(
        events.last(),
        Some(GrappleEvent::Released { boosted: true, .. })
    ));
    assert_eq!(engine.session().boost_cooldown(), config.boost_cooldown);
}

#[test]
fn steering_swing_keeps_tether_and_ratchet() {
    let world = scene();
    let mut engine = GrappleEngine::new(GrappleConfig::default());
    let mut actor = Actor::at_origin();
    actor.velocity = Vector::new(6.0, 0.0, 0.0);
    let mut events = Vec::new();

    actor.tick(&mut engine, &world, held(true), &mut events);
    let mut last_rope = engine.session().rope_length();
    for i in 0..300 {
        let input = GrappleInput {
            equipped: true,
            fire: false,
            move_axis: [if i < 150 { 1.0 } else { -0.5 }, 1.0],
        };
        let outcome = actor.tick(&mut engine, &world, input, &mut events);
        if outcome.released.is_some() {
            break;
        }
        let rope = engine.session().rope_length();
        assert!(distance_to_anchor(&engine, &actor) <= rope + 1.0e-3);
        assert!(rope <= last_rope + 1.0e-6);
        assert!(rope > 0.0);
        last_rope = rope;
    }
}

#[test]
fn hanging_under_ceiling_never_reels_past_minimum() {
    let mut world = PhysicsWorld::new(vector![0.0, -9.81, 0.0]);
    let ceiling = ColliderBuilder::cuboid(10.0, 0.25, 10.0)
        .translation(vector![0.0, 10.25, 0.0])
        .build();
    world.insert_static_collider(ceiling);
    world.step(DT);

    let config = GrappleConfig::default();
    let mut engine = GrappleEngine::new(config);
    let mut actor = Actor::at_origin();
    actor.look_dir = Vector::y();
    let mut events = Vec::new();

    let fired = actor.tick(&mut engine, &world, held(true), &mut events);
    assert!(fired.fired);
    for _ in 0..1800 {
        let outcome = actor.tick(&mut engine, &world, held(false), &mut events);
        assert!(outcome.released.is_none());
        let rope = engine.session().rope_length();
        assert!(rope >= config.min_rope_length - 1.0e-4);
        assert!(distance_to_anchor(&engine, &actor) <= rope + 1.0e-3);
    }
    assert!((engine.session().rope_length() - config.min_rope_length).abs() < 1.0e-3);
}

#[test]
fn firing_at_empty_sky_spends_nothing() {
    let world = PhysicsWorld::new(vector![0.0, -9.81, 0.0]);
    let config = GrappleConfig::default();
    let mut engine = GrappleEngine::new(config);
    let mut actor = Actor::at_origin();
    let mut events = Vec::new();

    let outcome = actor.tick(&mut engine, &world, held(true), &mut events);
    assert!(!outcome.fired);
    assert!(!engine.session().is_active());
    assert_eq!(engine.session().charges().charges(), config.max_charges);
    assert!(events.is_empty());
}
