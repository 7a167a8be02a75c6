//! Player controller composition (input + aim + grapple + collision).
#![forbid(unsafe_code)]

use character_collision::{CharacterCollision, CollisionMoveResult, CollisionProfile};
use grapple::{ActorState, EventSink, GrappleConfig, GrappleEngine, GrappleInput, TickOutcome};
use physics_rapier::PhysicsWorld;
use player_camera::{AimPose, AimRig};
use rapier3d::math::{Isometry, Point, Vector};
use rapier3d::prelude::Real;

#[derive(Clone, Copy, Debug, Default)]
pub struct RawInput {
    pub move_x: Real,
    pub move_y: Real,
    pub fire: bool,
    pub equipped: bool,
    pub look_delta: [Real; 2],
}

#[derive(Clone, Copy, Debug, Default)]
pub struct InputIntent {
    pub move_axis: [Real; 2],
    pub fire: bool,
    pub equipped: bool,
    pub look_delta: [Real; 2],
}

pub trait InputAdapter {
    fn intent(&mut self, raw: RawInput) -> InputIntent;
}

#[derive(Default)]
pub struct DirectInputAdapter;

impl DirectInputAdapter {
    fn normalize_axis(axis: [Real; 2]) -> [Real; 2] {
        let len = (axis[0] * axis[0] + axis[1] * axis[1]).sqrt();
        if len > 1.0 {
            [axis[0] / len, axis[1] / len]
        } else {
            axis
        }
    }
}

impl InputAdapter for DirectInputAdapter {
    fn intent(&mut self, raw: RawInput) -> InputIntent {
        InputIntent {
            move_axis: Self::normalize_axis([raw.move_x, raw.move_y]),
            fire: raw.fire,
            equipped: raw.equipped,
            look_delta: raw.look_delta,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PlayerKinematics {
    pub position: Isometry<Real>,
    pub velocity: Vector<Real>,
    pub grounded: bool,
    pub ground_normal: Option<Vector<Real>>,
}

impl PlayerKinematics {
    pub fn new(position: Isometry<Real>) -> Self {
        Self {
            position,
            velocity: Vector::zeros(),
            grounded: false,
            ground_normal: None,
        }
    }

    pub fn origin(&self) -> Point<Real> {
        Point::from(self.position.translation.vector)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MotorContext {
    pub dt: Real,
    pub gravity: Vector<Real>,
}

/// Locomotion used while no swing is active.
pub trait Motor {
    fn step(&mut self, input: &InputIntent, state: &PlayerKinematics, ctx: MotorContext)
        -> Vector<Real>;
}

/// Gravity only; ground contact is left to the collision move.
#[derive(Clone, Copy, Debug, Default)]
pub struct BallisticMotor;

impl Motor for BallisticMotor {
    fn step(
        &mut self,
        _input: &InputIntent,
        state: &PlayerKinematics,
        ctx: MotorContext,
    ) -> Vector<Real> {
        state.velocity + ctx.gravity * ctx.dt
    }
}

#[derive(Clone, Debug)]
pub struct PlayerFrame {
    pub kinematics: PlayerKinematics,
    pub collision: CollisionMoveResult,
    pub aim: AimPose,
    pub grapple: TickOutcome,
}

pub struct PlayerController<A: InputAdapter, M: Motor> {
    input: A,
    motor: M,
    collision: CharacterCollision,
    aim: AimRig,
    grapple: GrappleEngine,
    state: PlayerKinematics,
}

impl<A: InputAdapter, M: Motor> PlayerController<A, M> {
    pub fn new(
        input: A,
        motor: M,
        profile: CollisionProfile,
        aim: AimRig,
        config: GrappleConfig,
        position: Isometry<Real>,
    ) -> Self {
        Self {
            input,
            motor,
            collision: CharacterCollision::new(profile),
            aim,
            grapple: GrappleEngine::new(config),
            state: PlayerKinematics::new(position),
        }
    }

    pub fn state(&self) -> &PlayerKinematics {
        &self.state
    }

    pub fn aim(&self) -> &AimRig {
        &self.aim
    }

    pub fn grapple(&self) -> &GrappleEngine {
        &self.grapple
    }

    /// Death or respawn: put the actor at `position` at rest and reset the grapple.
    pub fn respawn(&mut self, position: Isometry<Real>) {
        self.state = PlayerKinematics::new(position);
        self.grapple.hard_reset();
    }

    pub fn tick<E: EventSink + ?Sized>(
        &mut self,
        world: &PhysicsWorld,
        raw: RawInput,
        dt: Real,
        events: &mut E,
    ) -> PlayerFrame {
        let intent = self.input.intent(raw);
        self.aim.apply_look_delta(intent.look_delta);
        let pose = self.aim.pose(self.state.origin());
        let actor = ActorState {
            position: self.state.origin(),
            velocity: self.state.velocity,
            grounded: self.state.grounded,
            eye: pose.eye,
            look_dir: pose.look_dir,
            hand: pose.hand,
            chest: pose.chest,
            collider: None,
        };
        let grapple = self.grapple.tick(
            world,
            &actor,
            GrappleInput {
                equipped: intent.equipped,
                fire: intent.fire,
                move_axis: intent.move_axis,
            },
            dt,
            events,
        );

        let velocity = if grapple.active || grapple.released.is_some() {
            grapple.velocity
        } else {
            self.motor.step(
                &intent,
                &self.state,
                MotorContext {
                    dt,
                    gravity: world.gravity,
                },
            )
        };
        let collision = self.collision.move_character(
            world,
            self.state.position,
            velocity,
            grapple.active,
            dt,
        );
        self.state.position = collision.position;
        self.state.velocity = collision.velocity;
        self.state.grounded = collision.grounded;
        self.state.ground_normal = collision.ground_normal;
        PlayerFrame {
            kinematics: self.state.clone(),
            collision,
            aim: self.aim.pose(self.state.origin()),
            grapple,
        }
    }
}
