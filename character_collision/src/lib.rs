//! Rapier KCC wrapper for the actor's collision-resolved move.
//!
//! Policy: collision must use Rapier KCC; do not reimplement sweep/slide logic.
//! The velocity carried out of a move is clipped against every contact normal the same way,
//! whether the surface is floor, wall or ceiling.
#![forbid(unsafe_code)]

use physics_rapier::PhysicsWorld;
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::math::{Isometry, Point, Translation, UnitVector, Vector};
use rapier3d::prelude::{Capsule, QueryFilter, Ray, Real};

const NORMAL_EPS: Real = 1.0e-6;
/// Clip passes over the contact set; a second pass settles corners formed by two normals.
const CLIP_PASSES: usize = 2;

#[derive(Clone, Copy, Debug)]
pub struct CollisionProfile {
    /// Capsule radius in meters.
    pub capsule_radius: Real,
    /// Capsule cylinder height in meters (distance between sphere centers).
    pub capsule_height: Real,
    /// Maximum step height for auto-stepping in meters. Ignored while swinging.
    pub step_height: Real,
    /// Minimum width of free space required after stepping.
    pub step_min_width: Real,
    /// Maximum climbable slope angle in radians.
    pub max_slope_angle: Real,
    /// Distance to snap to ground in meters. Ignored while swinging or rising.
    pub ground_snap_distance: Real,
    /// Small separation to preserve between character and environment.
    pub offset: Real,
    /// Small nudge applied along contact normals to prevent sticking.
    pub normal_nudge_factor: Real,
}

impl CollisionProfile {
    pub fn actor_default() -> Self {
        Self {
            capsule_radius: 0.4,
            capsule_height: 1.0,
            step_height: 0.45,
            step_min_width: 0.2,
            max_slope_angle: 45.0_f32.to_radians(),
            ground_snap_distance: 0.2,
            offset: 0.02,
            normal_nudge_factor: 1.0e-4,
        }
    }

    fn capsule(&self) -> Capsule {
        Capsule::new_y(self.capsule_height * 0.5, self.capsule_radius)
    }

    fn apply_to(&self, controller: &mut KinematicCharacterController) {
        controller.autostep = if self.step_height > 0.0 {
            Some(CharacterAutostep {
                max_height: CharacterLength::Absolute(self.step_height),
                min_width: CharacterLength::Absolute(self.step_min_width),
                include_dynamic_bodies: false,
            })
        } else {
            None
        };
        controller.max_slope_climb_angle = self.max_slope_angle;
        controller.min_slope_slide_angle = self.max_slope_angle;
        controller.snap_to_ground = if self.ground_snap_distance > 0.0 {
            Some(CharacterLength::Absolute(self.ground_snap_distance))
        } else {
            None
        };
        controller.offset = CharacterLength::Absolute(self.offset);
        controller.normal_nudge_factor = self.normal_nudge_factor;
    }
}

impl Default for CollisionProfile {
    fn default() -> Self {
        Self::actor_default()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CollisionMoveResult {
    pub position: Isometry<Real>,
    pub translation: Vector<Real>,
    /// Requested velocity with every into-surface component removed.
    pub velocity: Vector<Real>,
    pub grounded: bool,
    pub ground_normal: Option<Vector<Real>>,
    pub contacts: usize,
}

/// Removes the component of `velocity` pointing into each surface, leaving sliding motion intact.
pub fn clip_velocity(velocity: Vector<Real>, normals: &[Vector<Real>]) -> Vector<Real> {
    let mut clipped = velocity;
    for _ in 0..CLIP_PASSES {
        for normal in normals {
            let len = normal.norm();
            if len <= NORMAL_EPS {
                continue;
            }
            let normal = normal / len;
            let into = clipped.dot(&normal);
            if into < 0.0 {
                clipped -= normal * into;
            }
        }
    }
    clipped
}

pub struct CharacterCollision {
    profile: CollisionProfile,
    controller: KinematicCharacterController,
    capsule: Capsule,
}

impl CharacterCollision {
    fn world_up(world: &PhysicsWorld) -> Vector<Real> {
        if world.gravity.norm_squared() > 1.0e-6 {
            -world.gravity.normalize()
        } else {
            Vector::y()
        }
    }

    pub fn new(profile: CollisionProfile) -> Self {
        let capsule = profile.capsule();
        let mut controller = KinematicCharacterController::default();
        profile.apply_to(&mut controller);
        Self {
            profile,
            controller,
            capsule,
        }
    }

    /// Moves the capsule by `velocity * dt`. While `swinging`, autostep and ground snapping are
    /// off so the rope alone decides where the actor goes.
    pub fn move_character(
        &mut self,
        world: &PhysicsWorld,
        position: Isometry<Real>,
        velocity: Vector<Real>,
        swinging: bool,
        dt: Real,
    ) -> CollisionMoveResult {
        let dt = dt.max(0.0);
        let up_vec = Self::world_up(world);
        self.controller.up = UnitVector::new_normalize(up_vec);
        let rising = velocity.dot(&up_vec) > 0.0;

        let original_autostep = self.controller.autostep;
        let original_snap = self.controller.snap_to_ground;
        if swinging {
            self.controller.autostep = None;
        }
        if swinging || rising {
            self.controller.snap_to_ground = None;
        }

        let mut normals = Vec::new();
        let output = self.controller.move_shape(
            dt,
            world.bodies(),
            world.colliders(),
            world.query_pipeline(),
            &self.capsule,
            &position,
            velocity * dt,
            QueryFilter::default(),
            |collision| normals.push(collision.hit.normal1.into_inner()),
        );
        self.controller.autostep = original_autostep;
        self.controller.snap_to_ground = original_snap;

        let next_position = Translation::from(output.translation) * position;
        let mut ground_normal = None;
        if !rising {
            ground_normal = self.probe_ground(world, next_position, up_vec);
        }
        if let Some(normal) = ground_normal {
            normals.push(normal);
        }
        CollisionMoveResult {
            position: next_position,
            translation: output.translation,
            velocity: clip_velocity(velocity, &normals),
            grounded: ground_normal.is_some(),
            ground_normal,
            contacts: normals.len(),
        }
    }

    fn probe_ground(
        &self,
        world: &PhysicsWorld,
        position: Isometry<Real>,
        up: Vector<Real>,
    ) -> Option<Vector<Real>> {
        let snap_distance = self.profile.ground_snap_distance.max(0.0);
        if snap_distance <= 0.0 {
            return None;
        }
        // Use a smaller foot probe to stabilize grounding without wall bias.
        let foot_radius = self.profile.capsule_radius * 0.75;
        let foot_offset =
            -(self.profile.capsule_height * 0.5 + self.profile.capsule_radius) + foot_radius;
        let foot_center = position.translation.vector + up * foot_offset;
        let ray = Ray::new(Point::from(foot_center), -up);
        let max_toi = foot_radius + snap_distance + self.profile.offset + 1.0e-3;
        let (_, hit) = world.query_pipeline().cast_ray_and_get_normal(
            world.bodies(),
            world.colliders(),
            &ray,
            max_toi,
            false,
            QueryFilter::default(),
        )?;
        let up_dot = hit.normal.dot(&up);
        if up_dot < self.controller.max_slope_climb_angle.cos() {
            return None;
        }
        Some(hit.normal)
    }
}
