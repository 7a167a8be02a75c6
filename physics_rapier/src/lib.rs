//! Rapier world ownership and the raw scene queries built on it.
#![forbid(unsafe_code)]

use rapier3d::parry::query;
use rapier3d::prelude::*;

/// Nearest surface hit along a ray.
#[derive(Clone, Copy, Debug)]
pub struct WorldRayHit {
    pub collider: ColliderHandle,
    pub point: Point<Real>,
    pub normal: Vector<Real>,
    pub distance: Real,
}

/// A collider touched by a probe shape, with a point on the collider's surface.
#[derive(Clone, Copy, Debug)]
pub struct WorldShapeContact {
    pub collider: ColliderHandle,
    pub point: Point<Real>,
}

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    pub fn new(gravity: Vector<Real>) -> Self {
        Self {
            gravity,
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    pub fn bodies(&self) -> &RigidBodySet {
        &self.bodies
    }

    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    pub fn query_pipeline(&self) -> &QueryPipeline {
        &self.query_pipeline
    }

    pub fn step(&mut self, dt: Real) {
        self.integration_parameters.dt = dt;
        let physics_hooks = ();
        let event_handler = ();
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &physics_hooks,
            &event_handler,
        );
        self.query_pipeline.update(&self.colliders);
    }

    /// Inserts a static collider and refreshes the query pipeline so it is visible immediately.
    pub fn insert_static_collider(&mut self, collider: Collider) -> ColliderHandle {
        let handle = self.colliders.insert(collider);
        self.query_pipeline.update(&self.colliders);
        handle
    }

    pub fn cast_ray(
        &self,
        origin: Point<Real>,
        dir: Vector<Real>,
        max_distance: Real,
        filter: QueryFilter,
    ) -> Option<WorldRayHit> {
        let dir_len = dir.norm();
        if dir_len <= 1.0e-6 || max_distance <= 0.0 {
            return None;
        }
        let ray = Ray::new(origin, dir / dir_len);
        let (collider, hit) = self.query_pipeline.cast_ray_and_get_normal(
            &self.bodies,
            &self.colliders,
            &ray,
            max_distance,
            true,
            filter,
        )?;
        Some(WorldRayHit {
            collider,
            point: ray.point_at(hit.time_of_impact),
            normal: hit.normal,
            distance: hit.time_of_impact,
        })
    }

    /// Every collider intersecting `shape` placed at `shape_pos`.
    pub fn shape_contacts(
        &self,
        shape_pos: &Isometry<Real>,
        shape: &dyn Shape,
        filter: QueryFilter,
    ) -> Vec<WorldShapeContact> {
        let mut hits = Vec::new();
        self.query_pipeline.intersections_with_shape(
            &self.bodies,
            &self.colliders,
            shape_pos,
            shape,
            filter,
            |handle| {
                hits.push(handle);
                true
            },
        );
        hits.into_iter()
            .filter_map(|handle| {
                let collider = self.colliders.get(handle)?;
                let point = match query::contact(
                    shape_pos,
                    shape,
                    collider.position(),
                    collider.shape(),
                    0.0,
                ) {
                    Ok(Some(contact)) => contact.point2,
                    _ => Point::from(*collider.translation()),
                };
                Some(WorldShapeContact {
                    collider: handle,
                    point,
                })
            })
            .collect()
    }
}
