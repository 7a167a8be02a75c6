//! `WorldQuery` over the rapier-backed `PhysicsWorld`.

use physics_rapier::PhysicsWorld;
use rapier3d::math::{Isometry, Point, Vector};
use rapier3d::parry::shape::{SharedShape, Triangle};
use rapier3d::prelude::{Collider, ColliderHandle, Group, InteractionGroups, QueryFilter, Real};

use crate::query::{ColliderId, OverlapContact, ProbeShape, QueryOptions, RayHit, WorldQuery};

impl From<ColliderHandle> for ColliderId {
    fn from(handle: ColliderHandle) -> Self {
        let (index, generation) = handle.into_raw_parts();
        ColliderId((u64::from(generation) << 32) | u64::from(index))
    }
}

impl From<ColliderId> for ColliderHandle {
    fn from(id: ColliderId) -> Self {
        ColliderHandle::from_raw_parts(id.0 as u32, (id.0 >> 32) as u32)
    }
}

fn excluded(options: &QueryOptions<'_>, handle: ColliderHandle) -> bool {
    options.exclude.contains(&ColliderId::from(handle))
}

impl WorldQuery for PhysicsWorld {
    fn cast_ray(
        &self,
        origin: Point<Real>,
        dir: Vector<Real>,
        max_distance: Real,
        options: &QueryOptions<'_>,
    ) -> Option<RayHit> {
        let predicate = |handle: ColliderHandle, _: &Collider| !excluded(options, handle);
        let filter = QueryFilter::default()
            .groups(groups_for(options.mask))
            .predicate(&predicate);
        let hit = PhysicsWorld::cast_ray(self, origin, dir, max_distance, filter)?;
        Some(RayHit {
            point: hit.point,
            normal: hit.normal,
            collider: hit.collider.into(),
            distance: hit.distance,
        })
    }

    fn overlap(&self, shape: &ProbeShape, options: &QueryOptions<'_>) -> Vec<OverlapContact> {
        let predicate = |handle: ColliderHandle, _: &Collider| !excluded(options, handle);
        let filter = QueryFilter::default()
            .groups(groups_for(options.mask))
            .predicate(&predicate);
        let identity = Isometry::identity();
        let contacts = match shape {
            ProbeShape::Triangle([a, b, c]) => {
                let triangle = Triangle::new(*a, *b, *c);
                self.shape_contacts(&identity, &triangle, filter)
            }
            ProbeShape::Hull(points) => match SharedShape::convex_hull(points) {
                Some(hull) => self.shape_contacts(&identity, &*hull, filter),
                None => {
                    log::trace!("skipping degenerate hull of {} points", points.len());
                    Vec::new()
                }
            },
        };
        contacts
            .into_iter()
            .map(|contact| OverlapContact {
                collider: contact.collider.into(),
                point: contact.point,
            })
            .collect()
    }
}

fn groups_for(mask: u32) -> InteractionGroups {
    InteractionGroups::new(Group::ALL, Group::from_bits_truncate(mask))
}
