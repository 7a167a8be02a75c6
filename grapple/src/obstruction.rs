//! Decides whether the rope to the anchor is still viable.
//!
//! A contact on the chest-anchor line (or in the triangle the rope swept since the last check)
//! only cuts the rope when both halves of the split capsule shell are blocked by that obstacle.

use rapier3d::math::{Point, Vector};
use rapier3d::prelude::Real;

use crate::config::GrappleConfig;
use crate::query::{ColliderId, OverlapContact, QueryOptions, WorldQuery};
use crate::session::ObstructionState;
use crate::shapes::{
    half_capsule_shell, rope_frame, swept_triangle, RopeFrame, ShellParams, ShellSide,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ObstructionVerdict {
    Clear,
    /// Something touches the rope but at least one side offers a way around it.
    GoAround {
        blocked_left: bool,
        blocked_right: bool,
    },
    /// Both sides blocked, tolerated as the rope bending around an edge.
    Bent { deflection: Real },
    Cut,
}

impl ObstructionVerdict {
    pub fn cuts_rope(&self) -> bool {
        matches!(self, ObstructionVerdict::Cut)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RopeProbe {
    pub chest: Point<Real>,
    pub anchor: Point<Real>,
    pub velocity: Vector<Real>,
}

#[derive(Clone, Copy, Debug)]
struct RopeContact {
    collider: ColliderId,
    point: Point<Real>,
    /// Found on the straight chest-anchor line rather than only in the swept triangle.
    direct: bool,
}

pub fn check_rope<Q: WorldQuery + ?Sized>(
    query: &Q,
    config: &GrappleConfig,
    state: &mut ObstructionState,
    probe: RopeProbe,
    exclude: &[ColliderId],
) -> ObstructionVerdict {
    let options = QueryOptions::new(exclude, config.query_mask);
    let previous = state.last_check_chest.replace(probe.chest);
    let contact = match find_rope_contact(query, &options, probe, previous) {
        Some(contact) => contact,
        None => {
            state.clear_flags();
            return ObstructionVerdict::Clear;
        }
    };

    let frame = rope_frame(probe.chest, probe.anchor, probe.velocity);
    state.swing_normal = frame.normal;
    let params = ShellParams::from_config(config);
    let blocked_left =
        side_blocked(query, &options, &frame, ShellSide::Left, &params, contact, config);
    let blocked_right =
        side_blocked(query, &options, &frame, ShellSide::Right, &params, contact, config);
    state.blocked_left = blocked_left;
    state.blocked_right = blocked_right;

    if !(blocked_left && blocked_right) {
        state.near_obstruction = true;
        state.bend_checks = 0;
        log::trace!(
            "rope passes obstacle; blocked left={} right={}",
            blocked_left,
            blocked_right
        );
        return ObstructionVerdict::GoAround {
            blocked_left,
            blocked_right,
        };
    }

    if !contact.direct {
        let deflection = angle_between(probe.anchor - probe.chest, contact.point - probe.chest);
        if deflection <= config.bend_tolerance && state.bend_checks < config.bend_grace_checks {
            state.bend_checks += 1;
            state.near_obstruction = true;
            log::trace!(
                "rope bends {:.3} rad around edge ({} checks)",
                deflection,
                state.bend_checks
            );
            return ObstructionVerdict::Bent { deflection };
        }
    }
    state.near_obstruction = false;
    ObstructionVerdict::Cut
}

fn find_rope_contact<Q: WorldQuery + ?Sized>(
    query: &Q,
    options: &QueryOptions<'_>,
    probe: RopeProbe,
    previous: Option<Point<Real>>,
) -> Option<RopeContact> {
    let span = probe.anchor - probe.chest;
    let length = span.norm();
    if length <= 1.0e-3 {
        return None;
    }
    let dir = span / length;
    let forward = query.cast_ray(probe.chest, dir, length, options);
    // Reverse pass catches surfaces only solid from the anchor side.
    let line_hit = forward.or_else(|| query.cast_ray(probe.anchor, -dir, length, options));
    if let Some(hit) = line_hit {
        return Some(RopeContact {
            collider: hit.collider,
            point: hit.point,
            direct: true,
        });
    }

    let triangle = swept_triangle(previous?, probe.chest, probe.anchor)?;
    query
        .overlap(&triangle, options)
        .into_iter()
        .min_by(|a, b| {
            let da = distance_to_line(a.point, probe.chest, probe.anchor);
            let db = distance_to_line(b.point, probe.chest, probe.anchor);
            da.total_cmp(&db)
        })
        .map(|contact| RopeContact {
            collider: contact.collider,
            point: contact.point,
            direct: false,
        })
}

fn side_blocked<Q: WorldQuery + ?Sized>(
    query: &Q,
    options: &QueryOptions<'_>,
    frame: &RopeFrame,
    side: ShellSide,
    params: &ShellParams,
    contact: RopeContact,
    config: &GrappleConfig,
) -> bool {
    let same_obstacle = |hit: &OverlapContact| {
        hit.collider == contact.collider
            || (hit.point - contact.point).norm() <= config.same_obstacle_radius
    };
    half_capsule_shell(frame, side, params)
        .iter()
        .any(|piece| query.overlap(piece, options).iter().any(&same_obstacle))
}

fn distance_to_line(point: Point<Real>, a: Point<Real>, b: Point<Real>) -> Real {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= 1.0e-8 {
        return (point - a).norm();
    }
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (point - (a + ab * t)).norm()
}

fn angle_between(a: Vector<Real>, b: Vector<Real>) -> Real {
    let denom = a.norm() * b.norm();
    if denom <= 1.0e-8 {
        return 0.0;
    }
    (a.dot(&b) / denom).clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ProbeShape, RayHit};

    const WALL: ColliderId = ColliderId(10);
    const FAR: ColliderId = ColliderId(20);

    /// Rope along -z from the origin; a slab at z = -10 whose x extent decides what it blocks.
    struct SlabWorld {
        slab_min_x: Real,
        slab_max_x: Real,
        line_hit: bool,
        stray: Option<Point<Real>>,
    }

    impl SlabWorld {
        fn touches(&self, points: &[Point<Real>]) -> bool {
            let min_z = points.iter().map(|p| p.z).fold(Real::MAX, Real::min);
            let max_z = points.iter().map(|p| p.z).fold(Real::MIN, Real::max);
            let min_x = points.iter().map(|p| p.x).fold(Real::MAX, Real::min);
            let max_x = points.iter().map(|p| p.x).fold(Real::MIN, Real::max);
            min_z <= -10.0 && max_z >= -10.0 && max_x >= self.slab_min_x && min_x <= self.slab_max_x
        }
    }

    impl WorldQuery for SlabWorld {
        fn cast_ray(
            &self,
            origin: Point<Real>,
            _dir: Vector<Real>,
            _max_distance: Real,
            _options: &QueryOptions<'_>,
        ) -> Option<RayHit> {
            self.line_hit.then(|| RayHit {
                point: Point::new(0.0, 0.0, -10.0),
                normal: Vector::z(),
                collider: WALL,
                distance: (origin.z + 10.0).abs(),
            })
        }

        fn overlap(&self, shape: &ProbeShape, options: &QueryOptions<'_>) -> Vec<OverlapContact> {
            let points: &[Point<Real>] = match shape {
                ProbeShape::Triangle(points) => points,
                ProbeShape::Hull(points) => points,
            };
            let mut hits = Vec::new();
            if self.touches(points) && !options.exclude.contains(&WALL) {
                hits.push(OverlapContact {
                    collider: WALL,
                    point: Point::new(0.0, 0.0, -10.0),
                });
            }
            if let Some(stray) = self.stray {
                let inside = (0..3).all(|axis| {
                    let min = points.iter().map(|p| p[axis]).fold(Real::MAX, Real::min);
                    let max = points.iter().map(|p| p[axis]).fold(Real::MIN, Real::max);
                    stray[axis] >= min - 0.05 && stray[axis] <= max + 0.05
                });
                if inside {
                    hits.push(OverlapContact {
                        collider: FAR,
                        point: stray,
                    });
                }
            }
            hits
        }
    }

    fn probe(velocity: Vector<Real>) -> RopeProbe {
        RopeProbe {
            chest: Point::origin(),
            anchor: Point::new(0.0, 0.0, -20.0),
            velocity,
        }
    }

    fn run(world: &SlabWorld, velocity: Vector<Real>) -> (ObstructionVerdict, ObstructionState) {
        let config = GrappleConfig::default();
        let mut state = ObstructionState::default();
        let verdict = check_rope(world, &config, &mut state, probe(velocity), &[]);
        (verdict, state)
    }

    #[test]
    fn clear_line_clears_flags() {
        let world = SlabWorld {
            slab_min_x: 5.0,
            slab_max_x: 6.0,
            line_hit: false,
            stray: None,
        };
        let config = GrappleConfig::default();
        let mut state = ObstructionState {
            blocked_left: true,
            near_obstruction: true,
            ..ObstructionState::default()
        };
        let verdict = check_rope(&world, &config, &mut state, probe(Vector::zeros()), &[]);
        assert_eq!(verdict, ObstructionVerdict::Clear);
        assert!(!state.blocked_left && !state.near_obstruction);
        assert_eq!(state.last_check_chest, Some(Point::origin()));
    }

    #[test]
    fn full_slab_cuts_rope() {
        let world = SlabWorld {
            slab_min_x: -5.0,
            slab_max_x: 5.0,
            line_hit: true,
            stray: None,
        };
        let (verdict, state) = run(&world, Vector::zeros());
        assert!(verdict.cuts_rope());
        assert!(state.blocked_left && state.blocked_right);
    }

    #[test]
    fn half_slab_leaves_a_way_around() {
        let world = SlabWorld {
            slab_min_x: -0.05,
            slab_max_x: 5.0,
            line_hit: true,
            stray: None,
        };
        let (verdict, state) = run(&world, Vector::zeros());
        assert_eq!(
            verdict,
            ObstructionVerdict::GoAround {
                blocked_left: true,
                blocked_right: false
            }
        );
        assert!(state.near_obstruction);
    }

    #[test]
    fn swapping_sides_keeps_outcome() {
        let world = SlabWorld {
            slab_min_x: -0.05,
            slab_max_x: 5.0,
            line_hit: true,
            stray: None,
        };
        let (up, up_state) = run(&world, Vector::new(0.0, 4.0, 0.0));
        let (down, down_state) = run(&world, Vector::new(0.0, -4.0, 0.0));
        assert!(!up.cuts_rope() && !down.cuts_rope());
        assert_eq!(up_state.blocked_left, down_state.blocked_right);
        assert_eq!(up_state.blocked_right, down_state.blocked_left);
    }

    #[test]
    fn distant_unrelated_geometry_does_not_block() {
        let world = SlabWorld {
            slab_min_x: -0.05,
            slab_max_x: 5.0,
            line_hit: true,
            stray: Some(Point::new(-0.6, 0.0, -2.0)),
        };
        let (verdict, state) = run(&world, Vector::zeros());
        assert!(!verdict.cuts_rope());
        assert!(!state.blocked_right);
    }

    #[test]
    fn nearby_other_collider_counts_as_same_obstacle() {
        let world = SlabWorld {
            slab_min_x: -0.05,
            slab_max_x: 5.0,
            line_hit: true,
            stray: Some(Point::new(-0.6, 0.0, -10.5)),
        };
        let (verdict, state) = run(&world, Vector::zeros());
        assert!(verdict.cuts_rope());
        assert!(state.blocked_right);
    }

    #[test]
    fn swept_edge_contact_bends_then_cuts() {
        let world = SlabWorld {
            slab_min_x: -5.0,
            slab_max_x: 5.0,
            line_hit: false,
            stray: None,
        };
        let config = GrappleConfig {
            bend_tolerance: std::f32::consts::PI,
            bend_grace_checks: 2,
            ..GrappleConfig::default()
        };
        let mut state = ObstructionState::default();
        let mut verdicts = Vec::new();
        for i in 0..4 {
            let x = if i % 2 == 0 { 0.5 } else { -0.5 };
            state.last_check_chest = Some(Point::new(-x, 0.0, 0.0));
            let probe = RopeProbe {
                chest: Point::new(x, 0.0, 0.0),
                anchor: Point::new(0.0, 0.0, -20.0),
                velocity: Vector::new(x, 0.0, 0.0),
            };
            verdicts.push(check_rope(&world, &config, &mut state, probe, &[]));
        }
        assert!(matches!(verdicts[0], ObstructionVerdict::Bent { .. }));
        assert!(matches!(verdicts[1], ObstructionVerdict::Bent { .. }));
        assert!(verdicts[2].cuts_rope());
    }

    #[test]
    fn excluded_colliders_are_ignored() {
        let world = SlabWorld {
            slab_min_x: -5.0,
            slab_max_x: 5.0,
            line_hit: false,
            stray: None,
        };
        let config = GrappleConfig::default();
        let mut state = ObstructionState {
            last_check_chest: Some(Point::new(-1.0, 0.0, 0.0)),
            ..ObstructionState::default()
        };
        let verdict = check_rope(&world, &config, &mut state, probe(Vector::zeros()), &[WALL]);
        assert_eq!(verdict, ObstructionVerdict::Clear);
    }
}
