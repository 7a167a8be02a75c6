//! Fire-and-forget notifications for presentation and audio.

use rapier3d::math::Point;
use rapier3d::prelude::Real;

use crate::release::ReleaseReason;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GrappleEvent {
    Fired {
        muzzle: Point<Real>,
        anchor: Point<Real>,
    },
    Released {
        point: Point<Real>,
        boosted: bool,
        reason: ReleaseReason,
    },
}

pub trait EventSink {
    fn emit(&mut self, event: GrappleEvent);
}

impl EventSink for Vec<GrappleEvent> {
    fn emit(&mut self, event: GrappleEvent) {
        self.push(event);
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEvents;

impl EventSink for NoEvents {
    fn emit(&mut self, _event: GrappleEvent) {}
}
