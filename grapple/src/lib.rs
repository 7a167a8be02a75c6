//! Grapple swing physics and rope-obstruction engine.
//!
//! One `GrappleEngine` per actor fires a tethered anchor into the world, integrates a
//! position-based pendulum swing every physics tick, periodically checks whether world geometry
//! has cut the rope, and finalizes releases with an optional exit boost.
#![forbid(unsafe_code)]

pub mod acquisition;
pub mod charges;
pub mod config;
pub mod engine;
pub mod events;
pub mod governors;
pub mod integrator;
pub mod obstruction;
pub mod query;
pub mod rapier_query;
pub mod release;
pub mod session;
pub mod shapes;

pub use config::{ConfigError, GrappleConfig};
pub use engine::{ActorState, GrappleEngine, GrappleInput, TickOutcome};
pub use events::{EventSink, GrappleEvent, NoEvents};
pub use query::{ColliderId, WorldQuery};
pub use release::{ReleaseOutcome, ReleaseReason};
pub use session::{GrappleSession, ReplicatedGrapple};
