//! Echo simulation
//!
//! Everything that happens between a click and the last fading echo lives
//! here. The module is deterministic for a given seed and physics backend:
//! - Seeded RNG only
//! - Stable iteration order (wavefronts by key, points by spawn angle)
//! - No rendering or platform dependencies

pub mod drawing;
pub mod geometry;
pub mod map;
pub mod router;
pub mod state;
pub mod tick;
pub mod wavefront;

pub use drawing::{Category, MapDrawing, MapSource, RawSegment};
pub use geometry::Segment;
pub use map::{Map, MapBuildReport, MapPoint, MapPointState};
pub use router::{BodyOwner, CollisionRouter};
pub use state::Simulation;
pub use tick::{TickInput, TickReport, tick};
pub use wavefront::{PointState, Wavefront, WavefrontKey, WavefrontPoint};
