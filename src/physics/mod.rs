//! Rigid-body collaborator
//!
//! The simulation never integrates motion or detects contacts itself. It
//! creates bodies, reads their translation/velocity back every frame, and
//! consumes the collision pairs each step reports.
//!
//! Backends:
//! - `RapierWorld`: rapier2d, used by the app
//! - `ScriptedWorld`: straight-line motion with hand-fed contacts, for replays and tests

pub mod rapier;
pub mod scripted;

pub use rapier::RapierWorld;
pub use scripted::ScriptedWorld;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Opaque id of a body inside the physics backend
///
/// Backends must never hand the same value out twice in one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u64);

/// One contact-begin event between two bodies (unordered)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair(pub BodyHandle, pub BodyHandle);

impl CollisionPair {
    /// Whether either side of the pair is `handle`
    #[inline]
    pub fn involves(&self, handle: BodyHandle) -> bool {
        self.0 == handle || self.1 == handle
    }
}

/// Collision membership/filter bit masks
///
/// Walls only collide with particles and particles only with walls, so
/// wavefront points pass through each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionGroups {
    pub memberships: u32,
    pub filter: u32,
}

impl CollisionGroups {
    pub const PARTICLE_BIT: u32 = 0b01;
    pub const WALL_BIT: u32 = 0b10;

    /// Static map geometry
    pub const WALL: Self = Self {
        memberships: Self::WALL_BIT,
        filter: Self::PARTICLE_BIT,
    };

    /// Moving wavefront points
    pub const PARTICLE: Self = Self {
        memberships: Self::PARTICLE_BIT,
        filter: Self::WALL_BIT,
    };

    /// Both sides must accept each other for a contact to exist
    #[inline]
    pub fn interacts_with(&self, other: &CollisionGroups) -> bool {
        (self.memberships & other.filter) != 0 && (other.memberships & self.filter) != 0
    }
}

/// Collider shape in body-local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Ball { radius: f32 },
    Cuboid { half_extents: Vec2 },
}

/// Everything needed to attach a collider to a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderDesc {
    pub shape: ColliderShape,
    pub groups: CollisionGroups,
    pub restitution: f32,
    pub friction: f32,
}

impl ColliderDesc {
    /// Perfectly elastic, frictionless collider (what every entity here uses)
    pub fn elastic(shape: ColliderShape, groups: CollisionGroups) -> Self {
        Self {
            shape,
            groups,
            restitution: 1.0,
            friction: 0.0,
        }
    }
}

/// Operations the simulation needs from a physics engine
pub trait PhysicsWorld {
    /// Create a kinematic (position-driven, immovable by contacts) body
    fn create_static_body(&mut self, pos: Vec2) -> BodyHandle;

    /// Create a dynamic body with an initial velocity
    fn create_dynamic_body(&mut self, pos: Vec2, vel: Vec2) -> BodyHandle;

    /// Attach a collider; ignored if `body` no longer exists
    fn create_collider(&mut self, body: BodyHandle, desc: ColliderDesc);

    /// Advance by `dt` seconds, returning contacts that began during the step
    fn step(&mut self, dt: f32) -> Vec<CollisionPair>;

    /// Remove a body and its colliders; ignored if already gone
    fn remove_body(&mut self, body: BodyHandle);

    fn translation(&self, body: BodyHandle) -> Option<Vec2>;

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec2>;

    fn set_linear_velocity(&mut self, body: BodyHandle, vel: Vec2);

    /// Number of live bodies
    fn body_count(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_exclude_particle_pairs() {
        assert!(CollisionGroups::PARTICLE.interacts_with(&CollisionGroups::WALL));
        assert!(CollisionGroups::WALL.interacts_with(&CollisionGroups::PARTICLE));
        assert!(!CollisionGroups::PARTICLE.interacts_with(&CollisionGroups::PARTICLE));
        assert!(!CollisionGroups::WALL.interacts_with(&CollisionGroups::WALL));
    }

    #[test]
    fn test_pair_involves() {
        let pair = CollisionPair(BodyHandle(3), BodyHandle(9));
        assert!(pair.involves(BodyHandle(3)));
        assert!(pair.involves(BodyHandle(9)));
        assert!(!pair.involves(BodyHandle(4)));
    }
}
