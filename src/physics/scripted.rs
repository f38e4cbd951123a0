//! Scripted physics backend
//!
//! Bodies move in straight lines at their current velocity and never touch
//! each other. Contacts only happen when queued with `inject`, which makes
//! collision routing reproducible frame by frame.

use std::collections::BTreeMap;

use glam::Vec2;

use super::{BodyHandle, ColliderDesc, CollisionPair, PhysicsWorld};

#[derive(Debug, Clone)]
struct ScriptedBody {
    pos: Vec2,
    vel: Vec2,
    kinematic: bool,
    colliders: Vec<ColliderDesc>,
}

/// Deterministic stand-in physics world
#[derive(Debug, Default)]
pub struct ScriptedWorld {
    bodies: BTreeMap<BodyHandle, ScriptedBody>,
    next_handle: u64,
    queued: Vec<CollisionPair>,
    steps: u64,
}

impl ScriptedWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a contact to be reported by the next `step`
    pub fn inject(&mut self, a: BodyHandle, b: BodyHandle) {
        self.queued.push(CollisionPair(a, b));
    }

    /// Number of steps taken so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Colliders attached to a body
    pub fn colliders(&self, body: BodyHandle) -> &[ColliderDesc] {
        self.bodies
            .get(&body)
            .map(|b| b.colliders.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_kinematic(&self, body: BodyHandle) -> Option<bool> {
        self.bodies.get(&body).map(|b| b.kinematic)
    }

    fn insert(&mut self, body: ScriptedBody) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(handle, body);
        handle
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn create_static_body(&mut self, pos: Vec2) -> BodyHandle {
        self.insert(ScriptedBody {
            pos,
            vel: Vec2::ZERO,
            kinematic: true,
            colliders: Vec::new(),
        })
    }

    fn create_dynamic_body(&mut self, pos: Vec2, vel: Vec2) -> BodyHandle {
        self.insert(ScriptedBody {
            pos,
            vel,
            kinematic: false,
            colliders: Vec::new(),
        })
    }

    fn create_collider(&mut self, body: BodyHandle, desc: ColliderDesc) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.colliders.push(desc);
        }
    }

    fn step(&mut self, dt: f32) -> Vec<CollisionPair> {
        self.steps += 1;
        for body in self.bodies.values_mut().filter(|b| !b.kinematic) {
            body.pos += body.vel * dt;
        }
        std::mem::take(&mut self.queued)
    }

    fn remove_body(&mut self, body: BodyHandle) {
        self.bodies.remove(&body);
    }

    fn translation(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&body).map(|b| b.pos)
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&body).map(|b| b.vel)
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, vel: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            if !b.kinematic {
                b.vel = vel;
            }
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_line_motion() {
        let mut world = ScriptedWorld::new();
        let wall = world.create_static_body(Vec2::new(5.0, 5.0));
        let ball = world.create_dynamic_body(Vec2::ZERO, Vec2::new(2.0, -1.0));

        assert!(world.step(0.5).is_empty());
        assert_eq!(world.translation(ball), Some(Vec2::new(1.0, -0.5)));
        assert_eq!(world.translation(wall), Some(Vec2::new(5.0, 5.0)));
        assert_eq!(world.steps(), 1);
    }

    #[test]
    fn test_injected_pairs_reported_once() {
        let mut world = ScriptedWorld::new();
        let a = world.create_static_body(Vec2::ZERO);
        let b = world.create_dynamic_body(Vec2::ZERO, Vec2::ZERO);
        world.inject(a, b);

        assert_eq!(world.step(0.1), vec![CollisionPair(a, b)]);
        assert!(world.step(0.1).is_empty());
    }

    #[test]
    fn test_handles_never_reused() {
        let mut world = ScriptedWorld::new();
        let a = world.create_dynamic_body(Vec2::ZERO, Vec2::ZERO);
        world.remove_body(a);
        let b = world.create_dynamic_body(Vec2::ZERO, Vec2::ZERO);
        assert_ne!(a, b);
        assert_eq!(world.body_count(), 1);
    }
}
