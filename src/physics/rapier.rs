//! rapier2d backend

use std::sync::Mutex;

use glam::Vec2;
use rapier2d::prelude::*;

use super::{BodyHandle, ColliderDesc, ColliderShape, CollisionGroups, CollisionPair, PhysicsWorld};

/// Collects contact-begin events during a step
#[derive(Default)]
struct CollisionCollector {
    started: Mutex<Vec<(ColliderHandle, ColliderHandle)>>,
}

impl EventHandler for CollisionCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let CollisionEvent::Started(h1, h2, _) = event {
            if let Ok(mut started) = self.started.lock() {
                started.push((h1, h2));
            }
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// A zero-gravity rapier world
pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    collector: CollisionCollector,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl RapierWorld {
    pub fn new() -> Self {
        Self {
            gravity: vector![0.0, 0.0],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            collector: CollisionCollector::default(),
        }
    }

    fn to_handle(handle: RigidBodyHandle) -> BodyHandle {
        let (index, generation) = handle.into_raw_parts();
        BodyHandle(((generation as u64) << 32) | index as u64)
    }

    fn from_handle(handle: BodyHandle) -> RigidBodyHandle {
        RigidBodyHandle::from_raw_parts(handle.0 as u32, (handle.0 >> 32) as u32)
    }

    fn groups(groups: CollisionGroups) -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_truncate(groups.memberships),
            Group::from_bits_truncate(groups.filter),
        )
    }

    fn body_of(&self, collider: ColliderHandle) -> Option<BodyHandle> {
        self.colliders
            .get(collider)
            .and_then(|c| c.parent())
            .map(Self::to_handle)
    }
}

impl PhysicsWorld for RapierWorld {
    fn create_static_body(&mut self, pos: Vec2) -> BodyHandle {
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(vector![pos.x, pos.y])
            .ccd_enabled(true)
            .build();
        Self::to_handle(self.bodies.insert(body))
    }

    fn create_dynamic_body(&mut self, pos: Vec2, vel: Vec2) -> BodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![pos.x, pos.y])
            .linvel(vector![vel.x, vel.y])
            .ccd_enabled(true)
            .build();
        Self::to_handle(self.bodies.insert(body))
    }

    fn create_collider(&mut self, body: BodyHandle, desc: ColliderDesc) {
        let parent = Self::from_handle(body);
        if self.bodies.get(parent).is_none() {
            log::warn!("Collider requested for missing body {:?}", body);
            return;
        }

        let builder = match desc.shape {
            ColliderShape::Ball { radius } => ColliderBuilder::ball(radius),
            ColliderShape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            }
        };
        let collider = builder
            .friction(desc.friction)
            .friction_combine_rule(CoefficientCombineRule::Max)
            .restitution(desc.restitution)
            .restitution_combine_rule(CoefficientCombineRule::Max)
            .collision_groups(Self::groups(desc.groups))
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.colliders
            .insert_with_parent(collider, parent, &mut self.bodies);
    }

    fn step(&mut self, dt: f32) -> Vec<CollisionPair> {
        // rapier divides by dt
        if !(dt > 0.0) {
            return Vec::new();
        }
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
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
            None,
            &(),
            &self.collector,
        );

        let started = match self.collector.started.lock() {
            Ok(mut started) => std::mem::take(&mut *started),
            Err(_) => Vec::new(),
        };

        started
            .into_iter()
            .filter_map(|(c1, c2)| Some(CollisionPair(self.body_of(c1)?, self.body_of(c2)?)))
            .collect()
    }

    fn remove_body(&mut self, body: BodyHandle) {
        self.bodies.remove(
            Self::from_handle(body),
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    fn translation(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies
            .get(Self::from_handle(body))
            .map(|b| Vec2::new(b.translation().x, b.translation().y))
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies
            .get(Self::from_handle(body))
            .map(|b| Vec2::new(b.linvel().x, b.linvel().y))
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, vel: Vec2) {
        if let Some(b) = self.bodies.get_mut(Self::from_handle(body)) {
            b.set_linvel(vector![vel.x, vel.y], true);
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
    fn test_handles_round_trip_and_stay_unique() {
        let mut world = RapierWorld::new();
        let a = world.create_static_body(Vec2::new(1.0, 2.0));
        let b = world.create_dynamic_body(Vec2::ZERO, Vec2::X);
        assert_ne!(a, b);
        assert_eq!(world.translation(a), Some(Vec2::new(1.0, 2.0)));

        world.remove_body(b);
        assert_eq!(world.translation(b), None);

        // Slot reuse bumps the generation, so the new handle differs
        let c = world.create_dynamic_body(Vec2::ZERO, Vec2::Y);
        assert_ne!(b, c);
        assert_eq!(world.body_count(), 2);
    }

    #[test]
    fn test_ball_hits_wall_and_reports_pair() {
        let mut world = RapierWorld::new();
        let wall = world.create_static_body(Vec2::new(2.0, 0.0));
        world.create_collider(
            wall,
            ColliderDesc::elastic(
                ColliderShape::Cuboid { half_extents: Vec2::splat(0.2) },
                CollisionGroups::WALL,
            ),
        );
        let ball = world.create_dynamic_body(Vec2::ZERO, Vec2::new(10.0, 0.0));
        world.create_collider(
            ball,
            ColliderDesc::elastic(ColliderShape::Ball { radius: 0.1 }, CollisionGroups::PARTICLE),
        );

        let mut pairs = Vec::new();
        for _ in 0..60 {
            pairs.extend(world.step(1.0 / 60.0));
        }

        assert!(pairs.iter().any(|p| p.involves(wall) && p.involves(ball)));
        // Elastic bounce sends the ball back the way it came
        let vel = world.linear_velocity(ball).unwrap();
        assert!(vel.x < 0.0);
    }

    #[test]
    fn test_particles_pass_through_each_other() {
        let mut world = RapierWorld::new();
        let desc = ColliderDesc::elastic(ColliderShape::Ball { radius: 0.1 }, CollisionGroups::PARTICLE);
        let a = world.create_dynamic_body(Vec2::new(-1.0, 0.0), Vec2::new(5.0, 0.0));
        world.create_collider(a, desc);
        let b = world.create_dynamic_body(Vec2::new(1.0, 0.0), Vec2::new(-5.0, 0.0));
        world.create_collider(b, desc);

        let mut pairs = Vec::new();
        for _ in 0..30 {
            pairs.extend(world.step(1.0 / 60.0));
        }
        assert!(pairs.is_empty());
        assert!(world.translation(a).unwrap().x > 0.5);
    }
}
