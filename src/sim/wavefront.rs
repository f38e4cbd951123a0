//! Wavefronts: expanding rings of moving collision points
//!
//! A wavefront spawns N points on a circle around the click position, each
//! flying outward on its own dynamic body. Points fade with age; bouncing off
//! the map gives some of that energy back and plays an echo.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::audio::{Sound, SoundRequest};
use crate::consts::{COLLIDED_HUE, PITCHES};
use crate::error::{Result, SimError};
use crate::physics::{BodyHandle, ColliderDesc, ColliderShape, CollisionGroups, PhysicsWorld};
use crate::settings::{DetuneMode, ExpiryPolicy, WavefrontSettings};
use crate::{hsl_to_rgb, polar_to_cartesian};

/// Unique, time-ordered wavefront id (microseconds of simulation time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WavefrontKey(pub u64);

/// Reflection state of a wavefront point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointState {
    /// Still travelling from the spawn without having hit anything
    #[default]
    Clean,
    /// Bounced off the map at least once
    Collided,
}

/// Values a point needs from its wavefront and the settings during an update
#[derive(Debug, Clone, Copy)]
pub struct ReflectionParams {
    pub reflection_fraction: f32,
    pub reflection_jitter: f32,
    pub echo_volume_ceiling: f32,
    pub detune_cents: f32,
}

/// One moving agent of a wavefront
#[derive(Debug, Clone)]
pub struct WavefrontPoint {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Seconds; pulled back on each reflection
    pub age: f32,
    pub lifespan: f32,
    pub state: PointState,
    pub handle: BodyHandle,
    /// Set by the collision router, consumed by the next update
    pub needs_update: bool,
    /// Reflections processed so far
    pub reflections: u32,
    /// Angle the point was launched at
    pub spawn_angle: f32,
    /// Derived each update
    pub color: [f32; 3],
}

impl WavefrontPoint {
    /// Remaining energy in [0, 1], linear in `age / lifespan`
    #[inline]
    pub fn energy(&self) -> f32 {
        (1.0 - self.age / self.lifespan).clamp(0.0, 1.0)
    }

    /// Echo volume for the current age: `max(0, ceiling - sqrt(age / lifespan))`
    #[inline]
    pub fn echo_volume(&self, ceiling: f32) -> f32 {
        (ceiling - (self.age.max(0.0) / self.lifespan).sqrt()).max(0.0)
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.age > self.lifespan
    }

    /// Router entry point: flip to Collided and ask for an update
    pub fn mark_collided(&mut self) {
        self.state = PointState::Collided;
        self.needs_update = true;
    }

    /// Colour for the current state and energy
    pub fn derive_color(&self) -> [f32; 3] {
        let e = self.energy();
        match self.state {
            PointState::Clean => [e, e, e],
            PointState::Collided => hsl_to_rgb(COLLIDED_HUE, 1.0, e),
        }
    }

    /// One frame: mirror physics, apply a pending reflection, age, recolour
    pub fn update<P: PhysicsWorld, R: Rng>(
        &mut self,
        dt: f32,
        params: &ReflectionParams,
        physics: &mut P,
        rng: &mut R,
        sounds: &mut Vec<SoundRequest>,
    ) {
        if let Some(pos) = physics.translation(self.handle) {
            self.position = pos;
        }
        if let Some(vel) = physics.linear_velocity(self.handle) {
            self.velocity = vel;
        }

        if self.needs_update {
            if self.state == PointState::Collided {
                self.age *= 1.0 - params.reflection_fraction;

                let jitter = params.reflection_jitter;
                self.velocity += Vec2::new(
                    jitter * (rng.random::<f32>() - 0.5),
                    jitter * (rng.random::<f32>() - 0.5),
                );
                physics.set_linear_velocity(self.handle, self.velocity);

                sounds.push(SoundRequest {
                    sound: Sound::Echo,
                    volume: self.echo_volume(params.echo_volume_ceiling),
                    detune_cents: params.detune_cents,
                });
                self.reflections += 1;
            }
            self.needs_update = false;
        }

        self.age += dt;
        self.color = self.derive_color();
    }

    /// Remove the point's body; the point is gone afterwards
    pub fn release<P: PhysicsWorld>(self, physics: &mut P) -> BodyHandle {
        physics.remove_body(self.handle);
        self.handle
    }
}

/// One user-triggered expanding ring
#[derive(Debug, Clone)]
pub struct Wavefront {
    pub key: WavefrontKey,
    pub spawn_position: Vec2,
    pub lifespan: f32,
    /// Seconds since spawn
    pub age: f32,
    /// Pitch shift shared by every echo of this wavefront
    pub detune_cents: f32,
    /// Live points in launch-angle order
    pub points: Vec<WavefrontPoint>,
    /// Points launched at spawn
    pub initial_count: usize,
}

/// Pick the wavefront's pitch shift
pub fn choose_detune<R: Rng>(mode: DetuneMode, rng: &mut R) -> f32 {
    match mode {
        DetuneMode::Discrete => PITCHES[rng.random_range(0..PITCHES.len())] * 100.0,
        DetuneMode::Continuous { range_cents } => (rng.random::<f32>() * 2.0 - 1.0) * range_cents,
    }
}

impl Wavefront {
    /// Lay out the ring and create one dynamic body per point
    pub fn spawn<P: PhysicsWorld, R: Rng>(
        key: WavefrontKey,
        position: Vec2,
        settings: &WavefrontSettings,
        physics: &mut P,
        rng: &mut R,
    ) -> Result<Self> {
        let n = settings.num_points;
        let lifespan = settings.lifespan;
        if n == 0 || !(lifespan > 0.0) {
            return Err(SimError::InvalidWavefront {
                lifespan,
                num_points: n,
            });
        }

        let detune_cents = choose_detune(settings.detune, rng);
        let collider = ColliderDesc::elastic(
            ColliderShape::Ball {
                radius: settings.point_size,
            },
            CollisionGroups::PARTICLE,
        );

        let mut points = Vec::with_capacity(n);
        for i in 0..n {
            let angle = (i as f32 / n as f32) * std::f32::consts::TAU
                + settings.angle_jitter * rng.random::<f32>();
            let radius = settings.spawn_distance + settings.position_jitter * rng.random::<f32>();
            let speed = settings.point_velocity + settings.velocity_jitter * rng.random::<f32>();

            let pos = position + polar_to_cartesian(radius, angle);
            let vel = polar_to_cartesian(speed, angle);

            let handle = physics.create_dynamic_body(pos, vel);
            physics.create_collider(handle, collider);

            let mut point = WavefrontPoint {
                position: pos,
                velocity: vel,
                age: 0.0,
                lifespan,
                state: PointState::Clean,
                handle,
                needs_update: false,
                reflections: 0,
                spawn_angle: angle,
                color: [1.0; 3],
            };
            point.color = point.derive_color();
            points.push(point);
        }

        log::debug!(
            "Spawned wavefront {:?} at ({:.1}, {:.1}) with {} points, detune {:.0}c",
            key,
            position.x,
            position.y,
            n,
            detune_cents
        );

        Ok(Self {
            key,
            spawn_position: position,
            lifespan,
            age: 0.0,
            detune_cents,
            points,
            initial_count: n,
        })
    }

    /// Points already dropped by per-point expiry
    pub fn expired_count(&self) -> usize {
        self.initial_count - self.points.len()
    }

    /// Advance the wavefront clock and every point
    pub fn update<P: PhysicsWorld, R: Rng>(
        &mut self,
        dt: f32,
        settings: &WavefrontSettings,
        echo_volume_ceiling: f32,
        physics: &mut P,
        rng: &mut R,
        sounds: &mut Vec<SoundRequest>,
    ) {
        self.age += dt;
        let params = ReflectionParams {
            reflection_fraction: settings.reflection_fraction,
            reflection_jitter: settings.reflection_jitter,
            echo_volume_ceiling,
            detune_cents: self.detune_cents,
        };
        for point in &mut self.points {
            point.update(dt, &params, physics, rng, sounds);
        }
    }

    pub fn point_mut(&mut self, handle: BodyHandle) -> Option<&mut WavefrontPoint> {
        self.points.iter_mut().find(|p| p.handle == handle)
    }

    /// Release points past their lifespan, returning their handles
    pub fn expire_points<P: PhysicsWorld>(&mut self, physics: &mut P) -> Vec<BodyHandle> {
        let (expired, live): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.points).into_iter().partition(|p| p.is_expired());
        self.points = live;
        expired.into_iter().map(|p| p.release(physics)).collect()
    }

    /// Whether the whole wavefront should go, under `policy`
    pub fn is_finished(&self, policy: ExpiryPolicy) -> bool {
        match policy {
            ExpiryPolicy::WholeFront => self.age > self.lifespan,
            ExpiryPolicy::PerPoint { min_live_points } => {
                self.points.is_empty() || self.points.len() < min_live_points
            }
        }
    }

    /// Release every remaining point, returning their handles
    pub fn release<P: PhysicsWorld>(self, physics: &mut P) -> Vec<BodyHandle> {
        self.points.into_iter().map(|p| p.release(physics)).collect()
    }
}
