//! Simulation root
//!
//! Owns the physics world and everything living in it. Every body is created
//! and released through here so the collision router never falls out of
//! sync with what physics knows about.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::drawing::MapSource;
use super::map::{Map, MapBuildReport};
use super::router::{BodyOwner, CollisionRouter};
use super::wavefront::{Wavefront, WavefrontKey};
use crate::audio::{Sound, SoundRequest};
use crate::error::Result;
use crate::physics::PhysicsWorld;
use crate::settings::{ExpiryPolicy, Settings};

/// A running session: map, live wavefronts, and the physics behind them
pub struct Simulation<P: PhysicsWorld> {
    pub(super) physics: P,
    pub(super) map: Map,
    /// Live wavefronts, oldest first
    pub(super) wavefronts: BTreeMap<WavefrontKey, Wavefront>,
    pub(super) rng: Pcg32,
    pub(super) settings: Settings,
    pub(super) router: CollisionRouter,
    /// Simulated seconds since construction
    pub(super) elapsed: f64,
    pub(super) frame: u64,
    last_key: Option<WavefrontKey>,
    /// Sounds queued since the last drain
    pub(super) sounds: Vec<SoundRequest>,
    /// Cursor in world space
    pub(super) cursor: Vec2,
    report: MapBuildReport,
}

impl<P: PhysicsWorld> Simulation<P> {
    /// Build the map into an existing physics world
    pub fn new(mut physics: P, settings: Settings, source: &MapSource) -> Result<Self> {
        settings.validate()?;
        let mut rng = Pcg32::seed_from_u64(settings.seed);
        let (map, report) = Map::build(source, &settings.map, &mut physics, &mut rng);
        log::info!(
            "Wavefronts: {} points, {} expiry",
            settings.wavefront.num_points,
            settings.wavefront.expiry.as_str()
        );

        let mut router = CollisionRouter::new();
        for (i, point) in map.points.iter().enumerate() {
            router.register(point.handle, BodyOwner::MapPoint(i));
        }

        Ok(Self {
            physics,
            map,
            wavefronts: BTreeMap::new(),
            rng,
            settings,
            router,
            elapsed: 0.0,
            frame: 0,
            last_key: None,
            sounds: Vec::new(),
            cursor: Vec2::ZERO,
            report,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn map_report(&self) -> &MapBuildReport {
        &self.report
    }

    pub fn wavefronts(&self) -> impl Iterator<Item = &Wavefront> {
        self.wavefronts.values()
    }

    pub fn wavefront(&self, key: WavefrontKey) -> Option<&Wavefront> {
        self.wavefronts.get(&key)
    }

    pub fn wavefront_mut(&mut self, key: WavefrontKey) -> Option<&mut Wavefront> {
        self.wavefronts.get_mut(&key)
    }

    pub fn wavefront_count(&self) -> usize {
        self.wavefronts.len()
    }

    /// Wavefront points still flying, across all wavefronts
    pub fn live_point_count(&self) -> usize {
        self.wavefronts.values().map(|wf| wf.points.len()).sum()
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn router(&self) -> &CollisionRouter {
        &self.router
    }

    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Next wavefront key: microseconds of simulated time, bumped past the
    /// previous key when two spawns land on the same instant
    fn next_key(&mut self) -> WavefrontKey {
        let now = (self.elapsed * 1_000_000.0) as u64;
        let key = match self.last_key {
            Some(WavefrontKey(last)) if now <= last => WavefrontKey(last + 1),
            _ => WavefrontKey(now),
        };
        self.last_key = Some(key);
        key
    }

    /// Launch a wavefront at `position` and play the ping
    pub fn spawn_wavefront(&mut self, position: Vec2) -> Result<WavefrontKey> {
        let key = self.next_key();
        let wf = Wavefront::spawn(
            key,
            position,
            &self.settings.wavefront,
            &mut self.physics,
            &mut self.rng,
        )?;

        for point in &wf.points {
            self.router.register(point.handle, BodyOwner::Wavefront(key));
        }
        self.sounds.push(SoundRequest {
            sound: Sound::Ping,
            volume: self.settings.audio.ping_volume,
            detune_cents: wf.detune_cents,
        });
        self.wavefronts.insert(key, wf);
        Ok(key)
    }

    /// Release every body of a wavefront and drop it from the draw set
    pub fn despawn_wavefront(&mut self, key: WavefrontKey) -> bool {
        let Some(wf) = self.wavefronts.remove(&key) else {
            return false;
        };
        let age = wf.age;
        let expired = wf.expired_count();
        let launched = wf.initial_count;
        for handle in wf.release(&mut self.physics) {
            self.router.forget(handle);
        }
        log::debug!(
            "Despawned wavefront {:?} at age {:.2}s ({} of {} points had expired)",
            key,
            age,
            expired,
            launched
        );
        true
    }

    /// Apply the expiry policy to every live wavefront
    ///
    /// Returns how many wavefronts went away.
    pub fn expire_wavefronts(&mut self) -> usize {
        let policy = self.settings.wavefront.expiry;
        if let ExpiryPolicy::PerPoint { .. } = policy {
            for wf in self.wavefronts.values_mut() {
                for handle in wf.expire_points(&mut self.physics) {
                    self.router.forget(handle);
                }
            }
        }

        let finished: Vec<WavefrontKey> = self
            .wavefronts
            .values()
            .filter(|wf| wf.is_finished(policy))
            .map(|wf| wf.key)
            .collect();
        for key in &finished {
            self.despawn_wavefront(*key);
        }
        finished.len()
    }

    /// Take the sounds queued since the last call
    pub fn drain_sounds(&mut self) -> Vec<SoundRequest> {
        std::mem::take(&mut self.sounds)
    }

    /// Tear the session down and hand back the physics world
    ///
    /// Wavefront bodies go first, then the map.
    pub fn dispose(mut self) -> P {
        let keys: Vec<WavefrontKey> = self.wavefronts.keys().copied().collect();
        for key in keys {
            self.despawn_wavefront(key);
        }
        let map = std::mem::take(&mut self.map);
        for point in &map.points {
            self.router.forget(point.handle);
        }
        map.release(&mut self.physics);
        log::info!("Simulation disposed after {} frames", self.frame);
        self.physics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::physics::ScriptedWorld;
    use crate::settings::WavefrontSettings;
    use crate::sim::drawing::{Category, MapDrawing, RawSegment};

    fn line_source() -> MapSource {
        MapSource {
            drawings: vec![MapDrawing::new(
                Category::Building,
                Some(Vec2::ZERO),
                vec![RawSegment::new(-5.0, -10.0, 5.0, -10.0)],
            )],
        }
    }

    fn small_settings() -> Settings {
        Settings {
            seed: 7,
            wavefront: WavefrontSettings {
                num_points: 12,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_new_registers_map_points() {
        let sim = Simulation::new(ScriptedWorld::new(), small_settings(), &line_source()).unwrap();
        assert!(!sim.map().is_empty());
        assert_eq!(sim.router().len(), sim.map().len());
        assert_eq!(sim.physics().body_count(), sim.map().len());
        assert_eq!(sim.map_report().points, sim.map().len());
    }

    #[test]
    fn test_new_rejects_bad_settings() {
        let mut settings = small_settings();
        settings.map.points_fill_gap = 0.0;
        let result = Simulation::new(ScriptedWorld::new(), settings, &line_source());
        assert!(matches!(result, Err(SimError::Settings(_))));
    }

    #[test]
    fn test_spawn_registers_and_pings() {
        let mut sim = Simulation::new(ScriptedWorld::new(), small_settings(), &line_source()).unwrap();
        let baseline = sim.physics().body_count();

        let key = sim.spawn_wavefront(Vec2::new(1.0, 2.0)).unwrap();
        assert_eq!(sim.wavefront_count(), 1);
        assert_eq!(sim.live_point_count(), 12);
        assert_eq!(sim.physics().body_count(), baseline + 12);
        assert_eq!(sim.router().len(), baseline + 12);

        let sounds = sim.drain_sounds();
        assert_eq!(sounds.len(), 1);
        assert_eq!(sounds[0].sound, Sound::Ping);
        assert_eq!(sounds[0].detune_cents, sim.wavefront(key).unwrap().detune_cents);
        assert!(sim.drain_sounds().is_empty());
    }

    #[test]
    fn test_keys_strictly_increase_at_same_instant() {
        let mut sim = Simulation::new(ScriptedWorld::new(), small_settings(), &line_source()).unwrap();
        let a = sim.spawn_wavefront(Vec2::ZERO).unwrap();
        let b = sim.spawn_wavefront(Vec2::ZERO).unwrap();
        let c = sim.spawn_wavefront(Vec2::ZERO).unwrap();
        assert!(a < b && b < c);
        assert_eq!(sim.wavefront_count(), 3);
    }

    #[test]
    fn test_failed_spawn_leaves_no_trace() {
        let mut sim = Simulation::new(ScriptedWorld::new(), small_settings(), &line_source()).unwrap();
        let baseline = sim.physics().body_count();
        sim.settings.wavefront.num_points = 0;

        assert!(sim.spawn_wavefront(Vec2::ZERO).is_err());
        assert_eq!(sim.wavefront_count(), 0);
        assert_eq!(sim.physics().body_count(), baseline);
        assert!(sim.drain_sounds().is_empty());
    }

    #[test]
    fn test_despawn_releases_bodies_and_handles() {
        let mut sim = Simulation::new(ScriptedWorld::new(), small_settings(), &line_source()).unwrap();
        let baseline = sim.physics().body_count();
        let key = sim.spawn_wavefront(Vec2::ZERO).unwrap();

        assert!(sim.despawn_wavefront(key));
        assert!(!sim.despawn_wavefront(key));
        assert_eq!(sim.physics().body_count(), baseline);
        assert_eq!(sim.router().len(), baseline);
    }

    #[test]
    fn test_dispose_returns_empty_world() {
        let mut sim = Simulation::new(ScriptedWorld::new(), small_settings(), &line_source()).unwrap();
        sim.spawn_wavefront(Vec2::ZERO).unwrap();
        sim.spawn_wavefront(Vec2::ONE).unwrap();

        let physics = sim.dispose();
        assert_eq!(physics.body_count(), 0);
    }
}
