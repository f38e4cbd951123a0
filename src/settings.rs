//! Simulation settings
//!
//! Loaded from JSON (file on native, embedded string on web). Every field has
//! a default so partial files are fine.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Smallest accepted `map.points_fill_gap`
pub const MIN_FILL_GAP: f32 = 0.01;

/// How a wavefront ends its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpiryPolicy {
    /// Drop the whole front once its own age passes the lifespan
    WholeFront,
    /// Drop points one by one as they expire; drop the front when fewer than
    /// `min_live_points` remain (or none at all)
    PerPoint { min_live_points: usize },
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        ExpiryPolicy::PerPoint { min_live_points: 0 }
    }
}

impl ExpiryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryPolicy::WholeFront => "whole-front",
            ExpiryPolicy::PerPoint { .. } => "per-point",
        }
    }
}

/// How a wavefront picks its pitch shift
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum DetuneMode {
    /// One of the fixed pitches in `consts::PITCHES`
    #[default]
    Discrete,
    /// Uniform offset in `[-range_cents, range_cents)`
    Continuous { range_cents: f32 },
}

/// Map construction and map decay parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Fallback world offset for drawings that don't carry one
    pub origin: Vec2,
    /// Arc-length spacing between resampled points
    pub points_fill_gap: f32,
    /// Per-axis distance under which two points are merged
    pub min_point_distance: f32,
    /// Uniform positional jitter applied after merging
    pub points_jitter: f32,
    /// Half extent of each point's collider
    pub point_size: f32,
    /// Drop segments that repeat another with swapped endpoints
    pub dedup_segments: bool,
    /// Merge near-duplicate points
    pub merge_points: bool,
    /// Seconds a hit point takes to fade back to baseline
    pub decay_window: f32,
    /// Seconds the post-hit wobble lasts
    pub jitter_window: f32,
    /// Largest positional wobble right after a hit
    pub hit_jitter: f32,
    /// Relative brightness oscillation of lit points
    pub shimmer_amplitude: f32,
    /// Shimmer angular frequency (rad/s)
    pub shimmer_rate: f32,
    /// Hue range of building and other outlines (degrees)
    pub hue_min: f32,
    pub hue_max: f32,
    /// Hue range of tree outlines (degrees)
    pub tree_hue_min: f32,
    pub tree_hue_max: f32,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            origin: Vec2::new(-120.0, 230.0),
            points_fill_gap: 0.5,
            min_point_distance: 0.3,
            points_jitter: 0.2,
            point_size: 0.2,
            dedup_segments: true,
            merge_points: true,
            decay_window: 2.0,
            jitter_window: 0.3,
            hit_jitter: 0.08,
            shimmer_amplitude: 0.15,
            shimmer_rate: 9.0,
            hue_min: 190.0,
            hue_max: 215.0,
            tree_hue_min: 120.0,
            tree_hue_max: 150.0,
        }
    }
}

/// Wavefront spawn and reflection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WavefrontSettings {
    /// Seconds a point lives without reflections
    pub lifespan: f32,
    pub num_points: usize,
    /// Collider radius of each point
    pub point_size: f32,
    pub point_velocity: f32,
    /// Extra spawn radius, `[0, position_jitter)`
    pub position_jitter: f32,
    /// Extra speed, `[0, velocity_jitter)`
    pub velocity_jitter: f32,
    /// Extra angle, `[0, angle_jitter)` radians
    pub angle_jitter: f32,
    /// Ring radius at spawn
    pub spawn_distance: f32,
    /// Share of a point's age removed by each reflection
    pub reflection_fraction: f32,
    /// Per-axis velocity scatter applied on reflection
    pub reflection_jitter: f32,
    pub detune: DetuneMode,
    pub expiry: ExpiryPolicy,
}

impl Default for WavefrontSettings {
    fn default() -> Self {
        Self {
            lifespan: 2.0,
            num_points: 180,
            point_size: 0.1,
            point_velocity: 13.0,
            position_jitter: 0.1,
            velocity_jitter: 0.5,
            angle_jitter: 0.05,
            spawn_distance: 0.0,
            reflection_fraction: 8.0 / 9.0,
            reflection_jitter: 0.5,
            detune: DetuneMode::default(),
            expiry: ExpiryPolicy::default(),
        }
    }
}

/// Audio mix
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Echo volume is `max(0, echo_volume_ceiling - sqrt(age / lifespan))`
    pub echo_volume_ceiling: f32,
    /// Volume of the tone played when a wavefront spawns
    pub ping_volume: f32,
    pub muted: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            echo_volume_ceiling: 1.0,
            ping_volume: 0.6,
            muted: false,
        }
    }
}

/// All tunables for a session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// RNG seed (0 picks one from the clock on startup)
    pub seed: u64,
    pub map: MapSettings,
    pub wavefront: WavefrontSettings,
    pub audio: AudioSettings,
}

impl Settings {
    /// Parse and validate settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Reject values the simulation can't run with
    pub fn validate(&self) -> Result<()> {
        let map = &self.map;
        let wf = &self.wavefront;

        let positive = [
            ("map.points_fill_gap", map.points_fill_gap),
            ("map.point_size", map.point_size),
            ("map.decay_window", map.decay_window),
            ("map.jitter_window", map.jitter_window),
            ("wavefront.lifespan", wf.lifespan),
            ("wavefront.point_size", wf.point_size),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(SimError::Settings(format!("{name} must be positive, got {value}")));
            }
        }

        if !(map.points_fill_gap >= MIN_FILL_GAP) {
            return Err(SimError::Settings(format!(
                "map.points_fill_gap must be at least {MIN_FILL_GAP}, got {}",
                map.points_fill_gap
            )));
        }

        let non_negative = [
            ("map.min_point_distance", map.min_point_distance),
            ("map.points_jitter", map.points_jitter),
            ("wavefront.position_jitter", wf.position_jitter),
            ("wavefront.velocity_jitter", wf.velocity_jitter),
            ("wavefront.angle_jitter", wf.angle_jitter),
            ("wavefront.spawn_distance", wf.spawn_distance),
            ("wavefront.reflection_jitter", wf.reflection_jitter),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(SimError::Settings(format!("{name} must not be negative, got {value}")));
            }
        }

        if wf.num_points == 0 {
            return Err(SimError::Settings("wavefront.num_points must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&wf.reflection_fraction) {
            return Err(SimError::Settings(format!(
                "wavefront.reflection_fraction must be in [0, 1), got {}",
                wf.reflection_fraction
            )));
        }
        if map.hue_max < map.hue_min {
            return Err(SimError::Settings("map.hue_max must not be below map.hue_min".into()));
        }
        if map.tree_hue_max < map.tree_hue_min {
            return Err(SimError::Settings(
                "map.tree_hue_max must not be below map.tree_hue_min".into(),
            ));
        }
        Ok(())
    }

    /// Effective master volume (respects mute)
    pub fn effective_volume(&self) -> f32 {
        if self.audio.muted {
            0.0
        } else {
            self.audio.master_volume.clamp(0.0, 1.0)
        }
    }
}
