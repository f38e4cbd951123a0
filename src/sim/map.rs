//! The static map: collision points built from outline drawings
//!
//! Map points never move and are never destroyed while the session runs.
//! They sit in the dark until a wavefront point touches them, then light up
//! and fade back.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::drawing::{Category, MapSource};
use super::geometry::{dedup_segments, jitter_points, merge_close, resample_all};
use crate::consts::MAP_BASELINE_RGB;
use crate::hsl_to_rgb;
use crate::physics::{BodyHandle, ColliderDesc, ColliderShape, CollisionGroups, PhysicsWorld};
use crate::settings::MapSettings;

/// Hit state of a map point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MapPointState {
    /// Never hit; drawn at the baseline colour
    #[default]
    Hidden,
    /// Hit at least once; lit and fading since the last hit
    Collided,
}

impl Category {
    /// Hue range points of this category draw from
    pub fn hue_range(&self, settings: &MapSettings) -> (f32, f32) {
        match self {
            Category::Tree => (settings.tree_hue_min, settings.tree_hue_max),
            Category::Building | Category::Other => (settings.hue_min, settings.hue_max),
        }
    }
}

/// A single static collision site
#[derive(Debug, Clone)]
pub struct MapPoint {
    pub position: Vec2,
    pub category: Category,
    pub state: MapPointState,
    pub handle: BodyHandle,
    /// Seconds since the last hit
    pub decay_clock: f32,
    /// Fixed for the point's lifetime (degrees)
    pub hue: f32,
    /// Fixed instance rotation (radians)
    pub rotation: f32,
    /// Set by the collision router, consumed by the next `Map::update`
    pub needs_update: bool,
    /// Direction of the post-hit wobble
    pub jitter_dir: Vec2,
    /// Derived each update
    pub color: [f32; 3],
    pub offset: Vec2,
    pub scale: f32,
}

impl MapPoint {
    fn new(position: Vec2, category: Category, handle: BodyHandle, hue: f32, rotation: f32) -> Self {
        Self {
            position,
            category,
            state: MapPointState::Hidden,
            handle,
            decay_clock: 0.0,
            hue,
            rotation,
            needs_update: false,
            jitter_dir: Vec2::ZERO,
            color: MAP_BASELINE_RGB,
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }

    /// Router entry point: flip to Collided and ask for an update
    pub fn mark_collided(&mut self) {
        self.state = MapPointState::Collided;
        self.needs_update = true;
    }

    /// Brightness right now, before shimmer (1 = just hit, 0 = faded)
    pub fn brightness(&self, settings: &MapSettings) -> f32 {
        match self.state {
            MapPointState::Hidden => 0.0,
            MapPointState::Collided => (1.0 - self.decay_clock / settings.decay_window).clamp(0.0, 1.0),
        }
    }

    fn update<R: Rng>(&mut self, dt: f32, settings: &MapSettings, rng: &mut R) {
        match self.state {
            MapPointState::Hidden => {
                self.color = MAP_BASELINE_RGB;
                self.offset = Vec2::ZERO;
                self.scale = 1.0;
            }
            MapPointState::Collided => {
                if self.needs_update {
                    self.decay_clock = 0.0;
                    let angle = rng.random::<f32>() * std::f32::consts::TAU;
                    self.jitter_dir = Vec2::new(angle.cos(), angle.sin());
                    self.needs_update = false;
                } else {
                    self.decay_clock += dt;
                }

                let t = self.decay_clock;
                let hue_phase = self.hue.to_radians() * 7.0;
                let shimmer = 1.0 + settings.shimmer_amplitude * (settings.shimmer_rate * t + hue_phase).sin();
                let mix = (self.brightness(settings) * shimmer).clamp(0.0, 1.0);

                let lit = hsl_to_rgb(self.hue, 0.65, 0.36);
                for (c, (base, lit)) in self.color.iter_mut().zip(MAP_BASELINE_RGB.iter().zip(lit)) {
                    *c = base + (lit - base) * mix;
                }

                let wobble = (1.0 - t / settings.jitter_window).clamp(0.0, 1.0);
                self.offset = self.jitter_dir * settings.hit_jitter * wobble;
                self.scale = 1.0 + 0.5 * wobble;
            }
        }
    }
}

/// Counts from each map construction stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapBuildReport {
    pub segments: usize,
    pub skipped_lines: usize,
    pub duplicate_segments: usize,
    pub resampled_points: usize,
    pub merged_points: usize,
    pub points: usize,
}

/// All map points, in instance-buffer order
#[derive(Debug, Clone, Default)]
pub struct Map {
    pub points: Vec<MapPoint>,
}

impl Map {
    /// Build collision points from drawings and attach one kinematic body each
    pub fn build<P: PhysicsWorld, R: Rng>(
        source: &MapSource,
        settings: &MapSettings,
        physics: &mut P,
        rng: &mut R,
    ) -> (Self, MapBuildReport) {
        let mut report = MapBuildReport::default();
        let mut points = Vec::new();

        for drawing in &source.drawings {
            log::info!("Extracting {:?} line segments...", drawing.category);
            let (mut segments, skipped) =
                drawing.world_segments(settings.origin, settings.points_fill_gap);
            report.skipped_lines += skipped;

            if settings.dedup_segments {
                let before = segments.len();
                segments = dedup_segments(&segments);
                report.duplicate_segments += before - segments.len();
            }
            report.segments += segments.len();
            log::info!("Done, {} segments ({} skipped)", segments.len(), skipped);

            let mut coords = resample_all(&segments, settings.points_fill_gap);
            report.resampled_points += coords.len();

            if settings.merge_points {
                let before = coords.len();
                coords = merge_close(&coords, settings.min_point_distance);
                report.merged_points += before - coords.len();
            }
            log::info!("Done, {} points after merging", coords.len());

            jitter_points(&mut coords, settings.points_jitter, rng);

            let (hue_min, hue_max) = drawing.category.hue_range(settings);
            for pos in coords {
                let handle = physics.create_static_body(pos);
                physics.create_collider(
                    handle,
                    ColliderDesc::elastic(
                        ColliderShape::Cuboid {
                            half_extents: Vec2::splat(settings.point_size),
                        },
                        CollisionGroups::WALL,
                    ),
                );
                let hue = hue_min + (hue_max - hue_min) * rng.random::<f32>();
                let rotation = rng.random::<f32>() * std::f32::consts::PI;
                points.push(MapPoint::new(pos, drawing.category, handle, hue, rotation));
            }
        }

        report.points = points.len();
        log::info!(
            "Map ready: {} points from {} segments",
            report.points,
            report.segments
        );
        (Self { points }, report)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Advance decay and derived colours of every point
    pub fn update<R: Rng>(&mut self, dt: f32, settings: &MapSettings, rng: &mut R) {
        for point in &mut self.points {
            point.update(dt, settings, rng);
        }
    }

    /// Number of points that have been hit at least once
    pub fn collided_count(&self) -> usize {
        self.points
            .iter()
            .filter(|p| p.state == MapPointState::Collided)
            .count()
    }

    /// Release every body (session teardown only)
    pub fn release<P: PhysicsWorld>(self, physics: &mut P) {
        for point in self.points {
            physics.remove_body(point.handle);
        }
    }
}
