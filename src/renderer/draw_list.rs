//! Frame draw list
//!
//! The simulation is handed to the drawing surface as three instance
//! buffers. Map instances keep one slot per map point for the whole session,
//! so the surface can upload the map buffer in place every frame.

use super::instance::{PointInstance, colors};
use crate::consts::CURSOR_SIZE;
use crate::physics::PhysicsWorld;
use crate::sim::Simulation;

/// Everything the drawing surface needs for one frame
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    /// Indexed like `Map::points`
    pub map: Vec<PointInstance>,
    /// Live wavefront points, oldest wavefront first
    pub wavefronts: Vec<PointInstance>,
    pub cursor: PointInstance,
}

impl DrawList {
    /// Build a fresh draw list for the current frame
    pub fn extract<P: PhysicsWorld>(sim: &Simulation<P>) -> Self {
        let mut list = Self::default();
        list.refresh(sim);
        list
    }

    /// Rewrite the buffers in place, reusing their allocations
    pub fn refresh<P: PhysicsWorld>(&mut self, sim: &Simulation<P>) {
        let map_size = sim.settings().map.point_size;
        let map = sim.map();
        self.map.clear();
        self.map.extend(map.points.iter().map(|p| {
            let pos = p.position + p.offset;
            PointInstance::new(
                pos.x,
                pos.y,
                map_size * p.scale,
                p.rotation,
                colors::opaque(p.color),
            )
        }));

        let wf_size = sim.settings().wavefront.point_size;
        self.wavefronts.clear();
        self.wavefronts.extend(sim.wavefronts().flat_map(|wf| {
            wf.points.iter().map(move |p| {
                PointInstance::new(p.position.x, p.position.y, wf_size, 0.0, colors::opaque(p.color))
            })
        }));

        let cursor = sim.cursor();
        self.cursor = PointInstance::new(cursor.x, cursor.y, CURSOR_SIZE, 0.0, colors::CURSOR);
    }

    /// Total instances across all buffers, cursor included
    pub fn instance_count(&self) -> usize {
        self.map.len() + self.wavefronts.len() + 1
    }

    /// Map, then wavefronts, then cursor, flattened for a single upload
    pub fn to_floats(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.instance_count() * PointInstance::FLOATS);
        out.extend_from_slice(bytemuck::cast_slice(&self.map));
        out.extend_from_slice(bytemuck::cast_slice(&self.wavefronts));
        out.extend_from_slice(bytemuck::cast_slice(std::slice::from_ref(&self.cursor)));
        out
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::physics::ScriptedWorld;
    use crate::settings::{Settings, WavefrontSettings};
    use crate::sim::{Category, MapDrawing, MapSource, RawSegment, TickInput, tick};

    fn sim() -> Simulation<ScriptedWorld> {
        let source = MapSource {
            drawings: vec![MapDrawing::new(
                Category::Building,
                Some(Vec2::ZERO),
                vec![RawSegment::new(0.0, 0.0, 3.0, 0.0)],
            )],
        };
        let settings = Settings {
            seed: 1,
            wavefront: WavefrontSettings {
                num_points: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        Simulation::new(ScriptedWorld::new(), settings, &source).unwrap()
    }

    #[test]
    fn test_extract_counts_and_baseline() {
        let mut sim = sim();
        let list = DrawList::extract(&sim);
        assert_eq!(list.map.len(), sim.map().len());
        assert!(list.wavefronts.is_empty());
        assert!(list.map.iter().all(|i| i.color == colors::MAP_BASELINE));

        let input = TickInput {
            cursor: Some(Vec2::new(4.0, -1.0)),
            trigger: true,
        };
        tick(&mut sim, &input, 1.0 / 60.0);
        let list = DrawList::extract(&sim);
        assert_eq!(list.wavefronts.len(), 10);
        assert_eq!(list.cursor.position, [4.0, -1.0]);
        assert_eq!(list.to_floats().len(), list.instance_count() * PointInstance::FLOATS);
    }

    #[test]
    fn test_map_slots_are_stable() {
        let mut sim = sim();
        let before = DrawList::extract(&sim);

        let particle_at = |sim: &Simulation<ScriptedWorld>| sim.wavefronts().next().unwrap().points[0].handle;
        tick(&mut sim, &TickInput { cursor: None, trigger: true }, 1.0 / 60.0);
        let wall = sim.map().points[2].handle;
        let particle = particle_at(&sim);
        sim.physics_mut().inject(particle, wall);
        tick(&mut sim, &TickInput::default(), 1.0 / 60.0);

        let mut after = DrawList::default();
        after.refresh(&sim);
        assert_eq!(after.map.len(), before.map.len());
        assert_ne!(after.map[2].color, before.map[2].color);
        assert!(after.map[2].scale > before.map[2].scale);
        assert_eq!(after.map[0].color, before.map[0].color);
    }
}
