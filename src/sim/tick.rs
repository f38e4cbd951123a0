//! Per-frame simulation tick
//!
//! One call advances everything by one (capped) frame: physics, collision
//! routing, decay, and expiry.

use glam::Vec2;

use super::state::Simulation;
use crate::consts::MAX_FRAME_DT;
use crate::physics::PhysicsWorld;

/// Input for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer position in world space, if it moved
    pub cursor: Option<Vec2>,
    /// Launch a wavefront at the cursor (click/tap/space)
    pub trigger: bool,
}

/// What happened during a frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub contacts: usize,
    pub marked: usize,
    pub spawned: bool,
    pub expired: usize,
}

/// Advance the simulation by one frame
pub fn tick<P: PhysicsWorld>(sim: &mut Simulation<P>, input: &TickInput, dt: f32) -> TickReport {
    let dt = if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    };
    let mut report = TickReport::default();

    if let Some(cursor) = input.cursor {
        sim.cursor = cursor;
    }

    if input.trigger {
        let at = sim.cursor;
        match sim.spawn_wavefront(at) {
            Ok(_) => report.spawned = true,
            Err(e) => log::warn!("Wavefront spawn failed: {}", e),
        }
    }

    // Contacts first, so this frame's updates see them
    let pairs = sim.physics.step(dt);
    report.contacts = pairs.len();
    report.marked = sim.router.route(&pairs, &mut sim.map, &mut sim.wavefronts);
    if !pairs.is_empty() {
        log::trace!("{} contacts, {} entities marked", report.contacts, report.marked);
    }

    sim.map.update(dt, &sim.settings.map, &mut sim.rng);

    let echo_ceiling = sim.settings.audio.echo_volume_ceiling;
    for wf in sim.wavefronts.values_mut() {
        wf.update(
            dt,
            &sim.settings.wavefront,
            echo_ceiling,
            &mut sim.physics,
            &mut sim.rng,
            &mut sim.sounds,
        );
    }

    report.expired = sim.expire_wavefronts();

    sim.elapsed += dt as f64;
    sim.frame += 1;
    report
}
