//! Echolocate entry point
//!
//! The browser build is driven from JavaScript through `platform::EchoApp`.
//! Natively the simulation runs headless: a few pings over the demo map, with
//! echoes going to the log.
//!
//! Usage: `echolocate [settings.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Echolocate (native, headless) starting...");

    if let Err(e) = headless::run(std::env::args().nth(1)) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::EchoApp, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::Path;
    use std::time::{SystemTime, UNIX_EPOCH};

    use echolocate::audio::{AudioSink, SoundLog};
    use echolocate::physics::{PhysicsWorld, RapierWorld};
    use echolocate::sim::{MapSource, Simulation, TickInput, tick};
    use echolocate::{Result, Settings};
    use glam::Vec2;

    /// 60 Hz frames
    const FRAME_DT: f32 = 1.0 / 60.0;
    /// How long to keep running after the last ping
    const TAIL_SECONDS: f32 = 3.0;

    /// Where and when (in frames) to ping
    const PINGS: [(u32, Vec2); 3] = [
        (0, Vec2::new(0.0, 0.0)),
        (45, Vec2::new(-10.0, 6.0)),
        (90, Vec2::new(12.0, -8.0)),
    ];

    pub fn run(settings_path: Option<String>) -> Result<()> {
        let mut settings = match settings_path {
            Some(path) => Settings::load(Path::new(&path))?,
            None => Settings::default(),
        };
        if settings.seed == 0 {
            settings.seed = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(1);
        }
        log::info!("Seed: {}", settings.seed);

        let source = MapSource::demo()?;
        let mut sim = Simulation::new(RapierWorld::new(), settings, &source)?;
        let report = sim.map_report().clone();
        log::info!(
            "Map: {} points ({} segments, {} duplicates, {} merged, {} skipped lines)",
            report.points,
            report.segments,
            report.duplicate_segments,
            report.merged_points,
            report.skipped_lines
        );

        let mut sink = SoundLog::new();
        let last_ping = PINGS.iter().map(|(frame, _)| *frame).max().unwrap_or(0);
        let total_frames = last_ping + (TAIL_SECONDS / FRAME_DT) as u32;
        let mut contacts = 0;
        let mut peak_points = 0;

        for frame in 0..total_frames {
            let mut input = TickInput::default();
            if let Some((_, at)) = PINGS.iter().find(|(f, _)| *f == frame) {
                input.cursor = Some(*at);
                input.trigger = true;
            }

            let step = tick(&mut sim, &input, FRAME_DT);
            contacts += step.contacts;
            peak_points = peak_points.max(sim.live_point_count());

            let sounds = sim.drain_sounds();
            sink.play_all(&sounds, sim.settings().effective_volume());

            if frame % 60 == 0 {
                log::debug!(
                    "t={:.1}s wavefronts={} points={} lit={}",
                    sim.elapsed(),
                    sim.wavefront_count(),
                    sim.live_point_count(),
                    sim.map().collided_count()
                );
            }
        }

        log::info!(
            "Ran {} frames: {} contacts, peak {} live points, {} of {} map points lit",
            total_frames,
            contacts,
            peak_points,
            sim.map().collided_count(),
            sim.map().len()
        );
        log::info!("Sounds: {} pings, {} echoes", sink.pings, sink.echoes);

        let physics = sim.dispose();
        log::info!("Disposed, {} bodies left", physics.body_count());
        Ok(())
    }
}
