//! Browser entry point
//!
//! The page owns the canvas, the render loop and the GPU surface; it drives
//! an `EchoApp` with pointer events and one `frame()` call per animation
//! frame, and uploads the returned instance data.

use js_sys::Float32Array;
use wasm_bindgen::prelude::*;

use crate::audio::{AudioManager, AudioSink};
use crate::consts::FRUSTUM_SIZE;
use crate::ndc_to_world;
use crate::physics::{PhysicsWorld, RapierWorld};
use crate::renderer::{DrawList, PointInstance};
use crate::settings::Settings;
use crate::sim::{MapSource, Simulation, TickInput, tick};

fn init_logging() {
    console_error_panic_hook::set_once();
    // A second app on the same page finds the logger already installed
    let _ = console_log::init_with_level(log::Level::Info);
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// One echo session bound to a page
#[wasm_bindgen]
pub struct EchoApp {
    sim: Option<Simulation<RapierWorld>>,
    audio: AudioManager,
    draw: DrawList,
    input: TickInput,
    aspect: f32,
    zoom: f32,
    last_time: f64,
    running: bool,
}

#[wasm_bindgen]
impl EchoApp {
    /// Build the map and physics world; `settings_json` overrides defaults
    #[wasm_bindgen(constructor)]
    pub fn new(aspect: f32, settings_json: Option<String>) -> Result<EchoApp, JsValue> {
        init_logging();

        let mut settings = match settings_json {
            Some(json) => Settings::from_json(&json).map_err(to_js)?,
            None => Settings::default(),
        };
        if settings.seed == 0 {
            settings.seed = js_sys::Date::now() as u64;
        }
        log::info!("Echolocate starting with seed: {}", settings.seed);

        let source = MapSource::demo().map_err(to_js)?;
        let sim = Simulation::new(RapierWorld::new(), settings, &source).map_err(to_js)?;
        let draw = DrawList::extract(&sim);

        Ok(EchoApp {
            sim: Some(sim),
            audio: AudioManager::new(),
            draw,
            input: TickInput::default(),
            aspect,
            zoom: 1.0,
            last_time: 0.0,
            running: true,
        })
    }

    pub fn resize(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom > 0.0 {
            self.zoom = zoom;
        }
    }

    /// Pointer moved; `x`/`y` in normalized device coordinates
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let world = ndc_to_world(glam::Vec2::new(x, y), self.aspect, FRUSTUM_SIZE, self.zoom);
        self.input.cursor = Some(world);
    }

    /// Click/tap: launch a wavefront on the next frame
    pub fn trigger(&mut self) {
        // First user gesture is what lets the browser start audio
        self.audio.resume();
        self.input.trigger = true;
    }

    /// Advance one animation frame and return the flattened instance data
    ///
    /// `time` is the `requestAnimationFrame` timestamp in milliseconds.
    /// Layout: map instances, then wavefront instances, then the cursor.
    pub fn frame(&mut self, time: f64) -> Float32Array {
        let dt = if self.last_time > 0.0 {
            ((time - self.last_time) / 1000.0) as f32
        } else {
            0.0
        };
        self.last_time = time;

        if !self.running {
            return Float32Array::new_with_length(0);
        }
        let Some(sim) = self.sim.as_mut() else {
            return Float32Array::new_with_length(0);
        };

        let input = std::mem::take(&mut self.input);
        tick(sim, &input, dt);

        let sounds = sim.drain_sounds();
        self.audio.play_all(&sounds, sim.settings().effective_volume());

        self.draw.refresh(sim);
        Float32Array::from(self.draw.to_floats().as_slice())
    }

    pub fn map_instance_count(&self) -> usize {
        self.draw.map.len()
    }

    pub fn wavefront_instance_count(&self) -> usize {
        self.draw.wavefronts.len()
    }

    pub fn floats_per_instance(&self) -> usize {
        PointInstance::FLOATS
    }

    /// Stop advancing; later `frame()` calls return nothing
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Release every physics body. Stops the app first.
    pub fn dispose(&mut self) {
        self.stop();
        if let Some(sim) = self.sim.take() {
            let physics = sim.dispose();
            log::info!("Session closed, {} bodies left", physics.body_count());
        }
    }
}
