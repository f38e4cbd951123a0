//! Audio output
//!
//! The simulation only produces `SoundRequest`s. A sink turns them into
//! sound: Web Audio oscillators in the browser, a log everywhere else.
//! Tones are procedurally generated - no external files needed!

use std::collections::VecDeque;

/// Pre-built tone presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    /// Wavefront spawned
    Ping,
    /// Wavefront point bounced off the map
    Echo,
}

/// A sound the simulation wants played this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundRequest {
    pub sound: Sound,
    /// 0.0 - 1.0, before master volume
    pub volume: f32,
    /// Pitch shift in cents
    pub detune_cents: f32,
}

/// Something that plays sounds
///
/// `play` is fire-and-forget and must return immediately.
pub trait AudioSink {
    fn play(&mut self, sound: Sound, volume: f32, detune_cents: f32);

    /// Play everything the simulation queued, scaled by `master_volume`
    fn play_all(&mut self, requests: &[SoundRequest], master_volume: f32) {
        if master_volume <= 0.0 {
            return;
        }
        for req in requests {
            let volume = (req.volume * master_volume).clamp(0.0, 1.0);
            if volume > 0.0 {
                self.play(req.sound, volume, req.detune_cents);
            }
        }
    }
}

/// Headless sink: keeps counts and the last few requests
#[derive(Debug, Default)]
pub struct SoundLog {
    pub pings: u64,
    pub echoes: u64,
    /// Oldest first
    pub recent: VecDeque<(Sound, f32, f32)>,
}

impl SoundLog {
    const RECENT: usize = 32;

    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioSink for SoundLog {
    fn play(&mut self, sound: Sound, volume: f32, detune_cents: f32) {
        match sound {
            Sound::Ping => self.pings += 1,
            Sound::Echo => self.echoes += 1,
        }
        log::trace!("play {:?} vol={:.2} detune={:.0}c", sound, volume, detune_cents);
        if self.recent.len() == Self::RECENT {
            self.recent.pop_front();
        }
        self.recent.push_back((sound, volume, detune_cents));
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, Sound};

    /// Web Audio sink
    pub struct AudioManager {
        ctx: Option<AudioContext>,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            detune_cents: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.detune().set_value(detune_cents);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Spawn tone - clean sine with a soft tail
        fn play_ping(&self, ctx: &AudioContext, vol: f32, detune: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 440.0, detune, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.5, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.6)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.7).ok();
        }

        /// Echo - the same tone, quieter, with a smeared second voice
        fn play_echo(&self, ctx: &AudioContext, vol: f32, detune: f32) {
            let t = ctx.current_time();

            if let Some((osc, gain)) = self.create_osc(ctx, 440.0, detune, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.15, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.9)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 1.0).ok();
            }

            // Slightly sharp tail standing in for reverb
            if let Some((osc, gain)) = self.create_osc(ctx, 440.0, detune + 7.0, OscillatorType::Triangle) {
                gain.gain().set_value_at_time(0.0, t).ok();
                gain.gain().linear_ramp_to_value_at_time(vol * 0.06, t + 0.08).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 1.4)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 1.5).ok();
            }
        }
    }

    impl AudioSink for AudioManager {
        fn play(&mut self, sound: Sound, volume: f32, detune_cents: f32) {
            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match sound {
                Sound::Ping => self.play_ping(ctx, volume, detune_cents),
                Sound::Echo => self.play_echo(ctx, volume, detune_cents),
            }
        }
    }
}
