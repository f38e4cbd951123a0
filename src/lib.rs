//! Echolocate - an echo-location toy
//!
//! Click somewhere on the map and a ring of wavefront points expands from the
//! cursor, bouncing off the city outline and lighting it up as it goes.
//!
//! Core modules:
//! - `sim`: Simulation (map construction, wavefronts, collision routing, lifecycle)
//! - `physics`: Rigid-body collaborator behind the `PhysicsWorld` trait
//! - `renderer`: Instance buffers for the drawing surface
//! - `audio`: Sound requests and playback sinks
//! - `platform`: Browser entry point

pub mod audio;
pub mod error;
pub mod physics;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{Result, SimError};
pub use settings::{DetuneMode, ExpiryPolicy, Settings};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Largest frame delta fed to the simulation (avoids blow-ups after stalls)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Vertical extent of the orthographic view in world units
    pub const FRUSTUM_SIZE: f32 = 50.0;

    /// Baseline colour of a map point nobody has hit yet (#0f1a2e)
    pub const MAP_BASELINE_RGB: [f32; 3] = [15.0 / 255.0, 26.0 / 255.0, 46.0 / 255.0];

    /// Hue of reflected wavefront points (degrees)
    pub const COLLIDED_HUE: f32 = 270.0;

    /// Pitch set for discrete detune, in semitones
    pub const PITCHES: [f32; 6] = [0.0, 1.4, 3.1, 6.1, 11.0, 12.0];

    /// Rendered cursor radius
    pub const CURSOR_SIZE: f32 = 0.4;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Map a pointer position in normalized device coordinates to world space
///
/// Mirrors an orthographic camera centred on the origin whose vertical extent
/// is `frustum_size / zoom`.
pub fn ndc_to_world(ndc: Vec2, aspect: f32, frustum_size: f32, zoom: f32) -> Vec2 {
    let half_height = 0.5 / zoom * frustum_size;
    Vec2::new(ndc.x * aspect * half_height, ndc.y * half_height)
}

/// HSL to linear-ish RGB, all components in [0, 1] except hue in degrees
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [f32; 3] {
    let h = hue.rem_euclid(360.0) / 360.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    if s == 0.0 {
        return [l, l, l];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let channel = |mut t: f32| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };

    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsl_primaries() {
        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((red[0] - 1.0).abs() < 1e-5 && red[1].abs() < 1e-5 && red[2].abs() < 1e-5);

        let blue = hsl_to_rgb(240.0, 1.0, 0.5);
        assert!(blue[0].abs() < 1e-5 && blue[1].abs() < 1e-5 && (blue[2] - 1.0).abs() < 1e-5);

        // Lightness extremes collapse to black / white regardless of hue
        assert_eq!(hsl_to_rgb(270.0, 1.0, 0.0), [0.0, 0.0, 0.0]);
        let white = hsl_to_rgb(270.0, 1.0, 1.0);
        assert!(white.iter().all(|c| (c - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_ndc_to_world() {
        let p = ndc_to_world(Vec2::new(1.0, 1.0), 2.0, 50.0, 1.0);
        assert!((p.x - 50.0).abs() < 1e-4);
        assert!((p.y - 25.0).abs() < 1e-4);

        let zoomed = ndc_to_world(Vec2::new(0.0, -1.0), 2.0, 50.0, 2.0);
        assert!((zoomed.y + 12.5).abs() < 1e-4);
    }
}
