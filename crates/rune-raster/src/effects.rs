//! Per-glyph paint-time perturbations.
//!
//! Every effect is a pure function of the elapsed time and the glyph index,
//! so two snapshots taken at the same instant paint identically.

use std::f32::consts::TAU;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rune_text::{Effect, Format};

/// Redraw cadence of animated content, and the Vibrate time bucket.
pub const EFFECT_FRAME: Duration = Duration::from_millis(33);

/// Wave cycles per second.
const WAVE_FREQUENCY: f32 = 1.0;
/// Phase step between neighbouring glyphs, in radians.
const WAVE_GLYPH_PHASE: f32 = 0.5;

/// Displacement and opacity applied to one glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPerturbation {
    pub dx: f32,
    pub dy: f32,
    /// Opacity multiplier in `[0, 1]`.
    pub alpha: f32,
}

impl GlyphPerturbation {
    pub const NONE: GlyphPerturbation = GlyphPerturbation {
        dx: 0.0,
        dy: 0.0,
        alpha: 1.0,
    };
}

/// Effect amplitude in pixels; a zero `effect_offset` selects a tenth of the
/// charsize.
fn amplitude(format: &Format) -> f32 {
    if format.effect_offset > 0.0 {
        format.effect_offset
    } else {
        format.charsize as f32 * 0.1
    }
}

pub fn perturbation(format: &Format, glyph_index: usize, elapsed: Duration) -> GlyphPerturbation {
    let amp = amplitude(format);
    let phase = elapsed.as_secs_f32() * WAVE_FREQUENCY * TAU + glyph_index as f32 * WAVE_GLYPH_PHASE;
    match format.effect {
        Effect::None => GlyphPerturbation::NONE,
        Effect::Vibrate => {
            let bucket = (elapsed.as_millis() / EFFECT_FRAME.as_millis()) as u64;
            let mut rng = StdRng::seed_from_u64(bucket.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ glyph_index as u64);
            GlyphPerturbation {
                dx: rng.gen_range(-amp..=amp),
                dy: rng.gen_range(-amp..=amp),
                alpha: 1.0,
            }
        }
        Effect::Waves => GlyphPerturbation {
            dx: 0.0,
            dy: amp * phase.sin(),
            alpha: 1.0,
        },
        Effect::FadingWaves => GlyphPerturbation {
            dx: 0.0,
            dy: amp * phase.sin(),
            alpha: 0.5 + 0.5 * phase.cos(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(effect: Effect) -> Format {
        Format {
            effect,
            effect_offset: 3.0,
            ..Format::default()
        }
    }

    #[test]
    fn no_effect_is_identity() {
        assert_eq!(
            perturbation(&with(Effect::None), 4, Duration::from_millis(500)),
            GlyphPerturbation::NONE
        );
    }

    #[test]
    fn vibrate_is_deterministic_within_a_frame() {
        let format = with(Effect::Vibrate);
        let a = perturbation(&format, 7, Duration::from_millis(100));
        let b = perturbation(&format, 7, Duration::from_millis(120));
        assert_eq!(a, b);
        assert!(a.dx.abs() <= 3.0 && a.dy.abs() <= 3.0);
    }

    #[test]
    fn vibrate_differs_between_glyphs() {
        let format = with(Effect::Vibrate);
        let samples: Vec<_> = (0..8)
            .map(|i| perturbation(&format, i, Duration::from_millis(100)))
            .collect();
        assert!(samples.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn waves_oscillate_vertically() {
        let format = with(Effect::Waves);
        let start = perturbation(&format, 0, Duration::ZERO);
        assert_eq!(start.dy, 0.0);
        let quarter = perturbation(&format, 0, Duration::from_millis(250));
        assert!((quarter.dy - 3.0).abs() < 1e-3);
    }

    #[test]
    fn fading_waves_modulate_alpha() {
        let format = with(Effect::FadingWaves);
        assert!((perturbation(&format, 0, Duration::ZERO).alpha - 1.0).abs() < 1e-6);
        let half = perturbation(&format, 0, Duration::from_millis(500));
        assert!(half.alpha < 1e-3);
    }
}
