//! Paint-time color resolution.

use std::time::Duration;

use palette::{FromColor, Hsv, Srgb};
use rune_text::{Color, Rgb};

/// Hue drift of [`Color::Rainbow`] in degrees per second.
pub const RAINBOW_DEGREES_PER_SECOND: f32 = 120.0;

/// Fully saturated color of the given hue.
pub fn hue_to_rgb(degrees: f32) -> Rgb {
    let hsv: Hsv = Hsv::new(degrees.rem_euclid(360.0), 1.0, 1.0);
    let srgb: Srgb = Srgb::from_color(hsv);
    let rgb: Srgb<u8> = srgb.into_format();
    Rgb::new(rgb.red, rgb.green, rgb.blue)
}

/// Resolve a layer color for a pixel column.
///
/// Rainbow hues span one full turn across the area width; `Rainbow`
/// additionally drifts with the elapsed time.
pub fn resolve(color: Color, x: f32, area_width: u32, elapsed: Duration) -> Rgb {
    let across = || 360.0 * x / area_width.max(1) as f32;
    match color {
        Color::Rgb(rgb) => rgb,
        Color::RainbowFixed => hue_to_rgb(across()),
        Color::Rainbow => hue_to_rgb(across() + elapsed.as_secs_f32() * RAINBOW_DEGREES_PER_SECOND),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_colors_pass_through() {
        let red = Rgb::new(255, 0, 0);
        assert_eq!(resolve(Color::Rgb(red), 50.0, 100, Duration::from_secs(3)), red);
    }

    #[test]
    fn rainbow_fixed_depends_on_x_only() {
        let left = resolve(Color::RainbowFixed, 0.0, 120, Duration::ZERO);
        assert_eq!(left, Rgb::new(255, 0, 0));
        let third = resolve(Color::RainbowFixed, 40.0, 120, Duration::from_secs(7));
        assert_eq!(third, Rgb::new(0, 255, 0));
    }

    #[test]
    fn rainbow_drifts_with_time() {
        let now = resolve(Color::Rainbow, 0.0, 120, Duration::ZERO);
        let later = resolve(Color::Rainbow, 0.0, 120, Duration::from_secs(1));
        assert_eq!(now, Rgb::new(255, 0, 0));
        assert_eq!(later, Rgb::new(0, 255, 0));
    }
}
