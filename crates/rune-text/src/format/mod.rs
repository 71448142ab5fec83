//! Text formats and styled text parts.
//!
//! A [`Format`] is an immutable value describing how a run of text looks:
//! font, size, decorations, colors, effects and the bidi/script tags that
//! are handed to the shaper. Areas store their content as a sequence of
//! [`TextPart`]s, each pairing a string with one format.

pub mod markup;
pub mod patch;

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::bidi;

pub use markup::{parse_markup, unparse_markup};
pub use patch::FormatPatch;

/// A plain 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Color of a text layer: either fixed or computed at paint time.
///
/// Serialized as `"#rrggbb"`, `"rainbow"` or `"rainbow_fixed"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Color {
    Rgb(Rgb),
    /// Hue follows the horizontal pixel position and drifts over time.
    Rainbow,
    /// Hue follows the horizontal pixel position only.
    RainbowFixed,
}

impl Color {
    pub fn is_dynamic(&self) -> bool {
        !matches!(self, Color::Rgb(_))
    }

    /// Whether the color changes between frames at a fixed position.
    pub fn is_time_varying(&self) -> bool {
        matches!(self, Color::Rainbow)
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::Rgb(rgb)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "rainbow" => Ok(Color::Rainbow),
            "rainbow_fixed" => Ok(Color::RainbowFixed),
            other => Rgb::from_hex(other)
                .map(Color::Rgb)
                .ok_or_else(|| format!("unrecognized color '{other}'")),
        }
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        match color {
            Color::Rgb(rgb) => rgb.to_string(),
            Color::Rainbow => "rainbow".to_string(),
            Color::RainbowFixed => "rainbow_fixed".to_string(),
        }
    }
}

/// Horizontal alignment of a line within the area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Per-glyph animation applied at paint time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    #[default]
    None,
    Vibrate,
    Waves,
    FadingWaves,
}

impl Effect {
    pub fn is_animated(&self) -> bool {
        !matches!(self, Effect::None)
    }
}

/// Declared direction of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
    /// Resolved from the first strong character of the run's text.
    Auto,
}

impl Direction {
    /// Resolve `Auto` against the given text. Never returns `Auto`.
    pub fn resolve(self, text: &str) -> Direction {
        match self {
            Direction::Auto => bidi::first_strong_direction(text).unwrap_or(Direction::Ltr),
            resolved => resolved,
        }
    }

    pub fn is_rtl(&self) -> bool {
        matches!(self, Direction::Rtl)
    }
}

/// Full description of how a run of text is shaped and painted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Format {
    /// Font family name or font file path, resolved by the font library.
    pub font: String,
    /// Font size in pixels per em.
    pub charsize: u32,
    pub outline: bool,
    /// Stroke width in pixels when `outline` is set.
    pub outline_size: u32,
    pub shadow: bool,
    /// Shadow displacement in pixels.
    pub shadow_offset: [i32; 2],
    /// Multiplier applied to `charsize` to obtain the line height.
    pub line_spacing: f32,
    pub alignment: Alignment,
    pub effect: Effect,
    /// Amplitude of the effect in pixels.
    pub effect_offset: f32,
    pub text_color: Color,
    pub outline_color: Color,
    pub shadow_color: Color,
    pub alpha: u8,
    /// BCP-47 language tag handed to the shaper.
    pub language: String,
    /// ISO-15924 script tag handed to the shaper.
    pub script: String,
    pub direction: Direction,
    /// Characters eligible as line-break points and word boundaries.
    pub word_dividers: String,
    /// Characters after which the typewriter inserts a short pause.
    pub short_pauses: String,
    /// Characters after which the typewriter inserts a long pause.
    pub long_pauses: String,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            font: "sans-serif".to_string(),
            charsize: 16,
            outline: false,
            outline_size: 1,
            shadow: false,
            shadow_offset: [2, 2],
            line_spacing: 1.0,
            alignment: Alignment::Left,
            effect: Effect::None,
            effect_offset: 0.0,
            text_color: Color::Rgb(Rgb::WHITE),
            outline_color: Color::Rgb(Rgb::BLACK),
            shadow_color: Color::Rgb(Rgb::BLACK),
            alpha: 255,
            language: "en".to_string(),
            script: "Latn".to_string(),
            direction: Direction::Ltr,
            word_dividers: " \t\n".to_string(),
            short_pauses: ",;:".to_string(),
            long_pauses: ".!?".to_string(),
        }
    }
}

impl Format {
    pub fn is_word_divider(&self, ch: char) -> bool {
        ch == '\n' || self.word_dividers.contains(ch)
    }

    /// Line height contributed by glyphs of this format.
    pub fn line_height(&self) -> f32 {
        self.charsize as f32 * self.line_spacing
    }

    /// Whether painting this format differs from frame to frame.
    pub fn is_animated(&self) -> bool {
        self.effect.is_animated()
            || self.text_color.is_time_varying()
            || (self.outline && self.outline_color.is_time_varying())
            || (self.shadow && self.shadow_color.is_time_varying())
    }

    /// Serialize the full format as JSON.
    pub fn to_json(&self) -> String {
        // Format contains only strings, numbers and enums, which always serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A string together with the format it is displayed in.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPart {
    pub text: String,
    pub format: Format,
}

impl TextPart {
    pub fn new(text: impl Into<String>, format: Format) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Canonicalize a part sequence: merge neighbours with equal formats and
/// drop empty parts. At least one part is kept when the input was not empty,
/// so the area always retains a format to lay out an empty line with.
pub fn normalize_parts(parts: Vec<TextPart>) -> Vec<TextPart> {
    let fallback = parts.first().map(|p| p.format.clone());
    let mut out: Vec<TextPart> = Vec::with_capacity(parts.len());
    for part in parts.into_iter().filter(|p| !p.is_empty()) {
        match out.last_mut() {
            Some(last) if last.format == part.format => last.text.push_str(&part.text),
            _ => out.push(part),
        }
    }
    if out.is_empty() {
        if let Some(format) = fallback {
            out.push(TextPart::new(String::new(), format));
        }
    }
    out
}

/// Concatenated text of a part sequence.
pub fn plain_text(parts: &[TextPart]) -> String {
    parts.iter().map(|p| p.text.as_str()).collect()
}
