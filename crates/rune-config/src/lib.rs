//! Area engine configuration
//!
//! Settings are read from `rune-area.toml` and can be overridden through
//! `RUNE_AREA_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "rune-area.toml";

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "RUNE_AREA_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AreaConfig {
    /// Base format of new areas and font discovery
    pub text: TextConfig,
    /// Progressive reveal pacing
    pub typewriter: TypewriterConfig,
    /// Raster output settings
    pub rendering: RenderingConfig,
    /// Undo history settings
    pub history: HistoryConfig,
}

/// Text configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextConfig {
    /// Font family name or font file path of the base format
    pub font: String,
    /// Base charsize in pixels per em
    pub charsize: u32,
    /// Characters that may end a line and separate words
    pub word_dividers: String,
    /// Line height as a multiple of the charsize
    pub line_spacing: f32,
    /// Extra directories scanned for fonts
    pub font_dirs: Vec<PathBuf>,
    /// Whether installed system fonts are loaded
    pub system_fonts: bool,
}

/// Typewriter configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TypewriterConfig {
    /// Glyphs revealed per second
    pub chars_per_second: f32,
    /// Extra delay after a short pause character (`,;:`)
    pub short_pause_ms: u64,
    /// Extra delay after a long pause character (`.!?`)
    pub long_pause_ms: u64,
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderingConfig {
    /// Redraw cadence of animated content
    pub effect_frame_ms: u64,
    /// Byte order of output pixels: "rgba" or "bgra"
    pub pixel_format: String,
    /// Default margin of new areas in pixels
    pub margin: u32,
    /// Background as "#rrggbb" or "#rrggbbaa"
    pub background: String,
}

/// History configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undoable commands
    pub limit: usize,
    /// Window within which consecutive typing coalesces into one command
    pub merge_window_ms: u64,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font: "sans-serif".to_string(),
            charsize: 16,
            word_dividers: " \t\n".to_string(),
            line_spacing: 1.0,
            font_dirs: Vec::new(),
            system_fonts: false,
        }
    }
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            chars_per_second: 30.0,
            short_pause_ms: 200,
            long_pause_ms: 500,
        }
    }
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            effect_frame_ms: 33,
            pixel_format: "rgba".to_string(),
            margin: 0,
            background: "#00000000".to_string(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: 1000,
            merge_window_ms: 1000,
        }
    }
}

impl RenderingConfig {
    /// Background as RGBA bytes. `None` when the string is malformed.
    pub fn background_rgba(&self) -> Option<[u8; 4]> {
        let hex = self.background.strip_prefix('#')?;
        let byte = |i: usize| hex.get(i..i + 2).and_then(|s| u8::from_str_radix(s, 16).ok());
        match hex.len() {
            6 => Some([byte(0)?, byte(2)?, byte(4)?, 255]),
            8 => Some([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
            _ => None,
        }
    }
}

fn env_value<T: FromStr>(name: &str) -> Option<T> {
    let key = format!("{ENV_PREFIX}{name}");
    let raw = std::env::var(&key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key = %key, raw = %raw, "ignoring unparsable environment override");
            None
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(format!("{ENV_PREFIX}{name}"))
        .ok()
        .map(|val| val == "1" || val.eq_ignore_ascii_case("true"))
}

impl AreaConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `rune-area.toml` from the current directory, falling back to
    /// defaults when it is missing or invalid
    pub fn load_or_default() -> Self {
        match Self::load_from_file(DEFAULT_CONFIG_FILE) {
            Ok(config) => config,
            Err(ConfigError::Read { .. }) => Self::default(),
            Err(err) => {
                tracing::warn!(%err, "using default configuration");
                Self::default()
            }
        }
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        // Text settings
        if let Ok(font) = std::env::var(format!("{ENV_PREFIX}FONT")) {
            self.text.font = font;
        }
        if let Some(charsize) = env_value("CHARSIZE") {
            self.text.charsize = charsize;
        }
        if let Some(spacing) = env_value("LINE_SPACING") {
            self.text.line_spacing = spacing;
        }
        if let Ok(dir) = std::env::var(format!("{ENV_PREFIX}FONT_DIR")) {
            self.text.font_dirs.push(PathBuf::from(dir));
        }
        if let Some(system) = env_flag("SYSTEM_FONTS") {
            self.text.system_fonts = system;
        }

        // Typewriter settings
        if let Some(cps) = env_value("CHARS_PER_SECOND") {
            self.typewriter.chars_per_second = cps;
        }
        if let Some(ms) = env_value("SHORT_PAUSE_MS") {
            self.typewriter.short_pause_ms = ms;
        }
        if let Some(ms) = env_value("LONG_PAUSE_MS") {
            self.typewriter.long_pause_ms = ms;
        }

        // Rendering settings
        if let Some(ms) = env_value("EFFECT_FRAME_MS") {
            self.rendering.effect_frame_ms = ms;
        }
        if let Ok(format) = std::env::var(format!("{ENV_PREFIX}PIXEL_FORMAT")) {
            self.rendering.pixel_format = format;
        }
        if let Some(margin) = env_value("MARGIN") {
            self.rendering.margin = margin;
        }
        if let Ok(background) = std::env::var(format!("{ENV_PREFIX}BACKGROUND")) {
            self.rendering.background = background;
        }

        // History settings
        if let Some(limit) = env_value("HISTORY_LIMIT") {
            self.history.limit = limit;
        }
        if let Some(ms) = env_value("MERGE_WINDOW_MS") {
            self.history.merge_window_ms = ms;
        }
    }

    /// Load `rune-area.toml` (or defaults) and apply environment overrides
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AreaConfig::default();
        assert_eq!(config.text.charsize, 16);
        assert_eq!(config.rendering.effect_frame_ms, 33);
        assert_eq!(config.history.limit, 1000);
        assert_eq!(config.rendering.background_rgba(), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_toml_serialization() {
        let config = AreaConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AreaConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[typewriter]\nchars_per_second = 12.5\n\n[rendering]\nbackground = \"#102030\"").unwrap();

        let config = AreaConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.typewriter.chars_per_second, 12.5);
        assert_eq!(config.typewriter.long_pause_ms, 500);
        assert_eq!(config.rendering.background_rgba(), Some([0x10, 0x20, 0x30, 255]));
        assert_eq!(config.text, TextConfig::default());
    }

    #[test]
    fn test_invalid_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[history]\nlimit = \"lots\"").unwrap();
        assert!(matches!(
            AreaConfig::load_from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AreaConfig::load_from_file(dir.path().join("absent.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_merge_with_env() {
        unsafe {
            std::env::set_var("RUNE_AREA_HISTORY_LIMIT", "5");
            std::env::set_var("RUNE_AREA_PIXEL_FORMAT", "bgra");
            std::env::set_var("RUNE_AREA_MERGE_WINDOW_MS", "soon");
        }

        let mut config = AreaConfig::default();
        config.merge_with_env();

        assert_eq!(config.history.limit, 5);
        assert_eq!(config.rendering.pixel_format, "bgra");
        assert_eq!(config.history.merge_window_ms, 1000);

        unsafe {
            std::env::remove_var("RUNE_AREA_HISTORY_LIMIT");
            std::env::remove_var("RUNE_AREA_PIXEL_FORMAT");
            std::env::remove_var("RUNE_AREA_MERGE_WINDOW_MS");
        }
    }

    #[test]
    fn test_malformed_background() {
        let rendering = RenderingConfig {
            background: "blue".to_string(),
            ..RenderingConfig::default()
        };
        assert_eq!(rendering.background_rgba(), None);
    }
}
