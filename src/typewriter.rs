//! Progressive reveal of an area's glyphs.

use std::ops::Range;
use std::time::{Duration, Instant};

use rune_config::TypewriterConfig;
use rune_text::{Format, LayoutIndex};

/// How newly parsed text appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintMode {
    /// Everything is visible at once.
    #[default]
    Instant,
    /// Glyphs appear one by one at the configured speed.
    Typewriter,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypewriterSettings {
    pub chars_per_second: f32,
    /// Extra delay after a glyph from the format's `short_pauses`.
    pub short_pause: Duration,
    /// Extra delay after a glyph from the format's `long_pauses`.
    pub long_pause: Duration,
}

impl Default for TypewriterSettings {
    fn default() -> Self {
        Self::from(&TypewriterConfig::default())
    }
}

impl From<&TypewriterConfig> for TypewriterSettings {
    fn from(config: &TypewriterConfig) -> Self {
        Self {
            chars_per_second: config.chars_per_second,
            short_pause: Duration::from_millis(config.short_pause_ms),
            long_pause: Duration::from_millis(config.long_pause_ms),
        }
    }
}

impl TypewriterSettings {
    /// Time budget of one glyph; zero for a non-positive speed, saturating
    /// for speeds too slow to express.
    fn per_glyph(&self) -> Duration {
        if self.chars_per_second > 0.0 {
            Duration::try_from_secs_f64(1.0 / f64::from(self.chars_per_second)).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }

    fn pause_after(&self, ch: char, format: &Format) -> Duration {
        if format.long_pauses.contains(ch) {
            self.long_pause
        } else if format.short_pauses.contains(ch) {
            self.short_pause
        } else {
            Duration::ZERO
        }
    }
}

/// Reveal state driven by caller-supplied instants.
///
/// Time accumulates into a budget between ticks; each glyph costs one
/// per-glyph slot plus the pause owed to the glyph before it.
#[derive(Debug, Clone)]
pub struct Typewriter {
    mode: PrintMode,
    settings: TypewriterSettings,
    revealed: usize,
    budget: Duration,
    last_tick: Option<Instant>,
}

impl Typewriter {
    pub fn new(mode: PrintMode, settings: TypewriterSettings) -> Self {
        Self {
            mode,
            settings,
            revealed: 0,
            budget: Duration::ZERO,
            last_tick: None,
        }
    }

    pub fn mode(&self) -> PrintMode {
        self.mode
    }

    /// Switch modes. Entering typewriter mode starts from an empty reveal.
    pub fn set_mode(&mut self, mode: PrintMode) {
        if self.mode != mode {
            self.mode = mode;
            self.restart();
        }
    }

    pub fn settings(&self) -> &TypewriterSettings {
        &self.settings
    }

    pub fn set_speed(&mut self, chars_per_second: f32) {
        self.settings.chars_per_second = chars_per_second;
    }

    /// Hide everything again and restart pacing at the next tick.
    pub fn restart(&mut self) {
        self.revealed = 0;
        self.budget = Duration::ZERO;
        self.last_tick = None;
    }

    /// Reveal all current glyphs immediately.
    pub fn skip(&mut self, glyph_count: usize) {
        self.revealed = glyph_count;
        self.budget = Duration::ZERO;
    }

    pub fn revealed(&self, glyph_count: usize) -> usize {
        match self.mode {
            PrintMode::Instant => glyph_count,
            PrintMode::Typewriter => self.revealed.min(glyph_count),
        }
    }

    pub fn visible_range(&self, glyph_count: usize) -> Range<usize> {
        0..self.revealed(glyph_count)
    }

    pub fn is_finished(&self, glyph_count: usize) -> bool {
        self.revealed(glyph_count) == glyph_count
    }

    /// Spend the time since the previous tick on revealing glyphs.
    ///
    /// Returns whether the visible range grew.
    pub fn advance(&mut self, now: Instant, index: &LayoutIndex) -> bool {
        if self.mode == PrintMode::Instant {
            return false;
        }
        let total = index.glyph_count();
        let before = self.revealed.min(total);
        self.revealed = before;

        if let Some(last) = self.last_tick.replace(now) {
            self.budget = self.budget.saturating_add(now.saturating_duration_since(last));
        }

        let per_glyph = self.settings.per_glyph();
        let mut owed = Duration::ZERO;
        for (i, run, glyph) in index.iter().skip(before.saturating_sub(1)) {
            if i >= self.revealed {
                let cost = per_glyph.saturating_add(owed);
                if self.budget < cost {
                    break;
                }
                self.budget -= cost;
                self.revealed = i + 1;
            }
            owed = self.settings.pause_after(glyph.ch, run.format());
        }

        if self.revealed >= total {
            self.budget = Duration::ZERO;
        }
        self.revealed != before
    }
}
