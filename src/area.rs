//! One text area: an editor, its raster scheduler and reveal state.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rune_config::AreaConfig;
use rune_raster::{DrawParameters, EFFECT_FRAME, GlyphCache, PixelFormat, PixelSurface, RasterError, RasterScheduler, Rgba8};
use rune_text::{
    CursorBlink, EditRecord, Editor, Format, FormatPatch, LayoutConstraints, Movement, Shaper, Sizing, Snapshot,
};

use crate::error::Result;
use crate::typewriter::{PrintMode, Typewriter, TypewriterSettings};

/// Handle of an area inside a [`Context`](crate::Context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AreaId(u32);

impl AreaId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything needed to create an area.
#[derive(Debug, Clone)]
pub struct AreaSettings {
    pub sizing: Sizing,
    pub margin: u32,
    pub base_format: Format,
    pub print_mode: PrintMode,
    pub typewriter: TypewriterSettings,
    pub background: Rgba8,
    pub cursor_color: Rgba8,
    pub pixel_format: PixelFormat,
    /// Redraw cadence of animated formats.
    pub effect_frame: Duration,
}

impl Default for AreaSettings {
    fn default() -> Self {
        Self {
            sizing: Sizing::AutoWrap {
                min_width: 0,
                max_width: None,
            },
            margin: 0,
            base_format: Format::default(),
            print_mode: PrintMode::Instant,
            typewriter: TypewriterSettings::default(),
            background: Rgba8::TRANSPARENT,
            cursor_color: Rgba8::new(255, 255, 255, 255),
            pixel_format: PixelFormat::Rgba,
            effect_frame: EFFECT_FRAME,
        }
    }
}

impl AreaSettings {
    /// Settings seeded from the configuration's text, typewriter and
    /// rendering sections.
    pub fn from_config(config: &AreaConfig) -> Result<Self> {
        let background = match config.rendering.background_rgba() {
            Some([r, g, b, a]) => Rgba8::new(r, g, b, a),
            None => {
                tracing::warn!(background = %config.rendering.background, "unparsable background, using transparent");
                Rgba8::TRANSPARENT
            }
        };
        Ok(Self {
            margin: config.rendering.margin,
            base_format: Format {
                font: config.text.font.clone(),
                charsize: config.text.charsize,
                word_dividers: config.text.word_dividers.clone(),
                line_spacing: config.text.line_spacing,
                ..Format::default()
            },
            typewriter: TypewriterSettings::from(&config.typewriter),
            background,
            pixel_format: config.rendering.pixel_format.parse()?,
            effect_frame: Duration::from_millis(config.rendering.effect_frame_ms),
            ..Self::default()
        })
    }

    pub fn fixed(mut self, width: u32, height: u32) -> Self {
        self.sizing = Sizing::Fixed { width, height };
        self
    }

    pub fn auto_wrap(mut self, min_width: u32, max_width: Option<u32>) -> Self {
        self.sizing = Sizing::AutoWrap { min_width, max_width };
        self
    }

    fn constraints(&self) -> LayoutConstraints {
        LayoutConstraints {
            sizing: self.sizing,
            margin: self.margin,
        }
    }
}

/// A rich-text area.
///
/// Every change marks the area dirty and cancels the raster job in flight;
/// [`update`](Area::update) submits a new job and promotes finished ones.
#[derive(Debug)]
pub struct Area {
    editor: Editor,
    scheduler: RasterScheduler,
    typewriter: Typewriter,
    blink: CursorBlink,
    focused: bool,
    background: Rgba8,
    cursor_color: Rgba8,
    pixel_format: PixelFormat,
    effect_frame: Duration,
    created: Instant,
    last_update: Option<Instant>,
    last_frame: Option<Instant>,
    dirty: bool,
}

impl Area {
    pub fn new(settings: AreaSettings, shaper: Arc<dyn Shaper>, cache: Arc<GlyphCache>) -> Result<Self> {
        let editor = Editor::new(shaper, settings.base_format.clone(), settings.constraints())?;
        Ok(Self {
            editor,
            scheduler: RasterScheduler::new(cache),
            typewriter: Typewriter::new(settings.print_mode, settings.typewriter),
            blink: CursorBlink::default(),
            focused: false,
            background: settings.background,
            cursor_color: settings.cursor_color,
            pixel_format: settings.pixel_format,
            effect_frame: settings.effect_frame,
            created: Instant::now(),
            last_update: None,
            last_frame: None,
            dirty: true,
        })
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn width(&self) -> u32 {
        self.editor.layout().width()
    }

    pub fn height(&self) -> u32 {
        self.editor.layout().height()
    }

    fn invalidate(&mut self) {
        self.dirty = true;
        self.scheduler.cancel();
    }

    fn set_constraints(&mut self, constraints: LayoutConstraints) -> Result<()> {
        self.editor.set_constraints(constraints)?;
        self.invalidate();
        Ok(())
    }

    /// Switch to a fixed size.
    pub fn set_dimensions(&mut self, width: u32, height: u32) -> Result<()> {
        let margin = self.editor.layout().margin();
        self.set_constraints(LayoutConstraints {
            sizing: Sizing::Fixed { width, height },
            margin,
        })
    }

    /// Switch to a size that follows the content.
    pub fn set_auto_wrap(&mut self, min_width: u32, max_width: Option<u32>) -> Result<()> {
        let margin = self.editor.layout().margin();
        self.set_constraints(LayoutConstraints {
            sizing: Sizing::AutoWrap { min_width, max_width },
            margin,
        })
    }

    pub fn set_margin(&mut self, margin: u32) -> Result<()> {
        let sizing = self.editor.layout().constraints().sizing;
        self.set_constraints(LayoutConstraints { sizing, margin })
    }

    /// Patch the base format and every part with a JSON format object.
    pub fn set_format_json(&mut self, json: &str) -> Result<EditRecord> {
        let patch = FormatPatch::from_json(json)?;
        let record = self.editor.set_base_format(&patch)?;
        self.invalidate();
        Ok(record)
    }

    /// The base format as JSON.
    pub fn format_json(&self) -> String {
        self.editor.base_format().to_json()
    }

    pub fn format_selection_json(&mut self, json: &str) -> Result<Option<EditRecord>> {
        let patch = FormatPatch::from_json(json)?;
        let record = self.editor.format_selection(&patch)?;
        if record.is_some() {
            self.invalidate();
        }
        Ok(record)
    }

    /// Replace the content with parsed markup. In typewriter mode the new
    /// text is revealed from the start.
    pub fn parse(&mut self, markup: &str) -> Result<()> {
        self.editor.parse(markup)?;
        self.typewriter.restart();
        self.invalidate();
        Ok(())
    }

    pub fn unparse(&self) -> Result<String> {
        Ok(self.editor.unparse()?)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.editor.clear()?;
        self.typewriter.restart();
        self.invalidate();
        Ok(())
    }

    /// Scroll by `delta` pixels, clamped to the content. Returns whether
    /// the offset moved.
    pub fn scroll(&mut self, delta: f32) -> bool {
        let moved = self.editor.scroll(delta);
        if moved {
            self.invalidate();
        }
        moved
    }

    pub fn print_mode(&self) -> PrintMode {
        self.typewriter.mode()
    }

    pub fn set_print_mode(&mut self, mode: PrintMode) {
        self.typewriter.set_mode(mode);
        self.invalidate();
    }

    pub fn set_typewriter_speed(&mut self, chars_per_second: f32) {
        self.typewriter.set_speed(chars_per_second);
    }

    /// Reveal all remaining text at once.
    pub fn skip_typewriter(&mut self) {
        self.typewriter.skip(self.editor.glyph_count());
        self.invalidate();
    }

    pub fn typewriter_finished(&self) -> bool {
        self.typewriter.is_finished(self.editor.glyph_count())
    }

    pub fn revealed_glyphs(&self) -> usize {
        self.typewriter.revealed(self.editor.glyph_count())
    }

    pub fn set_background(&mut self, background: Rgba8) {
        self.background = background;
        self.invalidate();
    }

    pub fn set_cursor_color(&mut self, color: Rgba8) {
        self.cursor_color = color;
        self.invalidate();
    }

    pub fn set_pixel_format(&mut self, format: PixelFormat) {
        self.pixel_format = format;
        self.invalidate();
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub(crate) fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.blink.reset();
        self.invalidate();
    }

    fn is_animated(&self) -> bool {
        self.editor
            .layout()
            .index()
            .runs()
            .iter()
            .any(|run| run.format().is_animated())
    }

    fn draw_parameters(&self, now: Instant) -> DrawParameters {
        let layout = self.editor.layout().clone();
        let glyph_count = layout.glyph_count();
        let show_cursor = self.focused && self.blink.is_visible() && self.typewriter.is_finished(glyph_count);
        DrawParameters {
            glyph_range: self.typewriter.visible_range(glyph_count),
            cursor: show_cursor.then(|| self.editor.cursor_rect()),
            cursor_color: self.cursor_color,
            background: self.background,
            pixel_format: self.pixel_format,
            elapsed: now.saturating_duration_since(self.created),
            layout,
        }
    }

    /// Advance time-driven state to `now`, collect a finished raster job and
    /// start a new one when something changed.
    ///
    /// A failed job leaves the previous surface current and is reported
    /// here; cancelled jobs are not errors.
    pub fn update(&mut self, now: Instant) -> Result<()> {
        let collected = self.scheduler.poll();

        let delta = self
            .last_update
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_update = Some(now);
        if self.focused && self.blink.advance(delta) {
            self.dirty = true;
        }
        if self.typewriter.advance(now, self.editor.layout().index()) {
            self.dirty = true;
        }

        // A job in flight is only superseded by edits, which cancel it
        // through `invalidate`. Ticks wait for it and keep the area dirty.
        let frame_due = self
            .last_frame
            .is_none_or(|last| now.saturating_duration_since(last) >= self.effect_frame);
        let animate = frame_due && self.is_animated();
        if !self.scheduler.is_running() && (self.dirty || animate) {
            let params = self.draw_parameters(now);
            self.scheduler.submit(params);
            self.dirty = false;
            self.last_frame = Some(now);
        }

        match collected {
            None | Some(Ok(())) | Some(Err(RasterError::Cancelled)) => Ok(()),
            Some(Err(err)) => Err(err.into()),
        }
    }

    /// Submit pending changes and block until the raster job finishes.
    pub fn finish_raster(&mut self) -> Result<()> {
        if self.dirty {
            let now = self.last_update.unwrap_or_else(Instant::now);
            let params = self.draw_parameters(now);
            self.scheduler.submit(params);
            self.dirty = false;
            self.last_frame = Some(now);
        }
        match self.scheduler.finish() {
            None | Some(Ok(())) => Ok(()),
            Some(Err(err)) => Err(err.into()),
        }
    }

    /// Cancel and join the raster job in flight. The frame is submitted
    /// again by the next update.
    pub fn cancel_raster(&mut self) -> bool {
        let cancelled = self.scheduler.cancel();
        if cancelled {
            self.dirty = true;
        }
        cancelled
    }

    pub fn is_rasterizing(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn pixels_were_changed(&self) -> bool {
        self.scheduler.pixels_were_changed()
    }

    /// The latest finished frame. Clears the change flag.
    pub fn pixels(&mut self) -> &PixelSurface {
        self.scheduler.pixels()
    }

    fn cursor_changed(&mut self) {
        self.blink.reset();
        self.invalidate();
    }

    fn content_changed(&mut self, record: Option<EditRecord>) -> Option<EditRecord> {
        if record.is_some() {
            self.typewriter.skip(self.editor.glyph_count());
            self.cursor_changed();
        }
        record
    }

    pub fn place_cursor(&mut self, x: f32, y: f32) -> Result<()> {
        self.editor.place_cursor(x, y)?;
        self.cursor_changed();
        Ok(())
    }

    pub fn move_cursor(&mut self, movement: Movement) -> Result<()> {
        self.editor.move_cursor(movement)?;
        self.cursor_changed();
        Ok(())
    }

    pub fn select(&mut self, anchor: usize, cursor: usize) -> Result<()> {
        self.editor.set_selection(anchor, cursor)?;
        self.cursor_changed();
        Ok(())
    }

    pub fn select_all(&mut self) -> Result<()> {
        self.editor.select_all()?;
        self.cursor_changed();
        Ok(())
    }

    pub fn lock_selection(&mut self, locked: bool) {
        self.editor.lock_selection(locked);
    }

    pub fn insert_text(&mut self, text: &str) -> Result<Option<EditRecord>> {
        let record = self.editor.insert_text(text)?;
        Ok(self.content_changed(record))
    }

    pub fn paste(&mut self, text: &str) -> Result<Option<EditRecord>> {
        let record = self.editor.paste(text)?;
        Ok(self.content_changed(record))
    }

    pub fn delete_text(&mut self, movement: Movement) -> Result<Option<EditRecord>> {
        let record = self.editor.delete_text(movement)?;
        Ok(self.content_changed(record))
    }

    /// Return to a recorded state, as for undo and redo.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.editor.restore(snapshot)?;
        self.typewriter.skip(self.editor.glyph_count());
        self.cursor_changed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use rune_raster::{BlockRasterizer, GlyphBitmap, GlyphKey, GlyphRasterizer};
    use rune_text::SimpleShaper;

    use super::*;

    fn area(settings: AreaSettings) -> Area {
        Area::new(
            settings,
            Arc::new(SimpleShaper::with_ratio(1.0)),
            Arc::new(GlyphCache::new(Arc::new(BlockRasterizer))),
        )
        .unwrap()
    }

    fn settings() -> AreaSettings {
        AreaSettings {
            base_format: Format {
                charsize: 10,
                ..Format::default()
            },
            background: Rgba8::new(0, 0, 0, 255),
            ..AreaSettings::default()
        }
        .fixed(100, 40)
    }

    /// Holds every glyph until the gate opens (or two seconds pass).
    #[derive(Debug)]
    struct GatedRasterizer {
        open: Arc<AtomicBool>,
    }

    impl GlyphRasterizer for GatedRasterizer {
        fn rasterize(&self, key: &GlyphKey) -> rune_raster::Result<GlyphBitmap> {
            let deadline = Instant::now() + Duration::from_secs(2);
            while !self.open.load(Ordering::Acquire) && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(1));
            }
            BlockRasterizer.rasterize(key)
        }
    }

    #[test]
    fn finish_raster_produces_a_frame() {
        let mut area = area(settings());
        area.parse("hi").unwrap();
        area.finish_raster().unwrap();
        assert!(area.pixels_were_changed());
        let pixels = area.pixels();
        assert_eq!((pixels.width(), pixels.height()), (100, 40));
        assert_eq!(pixels.pixel(2, 4), Some(Rgba8::new(255, 255, 255, 255)));
        assert!(!area.pixels_were_changed());
    }

    #[test]
    fn zero_fixed_size_is_rejected() {
        let mut area = area(settings());
        assert!(area.set_dimensions(0, 10).is_err());
        assert_eq!(area.width(), 100);
    }

    #[test]
    fn auto_wrap_grows_with_content() {
        let mut area = area(settings().auto_wrap(20, Some(60)));
        area.parse("abc").unwrap();
        assert_eq!(area.width(), 30);
        area.parse("abcdefghij").unwrap();
        assert_eq!(area.width(), 60);
        assert_eq!(area.height(), 20);
    }

    #[test]
    fn base_format_round_trips_as_json() {
        let mut area = area(settings());
        area.set_format_json(r#"{"charsize": 12}"#).unwrap();
        assert!(area.format_json().contains("\"charsize\":12"));
        assert!(area.set_format_json(r#"{"size": 12}"#).is_err());
    }

    #[test]
    fn typewriter_mode_reveals_over_updates() {
        let mut area = area(AreaSettings {
            print_mode: PrintMode::Typewriter,
            typewriter: TypewriterSettings {
                chars_per_second: 10.0,
                ..TypewriterSettings::default()
            },
            ..settings()
        });
        area.parse("hello").unwrap();
        let t0 = Instant::now();
        area.update(t0).unwrap();
        assert_eq!(area.revealed_glyphs(), 0);
        area.update(t0 + Duration::from_millis(350)).unwrap();
        assert_eq!(area.revealed_glyphs(), 3);
        area.skip_typewriter();
        assert!(area.typewriter_finished());
        area.finish_raster().unwrap();
    }

    #[test]
    fn scroll_is_clamped() {
        let mut area = area(settings());
        area.parse("a\nb\nc\nd\ne\nf").unwrap();
        assert!(area.scroll(1000.0));
        assert!(!area.scroll(10.0));
        assert!(area.scroll(-5.0));
    }

    #[test]
    fn reveal_ticks_wait_for_the_running_job() {
        let open = Arc::new(AtomicBool::new(false));
        let mut area = Area::new(
            AreaSettings {
                print_mode: PrintMode::Typewriter,
                typewriter: TypewriterSettings {
                    chars_per_second: 100.0,
                    ..TypewriterSettings::default()
                },
                ..settings()
            },
            Arc::new(SimpleShaper::with_ratio(1.0)),
            Arc::new(GlyphCache::new(Arc::new(GatedRasterizer { open: open.clone() }))),
        )
        .unwrap();
        area.parse("abcd").unwrap();
        let t0 = Instant::now();
        area.update(t0).unwrap();
        area.finish_raster().unwrap();
        area.pixels();

        // Two glyphs revealed; their job blocks on the gate.
        area.update(t0 + Duration::from_millis(25)).unwrap();
        assert!(area.is_rasterizing());

        // The next reveal must not cancel the job in flight.
        let now = t0 + Duration::from_millis(45);
        area.update(now).unwrap();
        assert_eq!(area.revealed_glyphs(), 4);
        assert!(area.is_rasterizing());

        open.store(true, Ordering::Release);
        let deadline = Instant::now() + Duration::from_secs(10);
        while !area.pixels_were_changed() {
            assert!(Instant::now() < deadline, "no frame was produced");
            std::thread::sleep(Duration::from_millis(1));
            area.update(now).unwrap();
        }
        let pixels = area.pixels();
        assert_eq!(pixels.pixel(12, 4), Some(Rgba8::new(255, 255, 255, 255)));
        assert_eq!(pixels.pixel(22, 4), Some(Rgba8::new(0, 0, 0, 255)));

        area.finish_raster().unwrap();
        assert_eq!(area.pixels().pixel(22, 4), Some(Rgba8::new(255, 255, 255, 255)));
    }
}
