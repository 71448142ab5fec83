//! The host-facing context: backends, areas, focus and undo history.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hashbrown::HashMap;
use rune_config::AreaConfig;
use rune_raster::{BlockRasterizer, GlyphCache, GlyphRasterizer, SwashRasterizer};
use rune_text::{Command, EditRecord, FontLibrary, HarfrustShaper, History, Movement, Shaper, SimpleShaper};

use crate::area::{Area, AreaId, AreaSettings};
use crate::error::{AreaError, Result};

/// Owns every area and the backends they share.
///
/// Editing operations address the focused area and record undoable
/// commands in one history shared by all areas.
#[derive(Debug)]
pub struct Context {
    config: AreaConfig,
    shaper: Arc<dyn Shaper>,
    cache: Arc<GlyphCache>,
    areas: HashMap<AreaId, Area>,
    next_id: u32,
    focus: Option<AreaId>,
    history: History<AreaId>,
}

impl Context {
    /// A context with the font-less backends.
    pub fn new(config: AreaConfig) -> Self {
        Self::with_backends(config, Arc::new(SimpleShaper::new()), Arc::new(BlockRasterizer))
    }

    pub fn with_backends(config: AreaConfig, shaper: Arc<dyn Shaper>, rasterizer: Arc<dyn GlyphRasterizer>) -> Self {
        let mut history = History::with_limit(config.history.limit);
        history.set_merge_window(Duration::from_millis(config.history.merge_window_ms));
        Self {
            config,
            shaper,
            cache: Arc::new(GlyphCache::new(rasterizer)),
            areas: HashMap::new(),
            next_id: 1,
            focus: None,
            history,
        }
    }

    /// A context shaping with harfrust and rendering with swash, using the
    /// fonts named by the configuration.
    pub fn with_fonts(config: AreaConfig) -> Self {
        let mut fonts = if config.text.system_fonts {
            FontLibrary::with_system_fonts()
        } else {
            FontLibrary::new()
        };
        for dir in &config.text.font_dirs {
            fonts.load_fonts_dir(dir);
        }
        tracing::debug!(faces = fonts.face_count(), "font library loaded");
        let fonts = Arc::new(fonts);
        Self::with_backends(
            config,
            Arc::new(HarfrustShaper::new(fonts.clone())),
            Arc::new(SwashRasterizer::new(fonts)),
        )
    }

    pub fn config(&self) -> &AreaConfig {
        &self.config
    }

    /// Area settings seeded from the configuration.
    pub fn area_settings(&self) -> Result<AreaSettings> {
        AreaSettings::from_config(&self.config)
    }

    pub fn create_area(&mut self, settings: AreaSettings) -> Result<AreaId> {
        let area = Area::new(settings, self.shaper.clone(), self.cache.clone())?;
        let id = AreaId::new(self.next_id);
        self.next_id += 1;
        self.areas.insert(id, area);
        tracing::debug!(%id, "area created");
        Ok(id)
    }

    /// Destroy an area, dropping its focus and its history entries.
    pub fn destroy_area(&mut self, id: AreaId) -> Result<()> {
        let mut area = self.areas.remove(&id).ok_or(AreaError::NotFound(id))?;
        area.cancel_raster();
        if self.focus == Some(id) {
            self.focus = None;
        }
        self.history.forget_area(&id);
        tracing::debug!(%id, "area destroyed");
        Ok(())
    }

    pub fn area(&self, id: AreaId) -> Result<&Area> {
        self.areas.get(&id).ok_or(AreaError::NotFound(id))
    }

    pub fn area_mut(&mut self, id: AreaId) -> Result<&mut Area> {
        self.areas.get_mut(&id).ok_or(AreaError::NotFound(id))
    }

    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    pub fn focus(&mut self, id: AreaId) -> Result<()> {
        if !self.areas.contains_key(&id) {
            return Err(AreaError::NotFound(id));
        }
        self.unfocus();
        self.focus = Some(id);
        if let Some(area) = self.areas.get_mut(&id) {
            area.set_focused(true);
        }
        Ok(())
    }

    pub fn unfocus(&mut self) {
        if let Some(area) = self.focus.take().and_then(|id| self.areas.get_mut(&id)) {
            area.set_focused(false);
        }
    }

    pub fn focused(&self) -> Option<AreaId> {
        self.focus
    }

    fn focused_area(&mut self) -> Result<(AreaId, &mut Area)> {
        let id = self.focus.ok_or(AreaError::NoFocus)?;
        let area = self.areas.get_mut(&id).ok_or(AreaError::NotFound(id))?;
        Ok((id, area))
    }

    fn record(&mut self, area: AreaId, record: Option<EditRecord>) -> bool {
        let Some(EditRecord { kind, before, after }) = record else {
            return false;
        };
        self.history.push(Command {
            kind,
            area,
            before,
            after,
        });
        true
    }

    pub fn cursor_place(&mut self, x: f32, y: f32) -> Result<()> {
        self.focused_area()?.1.place_cursor(x, y)
    }

    pub fn cursor_move(&mut self, movement: Movement) -> Result<()> {
        self.focused_area()?.1.move_cursor(movement)
    }

    /// Hold (or release) the selection anchor, as while shift is pressed.
    pub fn lock_selection(&mut self, locked: bool) -> Result<()> {
        self.focused_area()?.1.lock_selection(locked);
        Ok(())
    }

    pub fn select(&mut self, anchor: usize, cursor: usize) -> Result<()> {
        self.focused_area()?.1.select(anchor, cursor)
    }

    pub fn select_all(&mut self) -> Result<()> {
        self.focused_area()?.1.select_all()
    }

    /// Type `text` at the cursor. Returns whether anything changed.
    pub fn insert_text(&mut self, text: &str) -> Result<bool> {
        let (id, area) = self.focused_area()?;
        let record = area.insert_text(text)?;
        Ok(self.record(id, record))
    }

    pub fn paste(&mut self, text: &str) -> Result<bool> {
        let (id, area) = self.focused_area()?;
        let record = area.paste(text)?;
        Ok(self.record(id, record))
    }

    pub fn delete_text(&mut self, movement: Movement) -> Result<bool> {
        let (id, area) = self.focused_area()?;
        let record = area.delete_text(movement)?;
        Ok(self.record(id, record))
    }

    pub fn format_selection_json(&mut self, json: &str) -> Result<bool> {
        let (id, area) = self.focused_area()?;
        let record = area.format_selection_json(json)?;
        Ok(self.record(id, record))
    }

    /// Revert the latest command in whichever area it touched.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(command) = self.history.undo() else {
            return Ok(false);
        };
        self.area_mut(command.area)?.restore(&command.before)?;
        Ok(true)
    }

    pub fn redo(&mut self) -> Result<bool> {
        let Some(command) = self.history.redo() else {
            return Ok(false);
        };
        self.area_mut(command.area)?.restore(&command.after)?;
        Ok(true)
    }

    pub fn history(&self) -> &History<AreaId> {
        &self.history
    }

    /// Update every area. All areas are updated even when one fails; the
    /// first failure is returned.
    pub fn update_all(&mut self, now: Instant) -> Result<()> {
        let mut first_error = None;
        for (id, area) in self.areas.iter_mut() {
            if let Err(err) = area.update(now) {
                tracing::warn!(%id, %err, "area update failed");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Cancel and join every raster job in flight.
    pub fn cancel_all(&mut self) {
        for area in self.areas.values_mut() {
            area.cancel_raster();
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(AreaConfig::default())
    }
}
