use std::sync::Arc;

use crate::error::{Result, TextError};
use crate::format::TextPart;
use crate::layout::run::{GlyphRecord, RunBuffer};

/// Flat glyph address space over an ordered list of runs.
///
/// Glyph `i` lives in the run whose cumulative glyph range contains it.
/// Runs are shared behind `Arc`, so cloning the index for a raster
/// snapshot only bumps reference counts.
#[derive(Debug, Clone, Default)]
pub struct LayoutIndex {
    runs: Vec<Arc<RunBuffer>>,
    glyph_count: usize,
}

/// Position of a glyph inside its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphLocation {
    pub run: usize,
    pub local: usize,
    /// Flat index of the run's first glyph.
    pub run_start: usize,
}

impl LayoutIndex {
    pub fn new(runs: Vec<Arc<RunBuffer>>) -> Self {
        let mut index = Self::default();
        index.update(runs);
        index
    }

    /// Rebuild the view. Empty runs are dropped unless every run is empty,
    /// in which case the first one is kept so the base format survives.
    pub fn update(&mut self, runs: Vec<Arc<RunBuffer>>) {
        let first = runs.first().cloned();
        let mut runs: Vec<_> = runs.into_iter().filter(|run| run.glyph_count() > 0).collect();
        if runs.is_empty() {
            runs.extend(first);
        }
        self.glyph_count = runs.iter().map(|run| run.glyph_count()).sum();
        self.runs = runs;
    }

    pub fn glyph_count(&self) -> usize {
        self.glyph_count
    }

    pub fn runs(&self) -> &[Arc<RunBuffer>] {
        &self.runs
    }

    pub fn is_empty(&self) -> bool {
        self.glyph_count == 0
    }

    pub fn locate(&self, cursor: usize) -> Result<GlyphLocation> {
        let mut run_start = 0;
        for (run, buffer) in self.runs.iter().enumerate() {
            let count = buffer.glyph_count();
            if cursor < run_start + count {
                return Ok(GlyphLocation {
                    run,
                    local: cursor - run_start,
                    run_start,
                });
            }
            run_start += count;
        }
        Err(TextError::OutOfBounds {
            what: "glyph",
            index: cursor,
            len: self.glyph_count,
        })
    }

    pub fn glyph(&self, cursor: usize) -> Result<&GlyphRecord> {
        let location = self.locate(cursor)?;
        Ok(&self.runs[location.run].glyphs()[location.local])
    }

    pub fn run(&self, cursor: usize) -> Result<&RunBuffer> {
        let location = self.locate(cursor)?;
        Ok(&self.runs[location.run])
    }

    pub fn char_at(&self, cursor: usize) -> Result<char> {
        self.glyph(cursor).map(|glyph| glyph.ch)
    }

    /// Whether the glyph at `cursor` belongs to a left-to-right run.
    pub fn is_ltr_at(&self, cursor: usize) -> Result<bool> {
        self.run(cursor).map(|run| !run.is_rtl())
    }

    /// Paragraph direction, taken from the first run.
    pub fn is_ltr(&self) -> bool {
        self.runs.first().is_none_or(|run| !run.is_rtl())
    }

    /// Iterate `(flat index, run, glyph)` in logical order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &RunBuffer, &GlyphRecord)> {
        self.runs
            .iter()
            .flat_map(|run| run.glyphs().iter().map(move |glyph| (run.as_ref(), glyph)))
            .enumerate()
            .map(|(index, (run, glyph))| (index, run, glyph))
    }

    pub fn to_parts(&self) -> Vec<TextPart> {
        self.runs.iter().map(|run| run.part().clone()).collect()
    }
}
