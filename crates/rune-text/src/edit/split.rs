use core::ops::Range;
use std::sync::Arc;

use crate::error::Result;
use crate::format::{FormatPatch, TextPart, normalize_parts};
use crate::layout::RunBuffer;

/// Runs cut around a deleted glyph range.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionSplit {
    /// Surviving text, one part per input run (possibly empty).
    pub kept: Vec<TextPart>,
    /// Removed text in its original formats.
    pub removed: Vec<TextPart>,
    /// Number of glyphs removed.
    pub removed_glyphs: usize,
    /// Part index in `kept` and byte offset where the range started.
    pub insertion_point: (usize, usize),
}

impl DeletionSplit {
    /// Kept parts in canonical form, ready to re-shape.
    pub fn into_parts(self) -> Vec<TextPart> {
        normalize_parts(self.kept)
    }

    /// Kept parts with `text` inserted where the deleted range was.
    pub fn into_parts_with(mut self, text: &str) -> Vec<TextPart> {
        let (part, byte) = self.insertion_point;
        if let Some(part) = self.kept.get_mut(part) {
            part.text.insert_str(byte, text);
        }
        normalize_parts(self.kept)
    }
}

/// Split the runs into kept and removed text at cluster boundaries.
///
/// Returns `None` when the range covers no glyph.
pub fn split_deletion(runs: &[Arc<RunBuffer>], range: Range<usize>) -> Result<Option<DeletionSplit>> {
    let mut kept = Vec::with_capacity(runs.len());
    let mut removed = Vec::new();
    let mut removed_glyphs = 0;
    let mut insertion_point = None;
    let mut run_start = 0;

    for run in runs {
        let count = run.glyph_count();
        let a = range.start.clamp(run_start, run_start + count) - run_start;
        let b = range.end.clamp(run_start, run_start + count) - run_start;
        let a_byte = run.cluster_index(a)?;
        let b_byte = run.cluster_index(b)?;

        if insertion_point.is_none() && range.start < run_start + count {
            insertion_point = Some((kept.len(), a_byte));
        }

        let text = run.text();
        let mut survivor = String::with_capacity(text.len() - (b_byte - a_byte));
        survivor.push_str(&text[..a_byte]);
        survivor.push_str(&text[b_byte..]);
        kept.push(TextPart::new(survivor, run.format().clone()));

        if b > a {
            removed.push(TextPart::new(&text[a_byte..b_byte], run.format().clone()));
            removed_glyphs += b - a;
        }
        run_start += count;
    }

    if removed_glyphs == 0 {
        return Ok(None);
    }

    Ok(Some(DeletionSplit {
        kept,
        removed,
        removed_glyphs,
        insertion_point: insertion_point.unwrap_or((0, 0)),
    }))
}

/// Apply `patch` to the glyphs in `range`, splitting runs at its edges.
pub fn split_formatting(runs: &[Arc<RunBuffer>], range: Range<usize>, patch: &FormatPatch) -> Result<Vec<TextPart>> {
    let mut parts = Vec::with_capacity(runs.len() + 2);
    let mut run_start = 0;

    for run in runs {
        let count = run.glyph_count();
        let a = range.start.clamp(run_start, run_start + count) - run_start;
        let b = range.end.clamp(run_start, run_start + count) - run_start;
        let text = run.text();
        let format = run.format();

        if a == b {
            parts.push(run.part().clone());
        } else {
            let a_byte = run.cluster_index(a)?;
            let b_byte = run.cluster_index(b)?;
            parts.push(TextPart::new(&text[..a_byte], format.clone()));
            parts.push(TextPart::new(&text[a_byte..b_byte], patch.apply(format)));
            parts.push(TextPart::new(&text[b_byte..], format.clone()));
        }
        run_start += count;
    }

    Ok(normalize_parts(parts))
}

/// Text of the glyphs in `range`.
pub fn text_in(runs: &[Arc<RunBuffer>], range: Range<usize>) -> Result<String> {
    let mut out = String::new();
    let mut run_start = 0;
    for run in runs {
        let count = run.glyph_count();
        let a = range.start.clamp(run_start, run_start + count) - run_start;
        let b = range.end.clamp(run_start, run_start + count) - run_start;
        if b > a {
            out.push_str(&run.text()[run.cluster_index(a)?..run.cluster_index(b)?]);
        }
        run_start += count;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use crate::shaping::SimpleShaper;

    fn bold() -> Format {
        Format {
            outline: true,
            ..Format::default()
        }
    }

    fn runs(parts: &[(&str, Format)]) -> Vec<Arc<RunBuffer>> {
        let shaper = SimpleShaper::new();
        parts
            .iter()
            .map(|(text, format)| Arc::new(RunBuffer::new(TextPart::new(*text, format.clone()), &shaper).unwrap()))
            .collect()
    }

    #[test]
    fn deletion_across_runs() {
        let runs = runs(&[("hello", Format::default()), ("world", bold())]);
        let split = split_deletion(&runs, 3..7).unwrap().unwrap();
        assert_eq!(split.removed_glyphs, 4);
        assert_eq!(
            split.removed,
            vec![TextPart::new("lo", Format::default()), TextPart::new("wo", bold())]
        );
        assert_eq!(split.insertion_point, (0, 3));
        assert_eq!(
            split.into_parts(),
            vec![TextPart::new("hel", Format::default()), TextPart::new("rld", bold())]
        );
    }

    #[test]
    fn whole_run_deletion_drops_it() {
        let runs = runs(&[("ab", Format::default()), ("cd", bold()), ("ef", Format::default())]);
        let split = split_deletion(&runs, 2..4).unwrap().unwrap();
        assert_eq!(split.into_parts(), vec![TextPart::new("abef", Format::default())]);
    }

    #[test]
    fn insertion_replaces_in_the_selected_format() {
        let runs = runs(&[("ab", Format::default()), ("cd", bold())]);
        let split = split_deletion(&runs, 2..4).unwrap().unwrap();
        assert_eq!(split.insertion_point, (1, 0));
        assert_eq!(
            split.into_parts_with("X"),
            vec![TextPart::new("ab", Format::default()), TextPart::new("X", bold())]
        );
    }

    #[test]
    fn empty_range_deletes_nothing() {
        let runs = runs(&[("abc", Format::default())]);
        assert!(split_deletion(&runs, 1..1).unwrap().is_none());
        assert!(split_deletion(&runs, 3..9).unwrap().is_none());
    }

    #[test]
    fn formatting_splits_at_selection_edges() {
        let runs = runs(&[("hello world", Format::default())]);
        let patch = FormatPatch {
            outline: Some(true),
            ..FormatPatch::default()
        };
        let parts = split_formatting(&runs, 6..11, &patch).unwrap();
        assert_eq!(
            parts,
            vec![TextPart::new("hello ", Format::default()), TextPart::new("world", bold())]
        );
    }

    #[test]
    fn text_in_spans_runs_with_multibyte_clusters() {
        let runs = runs(&[("héllo", Format::default()), ("wörld", bold())]);
        assert_eq!(text_in(&runs, 1..7).unwrap(), "éllowö");
    }
}
