//! Word jumps over the flat glyph index.
//!
//! A word is a maximal run of glyphs whose cluster starts with an
//! alphanumeric character.

use crate::layout::LayoutIndex;

fn word_mask(index: &LayoutIndex) -> Vec<bool> {
    index.iter().map(|(_, _, glyph)| glyph.ch.is_alphanumeric()).collect()
}

/// Skip non-word glyphs after `cursor`, then the word that follows.
pub fn next_word_end(index: &LayoutIndex, cursor: usize) -> usize {
    let mask = word_mask(index);
    let mut c = cursor.min(mask.len());
    while c < mask.len() && !mask[c] {
        c += 1;
    }
    while c < mask.len() && mask[c] {
        c += 1;
    }
    c
}

/// Skip non-word glyphs before `cursor`, then the word that precedes them.
pub fn previous_word_start(index: &LayoutIndex, cursor: usize) -> usize {
    let mask = word_mask(index);
    let mut c = cursor.min(mask.len());
    while c > 0 && !mask[c - 1] {
        c -= 1;
    }
    while c > 0 && mask[c - 1] {
        c -= 1;
    }
    c
}
