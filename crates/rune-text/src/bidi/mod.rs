//! Bidirectional text helpers built on `unicode-bidi`.
//!
//! Layout tracks direction per run: each run declares (or resolves) one
//! direction and the line breaker flips the pen at run boundaries. This
//! module only resolves `Direction::Auto` from a run's text.

use unicode_bidi::{BidiClass, bidi_class};

use crate::format::Direction;

/// Direction of the first strong character (UAX-9 rules P2/P3), if any.
pub fn first_strong_direction(text: &str) -> Option<Direction> {
    text.chars().find_map(|ch| match bidi_class(ch) {
        BidiClass::L => Some(Direction::Ltr),
        BidiClass::R | BidiClass::AL => Some(Direction::Rtl),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hebrew_and_arabic_are_rtl() {
        assert_eq!(first_strong_direction("  שלום"), Some(Direction::Rtl));
        assert_eq!(first_strong_direction("مرحبا"), Some(Direction::Rtl));
    }

    #[test]
    fn neutrals_are_skipped() {
        assert_eq!(first_strong_direction("12, abc"), Some(Direction::Ltr));
        assert_eq!(first_strong_direction("!? 42"), None);
    }
}
