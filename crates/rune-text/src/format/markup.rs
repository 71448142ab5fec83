//! Inline format directives.
//!
//! Markup is plain text interleaved with `{{...}}` directives. A directive
//! holding a JSON object (`{{"charsize": 20}}`) pushes a format derived from
//! the current one; an empty directive (`{{}}`) pops back to the previous
//! format. Popping the base format is ignored.
//!
//! Outside directives `\{` stands for a literal `{` and `\\` for a literal
//! `\`. Any other backslash is kept as is.

use super::{Format, FormatPatch, TextPart, normalize_parts};
use crate::error::{Result, TextError};

/// Parse markup into a normalized part sequence starting from `base`.
pub fn parse_markup(input: &str, base: &Format) -> Result<Vec<TextPart>> {
    let mut stack = vec![base.clone()];
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut pos = 0usize;

    while let Some(ch) = input[pos..].chars().next() {
        if ch == '\\' {
            match input[pos + 1..].chars().next() {
                Some(escaped @ ('\\' | '{')) => {
                    text.push(escaped);
                    pos += 2;
                }
                _ => {
                    text.push('\\');
                    pos += 1;
                }
            }
            continue;
        }
        if !input[pos..].starts_with("{{") {
            text.push(ch);
            pos += ch.len_utf8();
            continue;
        }

        let open = pos;
        push_text(&mut parts, &text, &stack);
        text.clear();

        // The directive is a JSON object wrapped in one extra pair of braces.
        let object_start = open + 1;
        let object_end = scan_object(input, object_start)?;
        if !input[object_end..].starts_with('}') {
            return Err(TextError::Markup {
                offset: open,
                reason: "directive is not closed with '}}'".to_string(),
            });
        }

        let object = &input[object_start..object_end];
        let value: serde_json::Value = serde_json::from_str(object).map_err(|err| TextError::Markup {
            offset: object_start,
            reason: err.to_string(),
        })?;
        let is_pop = value.as_object().is_some_and(|map| map.is_empty());
        if is_pop {
            if stack.len() > 1 {
                stack.pop();
            } else {
                tracing::debug!(offset = open, "ignoring format pop at base level");
            }
        } else {
            let patch = FormatPatch::from_value(value)?;
            let top = stack.last().unwrap_or(base);
            let derived = patch.apply(top);
            stack.push(derived);
        }
        pos = object_end + 1;
    }
    push_text(&mut parts, &text, &stack);

    if parts.is_empty() {
        parts.push(TextPart::new(String::new(), base.clone()));
    }
    Ok(normalize_parts(parts))
}

/// Encode parts as markup relative to `base`.
///
/// Every part whose format differs from `base` is wrapped in a push/pop
/// pair carrying exactly the differing fields, so parsing the result with the
/// same base yields the original parts (for non-empty parts without equal
/// neighbours). Braces and backslashes in the text are escaped.
pub fn unparse_markup(parts: &[TextPart], base: &Format) -> Result<String> {
    let mut out = String::new();
    for part in parts {
        if part.format == *base {
            push_escaped(&mut out, &part.text);
            continue;
        }
        let patch = FormatPatch::diff(base, &part.format);
        out.push('{');
        out.push_str(&patch.to_json()?);
        out.push('}');
        push_escaped(&mut out, &part.text);
        out.push_str("{{}}");
    }
    Ok(out)
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        if matches!(ch, '\\' | '{') {
            out.push('\\');
        }
        out.push(ch);
    }
}

fn push_text(parts: &mut Vec<TextPart>, text: &str, stack: &[Format]) {
    if text.is_empty() {
        return;
    }
    if let Some(format) = stack.last() {
        parts.push(TextPart::new(text, format.clone()));
    }
}

/// Return the byte offset just past the JSON object starting at `start`.
fn scan_object(input: &str, start: usize) -> Result<usize> {
    let bytes = input.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(i + 1);
                }
            }
            _ => {}
        }
    }

    Err(TextError::Markup {
        offset: start.saturating_sub(1),
        reason: "unterminated directive".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Alignment, Color, Rgb};

    #[test]
    fn plain_text_is_a_single_part() {
        let base = Format::default();
        let parts = parse_markup("hello world", &base).unwrap();
        assert_eq!(parts, vec![TextPart::new("hello world", base)]);
    }

    #[test]
    fn push_and_pop_directives() {
        let base = Format::default();
        let parts = parse_markup(r#"a{{"charsize":30}}b{{"alignment":"center"}}c{{}}d{{}}e"#, &base).unwrap();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0].text, "a");
        assert_eq!(parts[1].text, "b");
        assert_eq!(parts[1].format.charsize, 30);
        assert_eq!(parts[1].format.alignment, Alignment::Left);
        assert_eq!(parts[2].text, "c");
        assert_eq!(parts[2].format.charsize, 30);
        assert_eq!(parts[2].format.alignment, Alignment::Center);
        // "d" is back in the format of "b" but not adjacent to it.
        assert_eq!(parts[3].text, "d");
        assert_eq!(parts[3].format, parts[1].format);
        assert_eq!(parts[4].text, "e");
        assert_eq!(parts[4].format, base);
    }

    #[test]
    fn braces_inside_strings_do_not_close_directives() {
        let base = Format::default();
        let parts = parse_markup(r#"{{"word_dividers":"}} "}}x y"#, &base).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].format.word_dividers, "}} ");
        assert_eq!(parts[0].text, "x y");
    }

    #[test]
    fn extra_pops_are_ignored() {
        let base = Format::default();
        let parts = parse_markup("{{}}{{}}abc", &base).unwrap();
        assert_eq!(parts, vec![TextPart::new("abc", base)]);
    }

    #[test]
    fn unterminated_directive_is_an_error() {
        let base = Format::default();
        assert!(matches!(
            parse_markup(r#"abc{{"charsize":12"#, &base),
            Err(TextError::Markup { .. })
        ));
        assert!(matches!(
            parse_markup(r#"abc{{"charsize":12}"#, &base),
            Err(TextError::Markup { .. })
        ));
    }

    #[test]
    fn invalid_field_is_reported() {
        let base = Format::default();
        assert!(matches!(
            parse_markup(r#"{{"nonsense":1}}x"#, &base),
            Err(TextError::InvalidFormat(_))
        ));
    }

    #[test]
    fn round_trip_through_unparse() {
        let base = Format::default();
        let red = Format {
            text_color: Color::Rgb(Rgb::new(255, 0, 0)),
            line_spacing: 1.25,
            ..Format::default()
        };
        let big = Format {
            charsize: 48,
            shadow: true,
            ..Format::default()
        };
        let parts = vec![
            TextPart::new("plain ", base.clone()),
            TextPart::new("red", red.clone()),
            TextPart::new("big", big.clone()),
            TextPart::new(" again", base.clone()),
            TextPart::new("red again", red),
        ];
        let markup = unparse_markup(&parts, &base).unwrap();
        assert_eq!(parse_markup(&markup, &base).unwrap(), parts);
    }

    #[test]
    fn escaped_braces_are_text() {
        let base = Format::default();
        let parts = parse_markup(r"a\{{}}b\\c\d", &base).unwrap();
        assert_eq!(parts, vec![TextPart::new(r"a{{}}b\c\d", base)]);
    }

    #[test]
    fn brace_bearing_text_round_trips() {
        let base = Format::default();
        let bold = Format {
            outline: true,
            ..Format::default()
        };
        let parts = vec![
            TextPart::new("a{{}}b", base.clone()),
            TextPart::new(r"{{\{x", bold),
            TextPart::new(r"tail\", base.clone()),
        ];
        let markup = unparse_markup(&parts, &base).unwrap();
        assert_eq!(parse_markup(&markup, &base).unwrap(), parts);
    }

    #[test]
    fn empty_input_keeps_one_empty_part() {
        let base = Format::default();
        assert_eq!(parse_markup("", &base).unwrap(), vec![TextPart::new("", base)]);
    }
}
