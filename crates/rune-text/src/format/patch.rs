use serde::{Deserialize, Serialize};

use super::{Alignment, Color, Direction, Effect, Format};
use crate::error::{Result, TextError};

macro_rules! format_patch {
    ($($field:ident: $ty:ty),* $(,)?) => {
        /// A sparse [`Format`]: only the fields that are `Some` are applied.
        ///
        /// This is the JSON shape of inline `{{...}}` directives and of
        /// format changes requested by the host.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default, deny_unknown_fields)]
        pub struct FormatPatch {
            $(
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }

        impl FormatPatch {
            /// Return `base` with every specified field replaced.
            pub fn apply(&self, base: &Format) -> Format {
                let mut format = base.clone();
                $(
                    if let Some(value) = &self.$field {
                        format.$field = value.clone();
                    }
                )*
                format
            }

            /// The smallest patch turning `base` into `target`.
            pub fn diff(base: &Format, target: &Format) -> Self {
                let mut patch = Self::default();
                $(
                    if base.$field != target.$field {
                        patch.$field = Some(target.$field.clone());
                    }
                )*
                patch
            }

            pub fn is_empty(&self) -> bool {
                true $(&& self.$field.is_none())*
            }
        }
    };
}

format_patch! {
    font: String,
    charsize: u32,
    outline: bool,
    outline_size: u32,
    shadow: bool,
    shadow_offset: [i32; 2],
    line_spacing: f32,
    alignment: Alignment,
    effect: Effect,
    effect_offset: f32,
    text_color: Color,
    outline_color: Color,
    shadow_color: Color,
    alpha: u8,
    language: String,
    script: String,
    direction: Direction,
    word_dividers: String,
    short_pauses: String,
    long_pauses: String,
}

impl FormatPatch {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| TextError::InvalidFormat(format!("{err} in '{json}'")))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|err| TextError::InvalidFormat(err.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|err| TextError::InvalidFormat(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Rgb;

    #[test]
    fn apply_only_touches_given_fields() {
        let patch = FormatPatch::from_json(r##"{"charsize": 40, "text_color": "#102030"}"##).unwrap();
        let base = Format::default();
        let patched = patch.apply(&base);
        assert_eq!(patched.charsize, 40);
        assert_eq!(patched.text_color, Color::Rgb(Rgb::new(0x10, 0x20, 0x30)));
        assert_eq!(patched.font, base.font);
        assert_eq!(patched.alignment, base.alignment);
    }

    #[test]
    fn diff_then_apply_reaches_target() {
        let base = Format::default();
        let target = Format {
            alignment: Alignment::Center,
            effect: Effect::Waves,
            line_spacing: 1.5,
            ..Format::default()
        };
        let patch = FormatPatch::diff(&base, &target);
        assert!(patch.charsize.is_none());
        assert_eq!(patch.apply(&base), target);
        assert!(FormatPatch::diff(&base, &base).is_empty());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = FormatPatch::from_json(r##"{"colour": "#000000"}"##).unwrap_err();
        assert!(matches!(err, TextError::InvalidFormat(_)));
    }

    #[test]
    fn serialization_skips_unset_fields() {
        let patch = FormatPatch {
            alpha: Some(128),
            ..FormatPatch::default()
        };
        assert_eq!(patch.to_json().unwrap(), r#"{"alpha":128}"#);
    }
}
