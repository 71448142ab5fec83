use std::sync::Arc;

use harfrust::{
    Direction as HbDirection,
    FontRef as HbFontRef,
    Language as HbLanguage,
    Script as HbScript,
    ShaperData,
    ShaperInstance,
    Tag as HbTag,
    UnicodeBuffer as HbUnicodeBuffer,
};

use super::{FIXED_ONE, SegmentProperties, ShapedGlyph, Shaper};
use crate::error::{Result, TextError};
use crate::font::FontLibrary;
use crate::format::{Direction, Format};

/// Shaper built on harfrust (pure-Rust HarfBuzz port).
///
/// Fonts are resolved by name through the shared [`FontLibrary`]. Glyphs
/// of right-to-left runs come out of HarfBuzz in visual order and are
/// reversed back to logical order.
#[derive(Debug, Clone)]
pub struct HarfrustShaper {
    fonts: Arc<FontLibrary>,
}

impl HarfrustShaper {
    pub fn new(fonts: Arc<FontLibrary>) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &Arc<FontLibrary> {
        &self.fonts
    }
}

impl Shaper for HarfrustShaper {
    fn shape(&self, text: &str, format: &Format, props: &SegmentProperties) -> Result<Vec<ShapedGlyph>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let face = self.fonts.resolve(&format.font)?;
        let font_ref = HbFontRef::from_index(face.data(), face.index()).map_err(|err| TextError::Shaping {
            font: format.font.clone(),
            reason: format!("{err:?}"),
        })?;

        let data = ShaperData::new(&font_ref);
        let instance = ShaperInstance::from_variations(&font_ref, core::iter::empty::<harfrust::Variation>());
        let shaper = data
            .shaper(&font_ref)
            .instance(Some(&instance))
            .point_size(None)
            .build();

        let mut buffer = HbUnicodeBuffer::new();
        buffer.push_str(text);
        buffer.set_direction(match props.direction {
            Direction::Rtl => HbDirection::RightToLeft,
            _ => HbDirection::LeftToRight,
        });
        if let Ok(tag) = <[u8; 4]>::try_from(props.script.as_bytes()) {
            if let Some(script) = HbScript::from_iso15924_tag(HbTag::new(&tag)) {
                buffer.set_script(script);
            }
        }
        if let Ok(language) = props.language.parse::<HbLanguage>() {
            buffer.set_language(language);
        }
        buffer.guess_segment_properties();

        let glyph_buffer = shaper.shape(buffer, &[]);
        let infos = glyph_buffer.glyph_infos();
        let positions = glyph_buffer.glyph_positions();

        // harfrust positions are in design units; scale into 26.6 pixels.
        let scale = face.metrics().scale(format.charsize as f32) * FIXED_ONE as f32;
        let to_fixed = |units: i32| (units as f32 * scale).round() as i32;

        let mut glyphs: Vec<ShapedGlyph> = infos
            .iter()
            .zip(positions.iter())
            .map(|(info, pos)| ShapedGlyph {
                glyph_id: info.glyph_id,
                cluster: info.cluster,
                x_advance: to_fixed(pos.x_advance),
                y_advance: to_fixed(pos.y_advance),
                x_offset: to_fixed(pos.x_offset),
                y_offset: to_fixed(pos.y_offset),
            })
            .collect();

        if props.direction.is_rtl() {
            glyphs.reverse();
        }
        Ok(glyphs)
    }
}
