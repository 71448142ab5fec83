use std::str::FromStr;

use rune_text::Rgb;

use crate::error::RasterError;

/// Byte order of a pixel in the surface buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    #[default]
    Rgba,
    Bgra,
}

impl FromStr for PixelFormat {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgba" => Ok(PixelFormat::Rgba),
            "bgra" => Ok(PixelFormat::Bgra),
            _ => Err(RasterError::UnknownPixelFormat(s.to_string())),
        }
    }
}

/// Straight-alpha color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const TRANSPARENT: Rgba8 = Rgba8::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_rgb(rgb: Rgb, a: u8) -> Self {
        Self::new(rgb.r, rgb.g, rgb.b, a)
    }
}

/// CPU pixel buffer, four bytes per pixel, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw bytes in the surface's pixel format.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Reallocate when the size or format differs. Content is unspecified
    /// afterwards.
    pub fn reshape(&mut self, width: u32, height: u32, format: PixelFormat) {
        if (self.width, self.height, self.format) != (width, height, format) {
            *self = Self::new(width, height, format);
        }
    }

    pub fn fill(&mut self, color: Rgba8) {
        let bytes = self.encode(color);
        for pixel in self.data.chunks_exact_mut(4) {
            pixel.copy_from_slice(&bytes);
        }
    }

    /// Pixel at `(x, y)` in straight RGBA regardless of the storage order.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        let offset = self.offset(x as i64, y as i64)?;
        let p = &self.data[offset..offset + 4];
        Some(match self.format {
            PixelFormat::Rgba => Rgba8::new(p[0], p[1], p[2], p[3]),
            PixelFormat::Bgra => Rgba8::new(p[2], p[1], p[0], p[3]),
        })
    }

    /// Composite `color` over the pixel at `(x, y)` with straight alpha.
    /// Coordinates outside the surface are ignored.
    pub fn blend(&mut self, x: i64, y: i64, color: Rgba8) {
        if color.a == 0 {
            return;
        }
        let Some(offset) = self.offset(x, y) else { return };
        let Some(dst) = self.pixel(x as u32, y as u32) else { return };

        let sa = color.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        let channel = |s: u8, d: u8| -> u8 {
            if out_a <= 0.0 {
                return 0;
            }
            ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a).round() as u8
        };
        let out = Rgba8::new(
            channel(color.r, dst.r),
            channel(color.g, dst.g),
            channel(color.b, dst.b),
            (out_a * 255.0).round() as u8,
        );
        let bytes = self.encode(out);
        self.data[offset..offset + 4].copy_from_slice(&bytes);
    }

    /// Blend a rectangle, clipped to the surface.
    pub fn blend_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgba8) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + i64::from(width)).min(i64::from(self.width));
        let y1 = (y + i64::from(height)).min(i64::from(self.height));
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color);
            }
        }
    }

    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    fn encode(&self, color: Rgba8) -> [u8; 4] {
        match self.format {
            PixelFormat::Rgba => [color.r, color.g, color.b, color.a],
            PixelFormat::Bgra => [color.b, color.g, color.r, color.a],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgra_stores_swapped_channels() {
        let mut surface = PixelSurface::new(1, 1, PixelFormat::Bgra);
        surface.fill(Rgba8::new(10, 20, 30, 255));
        assert_eq!(surface.data(), &[30, 20, 10, 255]);
        assert_eq!(surface.pixel(0, 0), Some(Rgba8::new(10, 20, 30, 255)));
    }

    #[test]
    fn blend_is_straight_alpha_over() {
        let mut surface = PixelSurface::new(1, 1, PixelFormat::Rgba);
        surface.fill(Rgba8::new(0, 0, 0, 255));
        surface.blend(0, 0, Rgba8::new(255, 255, 255, 128));
        assert_eq!(surface.pixel(0, 0), Some(Rgba8::new(128, 128, 128, 255)));
    }

    #[test]
    fn blend_onto_transparent_keeps_source_color() {
        let mut surface = PixelSurface::new(1, 1, PixelFormat::Rgba);
        surface.blend(0, 0, Rgba8::new(200, 100, 50, 64));
        assert_eq!(surface.pixel(0, 0), Some(Rgba8::new(200, 100, 50, 64)));
    }

    #[test]
    fn out_of_bounds_is_clipped() {
        let mut surface = PixelSurface::new(2, 2, PixelFormat::Rgba);
        surface.blend(-1, 0, Rgba8::new(255, 0, 0, 255));
        surface.blend(2, 1, Rgba8::new(255, 0, 0, 255));
        surface.blend_rect(1, 1, 10, 10, Rgba8::new(0, 255, 0, 255));
        assert_eq!(surface.pixel(0, 0), Some(Rgba8::TRANSPARENT));
        assert_eq!(surface.pixel(1, 1), Some(Rgba8::new(0, 255, 0, 255)));
        assert_eq!(surface.pixel(2, 2), None);
    }

    #[test]
    fn pixel_format_parses_case_insensitively() {
        assert_eq!("BGRA".parse::<PixelFormat>().unwrap(), PixelFormat::Bgra);
        assert!("argb".parse::<PixelFormat>().is_err());
    }
}
