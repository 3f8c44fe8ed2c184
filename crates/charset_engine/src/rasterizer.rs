//! Glyph rasterization seam.
//!
//! The charmap builder only talks to the [`GlyphRasterizer`] trait, so the
//! actual font engine stays swappable (and mockable in tests). The shipped
//! implementation is [`FontRasterizer`], backed by `ab_glyph`.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};

use crate::{CharsetError, Result};

/// One grayscale rasterization result, in the classic font engine layout:
/// bearings relative to the pen position, advance in 26.6 fixed point and a
/// row-major coverage buffer whose stride may exceed the pixel width.
#[derive(Debug, Clone)]
pub struct RasterizedGlyph {
    /// Horizontal distance from the pen position to the buffer's left edge.
    pub bearing_x: i32,
    /// Vertical distance from the baseline up to the buffer's top edge.
    pub bearing_y: i32,
    /// Horizontal advance in 1/64 pixel units.
    pub advance_x: i32,
    /// Pixel width of the coverage buffer.
    pub width: usize,
    /// Pixel height of the coverage buffer.
    pub height: usize,
    /// Row stride in bytes, `>= width`.
    pub stride: usize,
    /// `stride * height` grayscale samples, 0 = background.
    pub buffer: Vec<u8>,
}

/// Renders single glyphs out of a prepared font context.
///
/// A `None` result means the character could not be rasterized. That is a
/// per-glyph, non-fatal condition; callers leave the slot absent and continue.
pub trait GlyphRasterizer {
    fn rasterize(&mut self, code: u32) -> Option<RasterizedGlyph>;
}

/// `ab_glyph` backed rasterizer for TTF/OTF fonts.
///
/// The font is owned exclusively by this struct for the duration of a
/// conversion run and released when it goes out of scope.
pub struct FontRasterizer {
    font: FontVec,
    scale: PxScale,
    path: PathBuf,
}

impl FontRasterizer {
    /// Load a font face from a file.
    pub fn load(path: &Path, face_index: u32) -> Result<Self> {
        let data = std::fs::read(path).map_err(|err| CharsetError::FontLoad {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let font = FontVec::try_from_vec_and_index(data, face_index).map_err(|err| CharsetError::InvalidFontData { message: err.to_string() })?;
        Ok(Self {
            font,
            scale: PxScale::from(16.0),
            path: path.to_path_buf(),
        })
    }

    /// Set the nominal character size.
    ///
    /// Sizes are given in 1/64 point units, resolutions in dpi. A zero width
    /// means "same as height" and vice versa.
    pub fn set_char_size(&mut self, char_width: i32, char_height: i32, hdpi: u32, vdpi: u32) {
        let width = if char_width == 0 { char_height } else { char_width };
        let height = if char_height == 0 { char_width } else { char_height };
        self.scale = PxScale {
            x: pixel_size(width, hdpi),
            y: pixel_size(height, vdpi),
        };
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Convert a size in 1/64 point units to pixels at the given resolution
/// (72 points per inch).
fn pixel_size(size: i32, dpi: u32) -> f32 {
    size as f32 / 64.0 * dpi as f32 / 72.0
}

impl GlyphRasterizer for FontRasterizer {
    fn rasterize(&mut self, code: u32) -> Option<RasterizedGlyph> {
        let ch = char::from_u32(code)?;
        let glyph_id = self.font.glyph_id(ch);
        if glyph_id.0 == 0 {
            // Font has no mapping for this character.
            return None;
        }

        let scaled_font = self.font.as_scaled(self.scale);
        let advance_x = (scaled_font.h_advance(glyph_id) * 64.0) as i32;

        let glyph = glyph_id.with_scale_and_position(self.scale, ab_glyph::point(0.0, 0.0));
        let Some(outlined) = scaled_font.outline_glyph(glyph) else {
            // No outline (space and friends): an empty buffer that still
            // carries the advance.
            return Some(RasterizedGlyph {
                bearing_x: 0,
                bearing_y: 0,
                advance_x,
                width: 0,
                height: 0,
                stride: 0,
                buffer: Vec::new(),
            });
        };

        let bounds = outlined.px_bounds();
        let width = bounds.width() as usize;
        let height = bounds.height() as usize;
        let mut buffer = vec![0u8; width * height];
        outlined.draw(|x, y, coverage| {
            let idx = y as usize * width + x as usize;
            if idx < buffer.len() {
                buffer[idx] = (coverage * 255.0).round() as u8;
            }
        });

        Some(RasterizedGlyph {
            bearing_x: bounds.min.x as i32,
            // The glyph is positioned on the baseline, so the top bearing is
            // the negated upper bound (px coordinates grow downwards).
            bearing_y: -bounds.min.y as i32,
            advance_x,
            width,
            height,
            stride: width,
            buffer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_size() {
        // 24pt at 72dpi is 24px
        assert!((pixel_size(24 * 64, 72) - 24.0).abs() < f32::EPSILON);
        // 24pt at 30dpi is 10px
        assert!((pixel_size(24 * 64, 30) - 10.0).abs() < f32::EPSILON);
    }
}
