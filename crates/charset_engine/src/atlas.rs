//! Preview atlas export.
//!
//! Lays out all populated glyphs of a charmap on a single indexed-color
//! canvas in a sequential flow layout, for visual inspection of a conversion.

use std::path::Path;

use crate::{CharMap, CharsetError, Glyph, Result};

/// Palette index used for the white preview foreground.
const FOREGROUND_INDEX: usize = 1;

/// An indexed-color pixel grid with `2^bpp` palette entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasCanvas {
    pub width: usize,
    pub height: usize,
    /// RGB triplets, 3 bytes per color.
    pub palette: Vec<u8>,
    /// `width * height` palette indices.
    pub data: Vec<u8>,
}

impl AtlasCanvas {
    pub fn new(width: usize, height: usize, colors: usize) -> Self {
        Self {
            width,
            height,
            palette: vec![0; 3 * colors],
            data: vec![0; width * height],
        }
    }

    pub fn color_count(&self) -> usize {
        self.palette.len() / 3
    }

    /// Copy a glyph's rows onto the canvas at `(x, y)`, clipped to the
    /// canvas bounds.
    fn blit(&mut self, x: usize, y: usize, glyph: &Glyph) {
        let glyph_width = glyph.width as usize;
        if glyph_width == 0 {
            return;
        }
        for (row, line) in glyph.data.chunks_exact(glyph_width).enumerate() {
            if y + row >= self.height {
                break;
            }
            let offset = (y + row) * self.width + x;
            for (col, &sample) in line.iter().enumerate() {
                if x + col >= self.width {
                    break;
                }
                self.data[offset + col] = sample;
            }
        }
    }

    /// Save the canvas as an image file; the format is chosen by the file
    /// extension (e.g. `.bmp`, `.png`).
    pub fn save(&self, path: &Path) -> Result<()> {
        let colors = self.color_count();
        let mut img = image::RgbImage::new(self.width as u32, self.height as u32);
        for (pixel, &index) in img.pixels_mut().zip(&self.data) {
            let entry = (index as usize % colors) * 3;
            *pixel = image::Rgb([self.palette[entry], self.palette[entry + 1], self.palette[entry + 2]]);
        }
        img.save(path)?;
        Ok(())
    }
}

/// Number of palette entries for a bit depth. 3bpp is a historical allowance
/// of the charset tooling and yields an 8-color table.
fn color_count_for_bpp(bpp: u8) -> Option<usize> {
    match bpp {
        1 => Some(2),
        2 => Some(4),
        3 => Some(8),
        4 => Some(16),
        _ => None,
    }
}

impl CharMap {
    /// Pack all populated glyphs into a preview atlas.
    ///
    /// Glyphs flow left to right in cells of `cell_width + 2 * spacing`
    /// pixels, wrapping to the next line when the remaining width runs out.
    /// Absent slots consume no cell. The row count is derived from the index
    /// span (`max_char + 1`), so the canvas is always tall enough even when
    /// every slot is populated.
    pub fn to_atlas(&self, width: usize, spacing: usize) -> Result<AtlasCanvas> {
        let cell_width = self.cell_width as usize;
        let line_height = self.line_height as usize;

        let step = cell_width + 2 * spacing;
        if width < step || step == 0 {
            return Err(CharsetError::AtlasTooNarrow { required: step.max(1) });
        }

        let Some(colors) = color_count_for_bpp(self.bpp) else {
            return Err(CharsetError::UnsupportedBpp { bpp: self.bpp });
        };

        let columns = width / step;
        let rows = (self.glyph_count() + columns - 1) / columns;

        let mut canvas = AtlasCanvas::new(width, rows * (line_height + 2 * spacing), colors);
        // White foreground for the preview
        canvas.palette[FOREGROUND_INDEX * 3..FOREGROUND_INDEX * 3 + 3].fill(0xFF);

        let mut x = spacing;
        let mut y = spacing;
        for (_, glyph) in self.populated() {
            canvas.blit(x, y, glyph);
            x += step;
            if x + cell_width + spacing > width {
                x = spacing;
                y += line_height + 2 * spacing;
            }
        }
        Ok(canvas)
    }
}
