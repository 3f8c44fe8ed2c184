//! The in-memory charmap aggregate and its builder.
//!
//! A [`CharMap`] is a sparse, fixed-capacity table of glyphs indexed by
//! character code, plus the metrics shared by the whole set: a uniform line
//! height and the widest cell observed. It is built once from a rasterizer
//! and then consumed read-only by the atlas and charset exports.

use crate::{CharsetError, Glyph, GlyphRasterizer, RasterizedGlyph, Result};

/// Maximum number of glyph slots in a charmap.
pub const MAX_CHARS: usize = 8192;

/// Number of palette entries stored in a charset resource.
pub const PALETTE_LEN: usize = 15;

/// A set of glyphs sharing one palette, bit depth and line height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharMap {
    /// Shared color table written verbatim into the charset resource.
    pub palette: [u8; PALETTE_LEN],
    /// Bits per pixel sample used for coding (1, 2 or 4). The extraction
    /// path only ever produces 1bpp data.
    pub bpp: u8,
    /// Uniform line height covering the tallest ascender and the lowest
    /// descender of the set.
    pub line_height: u8,
    /// Widest glyph bound observed during metrics unification. Used as an
    /// atlas layout hint, not enforced per glyph.
    pub cell_width: u8,
    max_char: u16,
    chars: Vec<Option<Glyph>>,
}

impl Default for CharMap {
    fn default() -> Self {
        Self::new()
    }
}

impl CharMap {
    pub fn new() -> Self {
        Self {
            palette: [0; PALETTE_LEN],
            bpp: 1,
            line_height: 0,
            cell_width: 0,
            max_char: 0,
            chars: vec![None; MAX_CHARS],
        }
    }

    /// Get the glyph at `index`, `None` for absent or out-of-range slots.
    pub fn glyph(&self, index: usize) -> Option<&Glyph> {
        self.chars.get(index).and_then(|slot| slot.as_ref())
    }

    /// Put a glyph into a slot, raising `max_char` if needed.
    ///
    /// # Panics
    /// Panics if `index` is not below [`MAX_CHARS`].
    pub fn set_glyph(&mut self, index: usize, glyph: Glyph) {
        assert!(index < MAX_CHARS, "glyph index {index} out of range");
        self.chars[index] = Some(glyph);
        self.max_char = self.max_char.max(index as u16);
    }

    /// Index of the last populated slot.
    pub fn max_char(&self) -> u16 {
        self.max_char
    }

    pub(crate) fn set_max_char(&mut self, max_char: u16) {
        self.max_char = max_char;
    }

    /// Number of slots covered by iteration and the offset table
    /// (`max_char + 1`, counting absent slots).
    pub fn glyph_count(&self) -> usize {
        self.max_char as usize + 1
    }

    /// Iterate over the populated slots in ascending index order.
    pub fn populated(&self) -> impl Iterator<Item = (usize, &Glyph)> {
        self.chars[..self.glyph_count()].iter().enumerate().filter_map(|(i, slot)| Some((i, slot.as_ref()?)))
    }

    /// Build a charmap by rasterizing the requested codes.
    ///
    /// `codes[i]` is the character code for slot `i`; a zero code leaves the
    /// slot unrequested. Codes that fail to rasterize are logged and left
    /// absent, the batch continues. Each code is rasterized exactly once; the
    /// retained results feed both the metrics pass and the extraction pass,
    /// so a non-deterministic rasterizer cannot skew the shared metrics.
    ///
    /// `line_spacing` is added to the unified line height and may be negative
    /// to tighten spacing.
    pub fn from_rasterizer<R: GlyphRasterizer>(rasterizer: &mut R, codes: &[u32], line_spacing: i32) -> Result<Self> {
        if codes.len() > MAX_CHARS {
            return Err(CharsetError::TooManyGlyphs { count: codes.len() });
        }

        let rendered: Vec<Option<RasterizedGlyph>> = codes
            .iter()
            .map(|&code| {
                if code == 0 {
                    return None;
                }
                let result = rasterizer.rasterize(code);
                if result.is_none() {
                    log::warn!("Failed to rasterize character {code}");
                }
                result
            })
            .collect();

        let extents = Extents::scan(&rendered);

        let mut map = Self::new();
        map.line_height = (extents.top - extents.bottom + line_spacing).clamp(0, 255) as u8;
        map.cell_width = (extents.right - extents.left).clamp(0, 255) as u8;

        for (i, raster) in rendered.iter().enumerate() {
            if let Some(raster) = raster {
                map.set_glyph(i, extract_glyph(raster, extents.top));
            }
        }
        Ok(map)
    }
}

/// Extrema over all successfully rasterized glyphs, relative to the baseline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Extents {
    /// Highest ascender reach (max top bearing).
    top: i32,
    /// Lowest descender reach, zero or negative.
    bottom: i32,
    /// Leftmost bearing, zero or negative.
    left: i32,
    /// Rightmost ink or advance extent.
    right: i32,
}

impl Extents {
    fn scan(rendered: &[Option<RasterizedGlyph>]) -> Self {
        let mut ext = Self::default();
        for raster in rendered.iter().flatten() {
            ext.top = ext.top.max(raster.bearing_y);
            ext.bottom = ext.bottom.min(raster.bearing_y - raster.height as i32);
            ext.left = ext.left.min(raster.bearing_x);
            ext.right = ext.right.max(raster.bearing_x + raster.width as i32);
            // The runtime advances the pen by width + offset, so an advance
            // wider than the ink extent must widen the cell as well.
            ext.right = ext.right.max(raster.advance_x >> 6);
        }
        ext
    }
}

/// Binarize one rasterization result into a tightly packed glyph.
fn extract_glyph(raster: &RasterizedGlyph, top: i32) -> Glyph {
    let x = raster.bearing_x;
    let y = top - raster.bearing_y;

    let advance = raster.advance_x >> 6;
    let width = if advance > raster.bearing_x + raster.width as i32 {
        advance - x
    } else {
        raster.width as i32
    };
    let width = width.clamp(0, 255) as usize;
    let height = raster.height.min(255);

    let mut data = vec![0u8; width * height];
    for row in 0..height {
        let src = &raster.buffer[row * raster.stride..row * raster.stride + raster.width];
        let dst = &mut data[row * width..(row + 1) * width];
        for col in 0..raster.width.min(width) {
            // Any nonzero coverage becomes foreground; the charset format
            // stores 1-bit masks, so anti-aliasing is dropped here.
            if src[col] > 0 {
                dst[col] = 1;
            }
        }
    }

    Glyph {
        width: width as u8,
        height: height as u8,
        x: x.clamp(i8::MIN as i32, i8::MAX as i32) as i8,
        y: y.clamp(i8::MIN as i32, i8::MAX as i32) as i8,
        data,
    }
}
