/// One rendered character of a charmap.
///
/// The pixel buffer is row-major with a stride equal to `width`, one sample
/// per byte. Sample values are palette indices in `0..2^bpp` of the owning
/// [`crate::CharMap`]; the extraction path only ever produces 0 and 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    /// Width of the pixel buffer. May exceed the ink extent for glyphs whose
    /// advance is wider than their bitmap (e.g. space).
    pub width: u8,
    /// Height of the pixel buffer in rows.
    pub height: u8,
    /// Horizontal offset from the pen position (the rasterizer's left bearing).
    pub x: i8,
    /// Distance from the tallest ascender of the charmap down to this glyph's
    /// first row. Blitting at `pen_y + y` baseline-aligns all glyphs.
    pub y: i8,
    /// `width * height` samples.
    pub data: Vec<u8>,
}

impl Glyph {
    /// Number of samples in the pixel buffer.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size in bytes of this glyph's pixel data once packed at `bpp` bits per sample.
    pub fn packed_size(&self, bpp: u8) -> usize {
        (self.pixel_count() * bpp as usize + 7) / 8
    }

    /// Size in bytes of the full glyph record (4 byte header + packed pixels).
    pub fn record_size(&self, bpp: u8) -> usize {
        4 + self.packed_size(bpp)
    }
}
