//! Binary charset resource format.
//!
//! The on-disk layout is a game resource chunk:
//!
//! ```text
//! "CHAR"               4 bytes  chunk tag
//! chunk size           4 bytes  big-endian, 8 + payload size
//! payload size - 15    4 bytes  little-endian
//! version              2 bytes  little-endian, 0x0363
//! palette              15 bytes
//! bpp                  1 byte   1, 2 or 4
//! line height          1 byte
//! glyph count          2 bytes  little-endian, max_char + 1
//! offset table         4 bytes per slot, 0 = absent, otherwise the byte
//!                      offset of the glyph record, relative to the bpp byte
//! glyph records        w, h, x, y (1 byte each, x/y signed) followed by
//!                      ceil(w*h*bpp/8) bytes of MSB-first packed samples
//! ```
//!
//! Packing never carries a partial byte into the next record; trailing bits
//! of a glyph are zero padded. The tag and version are fixed protocol
//! constants consumed by existing engines and must not change.

use std::path::Path;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use crate::{CharMap, CharsetError, Glyph, MAX_CHARS, PALETTE_LEN, Result};

/// Chunk tag of a charset resource.
pub const CHARSET_TAG: &[u8; 4] = b"CHAR";

/// Fixed format version.
pub const CHARSET_VERSION: u16 = 0x0363;

// Header bytes between the size field and the offset table:
// size field (4) + version (2) + palette (15) + bpp (1) + height (1) + count (2)
const HEADER_SIZE: usize = 4 + 2 + PALETTE_LEN + 1 + 1 + 2;

// Offset of the offset table from the start of the chunk.
const TABLE_START: usize = 8 + HEADER_SIZE;

// Glyph record offsets are measured from the bpp byte: the first record sits
// at bpp + height + count (4 bytes) + the table itself.
const OFFSET_BASE: usize = TABLE_START - 4;

/// The charset resource format.
pub struct CharsetFormat;

impl CharsetFormat {
    /// Sample mask for a supported bit depth.
    fn bpp_mask(bpp: u8) -> Result<u8> {
        match bpp {
            1 => Ok(0x01),
            2 => Ok(0x03),
            4 => Ok(0x0F),
            bpp => Err(CharsetError::UnsupportedBpp { bpp }),
        }
    }

    /// Serialize a charmap into a charset resource chunk.
    pub fn to_bytes(map: &CharMap) -> Result<Vec<u8>> {
        let mask = Self::bpp_mask(map.bpp)?;
        let glyph_count = map.glyph_count();

        let mut payload_size = HEADER_SIZE + glyph_count * 4;
        for (_, glyph) in map.populated() {
            payload_size += glyph.record_size(map.bpp);
        }

        let mut out = Vec::with_capacity(8 + payload_size);

        // chunk header
        out.extend_from_slice(CHARSET_TAG);
        out.write_u32::<BigEndian>((8 + payload_size) as u32)?;

        // charset header
        out.write_u32::<LittleEndian>((payload_size - 15) as u32)?;
        out.write_u16::<LittleEndian>(CHARSET_VERSION)?;
        out.extend_from_slice(&map.palette);
        out.push(map.bpp);
        out.push(map.line_height);
        out.write_u16::<LittleEndian>(glyph_count as u16)?;

        // offset table, offsets are relative to the bpp byte
        let mut offset = (4 + glyph_count * 4) as u32;
        for index in 0..glyph_count {
            if let Some(glyph) = map.glyph(index) {
                out.write_u32::<LittleEndian>(offset)?;
                offset += glyph.record_size(map.bpp) as u32;
            } else {
                out.write_u32::<LittleEndian>(0)?;
            }
        }

        // glyph records
        for (_, glyph) in map.populated() {
            out.push(glyph.width);
            out.push(glyph.height);
            out.write_i8(glyph.x)?;
            out.write_i8(glyph.y)?;

            let mut packer = BitPacker::new(map.bpp);
            for &sample in &glyph.data {
                packer.push(sample & mask, &mut out);
            }
            packer.flush(&mut out);
        }

        Ok(out)
    }

    /// Parse a charset resource chunk back into a charmap.
    pub fn from_bytes(bytes: &[u8]) -> Result<CharMap> {
        if bytes.len() < TABLE_START + 4 {
            return Err(CharsetError::FileTooShort);
        }
        if &bytes[0..4] != CHARSET_TAG {
            return Err(CharsetError::IdMismatch);
        }

        let version = u16::from_le_bytes([bytes[12], bytes[13]]);
        if version != CHARSET_VERSION {
            return Err(CharsetError::UnsupportedVersion { version });
        }

        let mut map = CharMap::new();
        map.palette.copy_from_slice(&bytes[14..14 + PALETTE_LEN]);
        map.bpp = bytes[29];
        map.line_height = bytes[30];
        let mask = Self::bpp_mask(map.bpp)?;

        let glyph_count = u16::from_le_bytes([bytes[31], bytes[32]]) as usize;
        if glyph_count == 0 || glyph_count > MAX_CHARS {
            return Err(CharsetError::InvalidGlyphCount { count: glyph_count });
        }
        if bytes.len() < TABLE_START + glyph_count * 4 {
            return Err(CharsetError::FileTooShort);
        }

        let mut cell_width = 0u8;
        for index in 0..glyph_count {
            let entry = TABLE_START + index * 4;
            let offset = u32::from_le_bytes([bytes[entry], bytes[entry + 1], bytes[entry + 2], bytes[entry + 3]]) as usize;
            if offset == 0 {
                continue;
            }

            let record = OFFSET_BASE + offset;
            if record + 4 > bytes.len() {
                return Err(CharsetError::OutOfBounds { offset: record });
            }
            let width = bytes[record];
            let height = bytes[record + 1];
            let x = bytes[record + 2] as i8;
            let y = bytes[record + 3] as i8;

            let pixel_count = width as usize * height as usize;
            let packed_size = (pixel_count * map.bpp as usize + 7) / 8;
            if record + 4 + packed_size > bytes.len() {
                return Err(CharsetError::OutOfBounds { offset: record + 4 });
            }

            let mut unpacker = BitUnpacker::new(&bytes[record + 4..record + 4 + packed_size], map.bpp, mask);
            let data = (0..pixel_count).map(|_| unpacker.next()).collect();

            cell_width = cell_width.max(width);
            map.set_glyph(index, Glyph { width, height, x, y, data });
        }

        // The cell width is not stored in the resource; reconstruct it from
        // the widest glyph.
        map.cell_width = cell_width;
        map.set_max_char((glyph_count - 1) as u16);
        Ok(map)
    }

    /// Write a charmap to a charset file.
    pub fn save(map: &CharMap, path: &Path) -> Result<()> {
        let bytes = Self::to_bytes(map)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load a charmap from a charset file.
    pub fn load(path: &Path) -> Result<CharMap> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

/// MSB-first bit packer emitting full bytes into an output buffer.
struct BitPacker {
    byte: u8,
    bit_pos: u8,
    bpp: u8,
}

impl BitPacker {
    fn new(bpp: u8) -> Self {
        Self { byte: 0, bit_pos: 8, bpp }
    }

    fn push(&mut self, sample: u8, out: &mut Vec<u8>) {
        self.bit_pos -= self.bpp;
        self.byte |= sample << self.bit_pos;
        if self.bit_pos == 0 {
            out.push(self.byte);
            self.byte = 0;
            self.bit_pos = 8;
        }
    }

    /// Emit the trailing partial byte, unused low bits zero.
    fn flush(&mut self, out: &mut Vec<u8>) {
        if self.bit_pos < 8 {
            out.push(self.byte);
            self.byte = 0;
            self.bit_pos = 8;
        }
    }
}

/// MSB-first bit reader over a packed glyph record.
struct BitUnpacker<'a> {
    data: &'a [u8],
    pos: usize,
    bit_pos: u8,
    bpp: u8,
    mask: u8,
}

impl<'a> BitUnpacker<'a> {
    fn new(data: &'a [u8], bpp: u8, mask: u8) -> Self {
        Self {
            data,
            pos: 0,
            bit_pos: 8,
            bpp,
            mask,
        }
    }

    fn next(&mut self) -> u8 {
        self.bit_pos -= self.bpp;
        let sample = (self.data[self.pos] >> self.bit_pos) & self.mask;
        if self.bit_pos == 0 {
            self.pos += 1;
            self.bit_pos = 8;
        }
        sample
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn map_with(glyphs: &[(usize, Glyph)]) -> CharMap {
        let mut map = CharMap::new();
        map.bpp = 1;
        map.line_height = 8;
        map.cell_width = 8;
        for (index, glyph) in glyphs {
            map.set_glyph(*index, glyph.clone());
        }
        map
    }

    fn cross_glyph() -> Glyph {
        Glyph {
            width: 3,
            height: 3,
            x: -1,
            y: 2,
            data: vec![0, 1, 0, 1, 1, 1, 0, 1, 0],
        }
    }

    #[test]
    fn test_chunk_header() {
        let map = map_with(&[(0, cross_glyph())]);
        let bytes = CharsetFormat::to_bytes(&map).unwrap();

        assert_eq!(&bytes[0..4], b"CHAR");
        // payload: header 25 + table 4 + record 4 + 2 packed bytes = 35
        assert_eq!(u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 8 + 35);
        assert_eq!(u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]), 35 - 15);
        assert_eq!(u16::from_le_bytes([bytes[12], bytes[13]]), CHARSET_VERSION);
        assert_eq!(bytes.len(), 8 + 35);
    }

    #[test]
    fn test_bit_packing_2bpp() {
        let mut map = map_with(&[(
            0,
            Glyph {
                width: 5,
                height: 1,
                x: 0,
                y: 0,
                data: vec![3, 0, 2, 1, 3],
            },
        )]);
        map.bpp = 2;

        let bytes = CharsetFormat::to_bytes(&map).unwrap();
        // The 5th sample occupies the high bits of the second byte, the rest
        // of the padding stays zero.
        assert_eq!(&bytes[bytes.len() - 2..], &[0b1100_1001, 0b1100_0000]);
    }

    #[test]
    fn test_offset_table_skips_absent_slots() {
        let small = Glyph {
            width: 2,
            height: 2,
            x: 0,
            y: 0,
            data: vec![1, 0, 0, 1],
        };
        // Slots 0 and 2 populated, slot 1 absent
        let map = map_with(&[(0, small.clone()), (2, small)]);
        let bytes = CharsetFormat::to_bytes(&map).unwrap();

        let entry = |i: usize| u32::from_le_bytes([bytes[33 + i * 4], bytes[34 + i * 4], bytes[35 + i * 4], bytes[36 + i * 4]]);
        // Table is 3 entries, the first record starts right after it
        assert_eq!(entry(0), 4 + 3 * 4);
        assert_eq!(entry(1), 0);
        // 4 byte record header + 1 packed byte
        assert_eq!(entry(2), entry(0) + 4 + 1);
    }

    #[test]
    fn test_offsets_are_relative_to_bpp_byte() {
        let glyph = cross_glyph();
        let map = map_with(&[(0, glyph.clone())]);
        let bytes = CharsetFormat::to_bytes(&map).unwrap();

        // One slot: the stored offset is bpp + height + count + table
        let offset = u32::from_le_bytes([bytes[33], bytes[34], bytes[35], bytes[36]]) as usize;
        assert_eq!(offset, 4 + 4);
        // Resolving it from the bpp byte (29) lands on the record header,
        // which sits directly behind the offset table
        assert_eq!(29 + offset, 33 + 4);
        assert_eq!(bytes[29 + offset], glyph.width);
        assert_eq!(bytes[29 + offset + 1], glyph.height);
    }

    #[test]
    fn test_roundtrip() {
        let mut map = map_with(&[(1, cross_glyph()), (4, cross_glyph())]);
        map.palette[0] = 7;
        map.palette[14] = 12;

        let bytes = CharsetFormat::to_bytes(&map).unwrap();
        let loaded = CharsetFormat::from_bytes(&bytes).unwrap();

        assert_eq!(loaded.palette, map.palette);
        assert_eq!(loaded.bpp, map.bpp);
        assert_eq!(loaded.line_height, map.line_height);
        assert_eq!(loaded.max_char(), map.max_char());
        assert!(loaded.glyph(0).is_none());
        assert_eq!(loaded.glyph(1), map.glyph(1));
        assert_eq!(loaded.glyph(4), map.glyph(4));
    }

    #[test]
    fn test_roundtrip_4bpp() {
        let mut map = map_with(&[(
            0,
            Glyph {
                width: 3,
                height: 2,
                x: 1,
                y: -3,
                data: vec![15, 0, 7, 2, 9, 4],
            },
        )]);
        map.bpp = 4;

        let bytes = CharsetFormat::to_bytes(&map).unwrap();
        let loaded = CharsetFormat::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.glyph(0), map.glyph(0));
    }

    #[test]
    fn test_roundtrip_zero_height_glyph() {
        // Advance-only glyph (space): positive width, no ink rows
        let map = map_with(&[(
            0,
            Glyph {
                width: 6,
                height: 0,
                x: 0,
                y: 0,
                data: Vec::new(),
            },
        )]);

        let bytes = CharsetFormat::to_bytes(&map).unwrap();
        let loaded = CharsetFormat::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.glyph(0), map.glyph(0));
    }

    #[test]
    fn test_encode_is_idempotent() {
        let map = map_with(&[(0, cross_glyph()), (7, cross_glyph())]);
        assert_eq!(CharsetFormat::to_bytes(&map).unwrap(), CharsetFormat::to_bytes(&map).unwrap());
    }

    #[test]
    fn test_unsupported_bpp() {
        let mut map = map_with(&[(0, cross_glyph())]);
        map.bpp = 3;
        assert!(matches!(CharsetFormat::to_bytes(&map), Err(CharsetError::UnsupportedBpp { bpp: 3 })));
    }

    #[test]
    fn test_tag_mismatch() {
        let map = map_with(&[(0, cross_glyph())]);
        let mut bytes = CharsetFormat::to_bytes(&map).unwrap();
        bytes[0] = b'X';
        assert!(matches!(CharsetFormat::from_bytes(&bytes), Err(CharsetError::IdMismatch)));
    }

    #[test]
    fn test_truncated_file() {
        let map = map_with(&[(0, cross_glyph())]);
        let bytes = CharsetFormat::to_bytes(&map).unwrap();
        assert!(matches!(CharsetFormat::from_bytes(&bytes[..20]), Err(CharsetError::FileTooShort)));
        // Cutting into the glyph records is caught by the offset check
        assert!(matches!(
            CharsetFormat::from_bytes(&bytes[..bytes.len() - 3]),
            Err(CharsetError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_bad_version() {
        let map = map_with(&[(0, cross_glyph())]);
        let mut bytes = CharsetFormat::to_bytes(&map).unwrap();
        bytes[12] = 0x64;
        assert!(matches!(
            CharsetFormat::from_bytes(&bytes),
            Err(CharsetError::UnsupportedVersion { version: 0x0364 })
        ));
    }
}
