#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_lossless,
    clippy::cast_precision_loss,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

//! Engine for converting outline fonts into retro game charset resources.
//!
//! The pipeline rasterizes a set of character codes through a [`GlyphRasterizer`],
//! unifies their metrics into a [`CharMap`], and exports the result either as a
//! preview atlas image or as a binary charset resource with variable bit depth
//! (1/2/4 bpp) packed glyph data.

mod error;
pub use error::*;

mod glyph;
pub use glyph::*;

mod rasterizer;
pub use rasterizer::*;

mod charmap;
pub use charmap::*;

mod atlas;
pub use atlas::*;

pub mod formats;
pub use formats::*;
