mod charset_format;
pub use charset_format::*;
