pub mod output;
pub mod range;

pub use output::{slugify, OutputStore};
pub use range::{guess_mime, parse_range, resolve_within_root, ByteRange};
