pub mod assembler;
pub mod format;

pub use assembler::{combine, encode_wav, Assembler, AudioSegment};
pub use format::{AudioFormat, Quality};
