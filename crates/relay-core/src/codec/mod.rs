//! Wire framing shared by line-oriented endpoints

mod line_codec;

pub use line_codec::LineCodec;
