//! Line framing for CRLF (or bare LF) terminated text protocols
//!
//! Invalid UTF-8 is replaced rather than rejected. A line longer than the
//! configured maximum is discarded up to its terminator and decoding carries
//! on, since a decoder error would end the whole read stream.

use std::{cmp, io};

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

/// Decoder yielding one `String` per received line, terminator stripped
#[derive(Debug, Clone)]
pub struct LineCodec {
    max_length: usize,
    next_index: usize,
    discarding: bool,
}

impl LineCodec {
    /// Longest line kept by [`LineCodec::new`]
    pub const DEFAULT_MAX_LENGTH: usize = 8192;

    pub fn new() -> Self {
        Self::with_max_length(Self::DEFAULT_MAX_LENGTH)
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, io::Error> {
        loop {
            let read_to = cmp::min(self.max_length.saturating_add(1), buf.len());
            let newline = buf[self.next_index..read_to]
                .iter()
                .position(|b| *b == b'\n');

            match (self.discarding, newline) {
                (true, Some(offset)) => {
                    buf.advance(self.next_index + offset + 1);
                    self.discarding = false;
                    self.next_index = 0;
                }
                (true, None) => {
                    buf.advance(read_to);
                    self.next_index = 0;
                    if buf.is_empty() {
                        return Ok(None);
                    }
                }
                (false, Some(offset)) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;
                    let line = buf.split_to(end + 1);
                    return Ok(Some(line_text(&line[..end])));
                }
                (false, None) if buf.len() > self.max_length => {
                    tracing::warn!(max = self.max_length, "Discarding over-long line");
                    self.discarding = true;
                }
                (false, None) => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, io::Error> {
        let line = self.decode(buf)?;
        if line.is_none() && !buf.is_empty() {
            // Unterminated trailing fragment of a closed stream
            tracing::debug!(len = buf.len(), "Dropping partial line at end of stream");
            buf.clear();
            self.next_index = 0;
        }
        Ok(line)
    }
}

fn line_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
