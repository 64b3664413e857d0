//! Line framing for the chat protocol
//!
//! Splits input on `\n` and decodes each line leniently: bytes that are not
//! valid UTF-8 become U+FFFD instead of failing the connection. A trailing
//! `\r` is stripped. Output lines are terminated with `\n`.

use bytes::BytesMut;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder, Encoder};

/// Newline-delimited text codec with a line length cap
#[derive(Debug, Clone)]
pub struct ChatCodec {
    inner: AnyDelimiterCodec,
}

impl ChatCodec {
    /// Create a codec rejecting lines longer than `max_length` bytes
    pub fn new_with_max_length(max_length: usize) -> Self {
        Self {
            inner: AnyDelimiterCodec::new_with_max_length(vec![b'\n'], vec![b'\n'], max_length),
        }
    }

    fn to_line(chunk: &[u8]) -> String {
        let chunk = chunk.strip_suffix(b"\r").unwrap_or(chunk);
        String::from_utf8_lossy(chunk).into_owned()
    }
}

impl Decoder for ChatCodec {
    type Item = String;
    type Error = AnyDelimiterCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        Ok(self.inner.decode(buf)?.map(|chunk| Self::to_line(&chunk)))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        Ok(self.inner.decode_eof(buf)?.map(|chunk| Self::to_line(&chunk)))
    }
}

impl Encoder<String> for ChatCodec {
    type Error = AnyDelimiterCodecError;

    fn encode(&mut self, line: String, buf: &mut BytesMut) -> Result<(), Self::Error> {
        self.inner.encode(line, buf)
    }
}
