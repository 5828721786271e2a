//! Line codec for the IRC wire format
//!
//! Inbound bytes are split on `\n`; a trailing `\r` and surrounding
//! whitespace are stripped. Bytes that are not valid UTF-8 are replaced
//! rather than failing the connection, since servers relay whatever
//! encoding clients send. A line longer than [`MAX_LINE_LENGTH`] is
//! dropped up to its terminating `\n` and the stream carries on. Outbound
//! lines get `\r\n` appended.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::BotError;

/// Longest inbound line that is delivered; longer ones are discarded.
/// IRCv3 tags can push lines well past the classic 512 bytes.
pub const MAX_LINE_LENGTH: usize = 8192;

const TERMINATOR: &[u8] = b"\r\n";

/// Codec that frames the socket into text lines
#[derive(Debug, Clone, Default)]
pub struct LineCodec {
    /// How far into the buffer has already been searched for `\n`
    next_index: usize,
    /// Skipping the rest of an overlong line
    discarding: bool,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = BotError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, BotError> {
        loop {
            let search_from = self.next_index.min(buf.len());
            match buf[search_from..].iter().position(|b| *b == b'\n') {
                Some(offset) => {
                    let end = search_from + offset;
                    let line = buf.split_to(end + 1);
                    self.next_index = 0;
                    if self.discarding || end > MAX_LINE_LENGTH {
                        if !self.discarding {
                            tracing::warn!("Dropped inbound line of {} bytes", end);
                        }
                        self.discarding = false;
                        continue;
                    }
                    let text = String::from_utf8_lossy(&line[..end]);
                    return Ok(Some(text.trim().to_string()));
                }
                None if self.discarding || buf.len() > MAX_LINE_LENGTH => {
                    if !self.discarding {
                        tracing::warn!(
                            "Inbound line exceeds {} bytes, discarding it",
                            MAX_LINE_LENGTH
                        );
                    }
                    self.discarding = true;
                    self.next_index = 0;
                    buf.clear();
                    return Ok(None);
                }
                None => {
                    self.next_index = buf.len();
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, BotError> {
        match self.decode(buf)? {
            Some(line) => Ok(Some(line)),
            None if buf.is_empty() => Ok(None),
            None => {
                // Unterminated final line
                let rest = buf.split_to(buf.len());
                self.next_index = 0;
                Ok(Some(String::from_utf8_lossy(&rest).trim().to_string()))
            }
        }
    }
}

impl<T: AsRef<str>> Encoder<T> for LineCodec {
    type Error = BotError;

    fn encode(&mut self, line: T, buf: &mut BytesMut) -> Result<(), BotError> {
        let line = line.as_ref();
        buf.reserve(line.len() + TERMINATOR.len());
        // An embedded break would let one line smuggle in a second command
        if line.contains(['\r', '\n']) {
            buf.extend_from_slice(line.replace(['\r', '\n'], " ").as_bytes());
        } else {
            buf.extend_from_slice(line.as_bytes());
        }
        buf.extend_from_slice(TERMINATOR);
        Ok(())
    }
}
