use crate::error::{Error, Result};

/// Length-prefix framing for the wire protocol.
///
/// A frame is a 4-byte big-endian length `L` followed by exactly `L`
/// payload bytes. There is no compression and no checksum; frame order
/// relies solely on the underlying stream.

/// Default upper bound on a single frame's payload.
pub const DEFAULT_MAX_FRAME_LEN: usize = 8 * 1024 * 1024;

const LEN_PREFIX: usize = 4;

/// Encode one payload into a framed byte buffer.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(LEN_PREFIX + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Resumable frame extractor.
///
/// Bytes are fed in as they arrive off the stream; complete payloads
/// come out one at a time, in arrival order. Partial frames accumulate
/// across calls, and a single feed may hold several back-to-back frames.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    max_frame_len: usize,
}

impl FrameDecoder {
    pub fn new(max_frame_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_frame_len,
        }
    }

    /// Buffer freshly received bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Extract the next complete payload, if one is buffered.
    ///
    /// A declared length over the configured maximum poisons the stream;
    /// the caller is expected to drop the connection rather than resync.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if self.buf.len() < LEN_PREFIX {
            return Ok(None);
        }
        let len = u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]) as usize;
        if len > self.max_frame_len {
            return Err(Error::InvalidFrame(format!(
                "declared length {} exceeds maximum {}",
                len, self.max_frame_len
            )));
        }
        if self.buf.len() < LEN_PREFIX + len {
            return Ok(None);
        }
        let payload = self
            .buf
            .drain(..LEN_PREFIX + len)
            .skip(LEN_PREFIX)
            .collect();
        Ok(Some(payload))
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}
