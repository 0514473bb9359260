//! Output accumulator for a single read cycle.
//!
//! Raw bytes are kept as received. Normalization is re-applied to the whole
//! buffer after every chunk, so an escape sequence or prompt split across
//! two network reads is seen exactly as if it had arrived in one piece.

use std::borrow::Cow;

use bytes::BytesMut;

use super::patterns::normalize;

/// Raw bytes received since the cycle started (or since the last reset).
#[derive(Debug)]
pub struct OutputBuffer {
    raw: BytesMut,
}

impl OutputBuffer {
    /// Create an empty buffer with the given initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            raw: BytesMut::with_capacity(capacity),
        }
    }

    /// Append a chunk as received from the transport.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.raw.extend_from_slice(chunk);
    }

    /// Escape-stripped, carriage-return-free view of everything received.
    pub fn normalized(&self) -> Vec<u8> {
        normalize(&self.raw)
    }

    /// Normalized view as text (lossy UTF-8 conversion).
    pub fn normalized_lossy(&self) -> String {
        String::from_utf8_lossy(&self.normalized()).into_owned()
    }

    /// Raw bytes, escape sequences included.
    pub fn as_raw(&self) -> &[u8] {
        &self.raw
    }

    /// Raw bytes as text, for trace logging.
    pub fn raw_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }

    /// Get the current raw length.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Discard everything received so far.
    pub fn clear(&mut self) {
        self.raw.clear();
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::with_capacity(4096)
    }
}
