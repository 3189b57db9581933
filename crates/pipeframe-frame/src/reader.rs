use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::{decode_prefix, Frame, FrameConfig, PREFIX_SIZE};
use crate::error::{FrameError, FrameStage, Result};

/// Reads complete frames from any `Read` stream (blocking).
///
/// Each read asks for exactly the outstanding remainder of the current
/// frame, capped at the configured chunk size, so no bytes past the frame
/// boundary are ever consumed.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next complete frame.
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached on a
    /// frame boundary and `Err(FrameError::Truncated { .. })` when it is
    /// reached mid-frame.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let mut prefix = [0u8; PREFIX_SIZE];
        let got = fill(&mut self.inner, &mut prefix)?;
        if got == 0 {
            return Err(FrameError::ConnectionClosed);
        }
        if got < PREFIX_SIZE {
            return Err(FrameError::Truncated {
                stage: FrameStage::Prefix,
                expected: PREFIX_SIZE,
                received: got,
            });
        }

        let len = decode_prefix(prefix) as usize;
        self.config.check_payload_len(len)?;

        let chunk = self.config.chunk_size();
        let mut payload = BytesMut::with_capacity(len.min(chunk));
        while payload.len() < len {
            let start = payload.len();
            let want = (len - start).min(chunk);
            payload.resize(start + want, 0);
            let got = fill(&mut self.inner, &mut payload[start..])?;
            if got < want {
                return Err(FrameError::Truncated {
                    stage: FrameStage::Payload,
                    expected: len,
                    received: start + got,
                });
            }
        }

        Ok(Frame {
            payload: payload.freeze(),
        })
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent frame decoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<Frame>;

    /// Yields frames until a clean close; a truncated tail yields one error.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_frame() {
            Ok(frame) => Some(Ok(frame)),
            Err(FrameError::ConnectionClosed) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

/// Read until `buf` is full or the stream ends. Returns the bytes filled.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
