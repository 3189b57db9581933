use std::fmt;

/// Which part of a frame was being read when the stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    /// The 4-byte length prefix.
    Prefix,
    /// The payload following the prefix.
    Payload,
}

impl fmt::Display for FrameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameStage::Prefix => f.write_str("length prefix"),
            FrameStage::Payload => f.write_str("payload"),
        }
    }
}

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The stream ended part way through a frame.
    #[error("stream truncated in {stage}: expected {expected} bytes, got {received}")]
    Truncated {
        stage: FrameStage,
        expected: usize,
        received: usize,
    },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended cleanly on a frame boundary.
    #[error("connection closed")]
    ConnectionClosed,
}

impl FrameError {
    /// True when the stream ended with no partial frame outstanding.
    pub fn is_clean_close(&self) -> bool {
        matches!(self, FrameError::ConnectionClosed)
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
