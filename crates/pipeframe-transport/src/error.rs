use std::time::Duration;

use pipeframe_frame::{FrameError, FrameStage};

/// A frame payload that could not be turned into a message.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload is not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The payload is UTF-8 but not a JSON document.
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The readable stream ended part way through a frame.
    #[error("stream truncated in {stage}: expected {expected} bytes, got {received}")]
    Truncated {
        stage: FrameStage,
        expected: usize,
        received: usize,
    },

    /// An inbound payload could not be decoded.
    #[error("failed to decode message: {0}")]
    Decode(#[from] DecodeError),

    /// An outbound message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encoding(#[source] serde_json::Error),

    /// The writable stream rejected a frame.
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    /// The readable stream failed.
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    /// A payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A read or write did not complete in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// A previous write was abandoned mid-frame; the outbound stream is unusable.
    #[error("outbound stream abandoned mid-frame; no further frames can be written")]
    WriterPoisoned,

    /// No tokio runtime was available to run the read loop.
    #[error("no tokio runtime available to run the read loop")]
    NoRuntime,

    /// The read loop task was dropped or panicked before reporting an outcome.
    #[error("read loop aborted")]
    Aborted,
}

impl TransportError {
    /// Map a frame error raised while reading.
    pub fn from_read(err: FrameError) -> Self {
        match err {
            FrameError::Truncated {
                stage,
                expected,
                received,
            } => TransportError::Truncated {
                stage,
                expected,
                received,
            },
            FrameError::PayloadTooLarge { size, max } => {
                TransportError::PayloadTooLarge { size, max }
            }
            FrameError::Io(io) => TransportError::Read(io),
            FrameError::ConnectionClosed => {
                TransportError::Read(std::io::ErrorKind::UnexpectedEof.into())
            }
        }
    }

    /// Map a frame error raised while writing.
    pub fn from_write(err: FrameError) -> Self {
        match err {
            FrameError::PayloadTooLarge { size, max } => {
                TransportError::PayloadTooLarge { size, max }
            }
            FrameError::Io(io) => TransportError::Write(io),
            FrameError::ConnectionClosed => {
                TransportError::Write(std::io::ErrorKind::WriteZero.into())
            }
            other => TransportError::Write(std::io::Error::other(other.to_string())),
        }
    }

    /// True if the stream ended mid-frame.
    pub fn is_truncated(&self) -> bool {
        matches!(self, TransportError::Truncated { .. })
    }

    /// True if an inbound payload failed to decode.
    pub fn is_decode(&self) -> bool {
        matches!(self, TransportError::Decode(_))
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
