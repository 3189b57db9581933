//! Length-prefixed JSON message framing for byte streams.
//!
//! Every message on the wire is framed as:
//! - A 4-byte little-endian payload length
//! - The payload itself, UTF-8 encoded JSON
//!
//! There is no magic number, version byte or checksum; frames are simply
//! concatenated. Readers handle partial reads internally and never consume
//! bytes past the end of the current frame.

#[cfg(feature = "async")]
pub mod async_io;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_io::{AsyncFrameReader, AsyncFrameWriter};
pub use codec::{
    decode_frame, decode_prefix, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD,
    PREFIX_SIZE, READ_CHUNK_SIZE,
};
pub use error::{FrameError, FrameStage, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
