use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Length prefix: a single little-endian u32.
pub const PREFIX_SIZE: usize = 4;

/// Largest slice requested from the stream in one payload read: 32 KiB.
pub const READ_CHUNK_SIZE: usize = 32 * 1024;

/// Default maximum payload size: 256 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 256 * 1024 * 1024;

/// A decoded frame payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The raw payload bytes (UTF-8 JSON for well-formed peers).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (prefix + payload).
    pub fn wire_size(&self) -> usize {
        PREFIX_SIZE + self.payload.len()
    }
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────┐
/// │ Length       │ Payload          │
/// │ (4B u32 LE)  │ (Length bytes)   │
/// └──────────────┴──────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(PREFIX_SIZE + payload.len());
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Interpret a length prefix.
pub fn decode_prefix(prefix: [u8; PREFIX_SIZE]) -> u32 {
    u32::from_le_bytes(prefix)
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < PREFIX_SIZE {
        return Ok(None);
    }

    let payload_len = decode_prefix([src[0], src[1], src[2], src[3]]) as usize;
    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    if src.len() < PREFIX_SIZE + payload_len {
        return Ok(None);
    }

    src.advance(PREFIX_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame { payload }))
}

/// Configuration for frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 256 MiB.
    pub max_payload_size: usize,
    /// Upper bound on a single payload read. Default: 32 KiB.
    pub read_chunk_size: usize,
}

impl FrameConfig {
    /// Reject a declared or outgoing payload length above the configured cap.
    pub fn check_payload_len(&self, len: usize) -> Result<()> {
        if len > self.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: len,
                max: self.max_payload_size,
            });
        }
        Ok(())
    }

    /// The chunk size actually used for reads; never zero.
    pub(crate) fn chunk_size(&self) -> usize {
        self.read_chunk_size.max(1)
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_chunk_size: READ_CHUNK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_frame_has_exact_prefix() {
        let payload = br#"{"method":"ping","id":1}"#;
        let mut buf = BytesMut::new();
        encode_frame(payload, &mut buf).unwrap();

        assert_eq!(payload.len(), 24);
        assert_eq!(&buf[..PREFIX_SIZE], &[0x18, 0x00, 0x00, 0x00]);
        assert_eq!(&buf[PREFIX_SIZE..], payload);
        assert_eq!(buf.len(), 28);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let payload = br#"{"hello":"pipeframe"}"#;

        encode_frame(payload, &mut buf).unwrap();
        assert_eq!(buf.len(), PREFIX_SIZE + payload.len());

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(frame.payload.as_ref(), payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_prefix() {
        let mut buf = BytesMut::from(&b"\x05\x00"[..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"hello", &mut buf).unwrap();
        buf.truncate(PREFIX_SIZE + 2);

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_decode_payload_too_large() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(1024);

        let result = decode_frame(&mut buf, 16);
        assert!(matches!(
            result,
            Err(FrameError::PayloadTooLarge { size: 1024, max: 16 })
        ));
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = BytesMut::new();
        encode_frame(b"\"first\"", &mut buf).unwrap();
        encode_frame(b"\"second\"", &mut buf).unwrap();

        let f1 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        let f2 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();

        assert_eq!(f1.payload.as_ref(), b"\"first\"");
        assert_eq!(f2.payload.as_ref(), b"\"second\"");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"", &mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0, 0, 0, 0]);

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_frame_wire_size() {
        let frame = Frame::new(Bytes::from_static(b"test"));
        assert_eq!(frame.wire_size(), PREFIX_SIZE + 4);
    }

    #[test]
    fn zero_chunk_size_is_clamped() {
        let cfg = FrameConfig {
            read_chunk_size: 0,
            ..FrameConfig::default()
        };
        assert_eq!(cfg.chunk_size(), 1);
    }
}
