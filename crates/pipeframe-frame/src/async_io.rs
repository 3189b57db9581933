//! Async frame reader and writer over tokio byte streams.
//!
//! These mirror [`FrameReader`](crate::FrameReader) and
//! [`FrameWriter`](crate::FrameWriter) and follow the same exact-read rules:
//! the prefix is read as exactly 4 bytes and the payload in chunks of at most
//! `read_chunk_size`, never past the frame boundary.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec::{decode_prefix, encode_frame, Frame, FrameConfig, PREFIX_SIZE};
use crate::error::{FrameError, FrameStage, Result};

/// Reads complete frames from an `AsyncRead` stream.
pub struct AsyncFrameReader<R> {
    inner: R,
    config: FrameConfig,
}

impl<R: AsyncRead + Unpin> AsyncFrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: R, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the 4-byte prefix and return the declared payload length.
    ///
    /// Clean EOF before the first prefix byte is `ConnectionClosed`.
    pub async fn read_prefix(&mut self) -> Result<usize> {
        let mut prefix = [0u8; PREFIX_SIZE];
        let got = fill(&mut self.inner, &mut prefix).await?;
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
        Ok(len)
    }

    /// Accumulate exactly `len` payload bytes.
    pub async fn read_payload(&mut self, len: usize) -> Result<Bytes> {
        let chunk = self.config.chunk_size();
        let mut payload = BytesMut::with_capacity(len.min(chunk));
        while payload.len() < len {
            let start = payload.len();
            let want = (len - start).min(chunk);
            payload.resize(start + want, 0);
            let got = fill(&mut self.inner, &mut payload[start..]).await?;
            tracing::trace!(want, got, total = start + got, len, "payload chunk");
            if got < want {
                return Err(FrameError::Truncated {
                    stage: FrameStage::Payload,
                    expected: len,
                    received: start + got,
                });
            }
        }
        Ok(payload.freeze())
    }

    /// Read the next complete frame.
    pub async fn read_frame(&mut self) -> Result<Frame> {
        let len = self.read_prefix().await?;
        let payload = self.read_payload(len).await?;
        Ok(Frame { payload })
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

/// Writes complete frames to an `AsyncWrite` stream.
pub struct AsyncFrameWriter<W> {
    inner: W,
    buf: BytesMut,
    config: FrameConfig,
}

impl<W: AsyncWrite + Unpin> AsyncFrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: W, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
            config,
        }
    }

    /// Encode `payload` as one frame, write it in full, then flush.
    pub async fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.config.check_payload_len(payload.len())?;

        self.buf.clear();
        encode_frame(payload, &mut self.buf)?;
        self.inner.write_all(&self.buf).await?;
        self.inner.flush().await?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

async fn fill<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;

    /// Hands out one byte per poll and returns `Pending` in between.
    struct Trickle {
        bytes: Vec<u8>,
        pos: usize,
        ready: bool,
    }

    impl AsyncRead for Trickle {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            if !self.ready {
                self.ready = true;
                cx.waker().wake_by_ref();
                return Poll::Pending;
            }
            self.ready = false;
            if self.pos < self.bytes.len() && buf.remaining() > 0 {
                let byte = self.bytes[self.pos];
                self.pos += 1;
                buf.put_slice(&[byte]);
            }
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn writer_then_reader_roundtrip() {
        let (client, server) = tokio::io::duplex(64);
        let mut writer = AsyncFrameWriter::new(client);
        let mut reader = AsyncFrameReader::new(server);

        writer.send(br#"{"method":"ping","id":1}"#).await.unwrap();
        let frame = reader.read_frame().await.unwrap();
        assert_eq!(frame.payload.as_ref(), br#"{"method":"ping","id":1}"#);
    }

    #[tokio::test]
    async fn trickled_bytes_assemble_one_frame() {
        let mut wire = BytesMut::new();
        encode_frame(br#"{"a":[1,2,3]}"#, &mut wire).unwrap();

        let mut reader = AsyncFrameReader::new(Trickle {
            bytes: wire.to_vec(),
            pos: 0,
            ready: false,
        });
        let frame = reader.read_frame().await.unwrap();
        assert_eq!(frame.payload.as_ref(), br#"{"a":[1,2,3]}"#);
        assert!(reader.read_frame().await.unwrap_err().is_clean_close());
    }

    #[tokio::test]
    async fn prefix_truncation_reports_received_count() {
        let mut reader = AsyncFrameReader::new(&b"\x10\x00"[..]);
        let err = reader.read_prefix().await.unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                stage: FrameStage::Prefix,
                expected: 4,
                received: 2
            }
        ));
    }

    #[tokio::test]
    async fn payload_truncation_reports_received_count() {
        let bytes = [0x05, 0x00, 0x00, 0x00, b'a', b'b'];
        let mut reader = AsyncFrameReader::new(&bytes[..]);
        let err = reader.read_frame().await.unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                stage: FrameStage::Payload,
                expected: 5,
                received: 2
            }
        ));
    }

    #[tokio::test]
    async fn declared_length_over_cap_is_rejected_before_payload() {
        let bytes: [u8; 4] = [0x00, 0x01, 0x00, 0x00];
        let mut reader = AsyncFrameReader::with_config(
            &bytes[..],
            FrameConfig {
                max_payload_size: 255,
                ..FrameConfig::default()
            },
        );
        let err = reader.read_prefix().await.unwrap_err();
        assert!(matches!(
            err,
            FrameError::PayloadTooLarge { size: 256, max: 255 }
        ));
    }

    #[tokio::test]
    async fn payload_larger_than_chunk_is_accumulated() {
        let payload = vec![b'7'; READ_CHUNK_FOR_TEST * 5 + 3];
        let mut wire = BytesMut::new();
        encode_frame(&payload, &mut wire).unwrap();

        let mut reader = AsyncFrameReader::with_config(
            &wire[..],
            FrameConfig {
                read_chunk_size: READ_CHUNK_FOR_TEST,
                ..FrameConfig::default()
            },
        );
        let frame = reader.read_frame().await.unwrap();
        assert_eq!(frame.payload.as_ref(), payload.as_slice());
    }

    const READ_CHUNK_FOR_TEST: usize = 16;
}
