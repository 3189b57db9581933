//! The background task that decodes frames and dispatches messages.
//!
//! One frame is handled completely (prefix, payload, decode, handler call)
//! before the next prefix is read, which gives strict FIFO delivery. After
//! each dispatch the task yields so sends and other work on the same runtime
//! get a turn.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use pipeframe_frame::{AsyncFrameReader, FrameError};
use tokio::io::AsyncRead;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::{DecodeErrorPolicy, TransportConfig};
use crate::diagnostics::{log_message, DiagnosticsMode, Direction};
use crate::error::TransportError;
use crate::handler::HandlerSlot;
use crate::message::decode_message;

/// How the read loop ended.
#[derive(Debug, Clone)]
pub enum ReadLoopExit {
    /// The stream ended cleanly on a frame boundary.
    EndOfStream,
    /// The transport was shut down or dropped.
    Shutdown,
    /// A transport-level error stopped the loop.
    Failed(Arc<TransportError>),
}

impl ReadLoopExit {
    /// The error that stopped the loop, if any.
    pub fn error(&self) -> Option<&TransportError> {
        match self {
            ReadLoopExit::Failed(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// True for `EndOfStream` and `Shutdown`.
    pub fn is_clean(&self) -> bool {
        !matches!(self, ReadLoopExit::Failed(_))
    }

    pub(crate) fn aborted() -> Self {
        ReadLoopExit::Failed(Arc::new(TransportError::Aborted))
    }
}

pub(crate) type ExitSender = watch::Sender<Option<ReadLoopExit>>;
pub(crate) type ExitReceiver = watch::Receiver<Option<ReadLoopExit>>;

/// Publishes the loop outcome exactly once, even if the task unwinds or is
/// dropped by its runtime.
pub(crate) struct ExitGuard {
    tx: ExitSender,
}

impl ExitGuard {
    pub(crate) fn new(tx: ExitSender) -> Self {
        Self { tx }
    }

    pub(crate) fn publish(&self, exit: ReadLoopExit) {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(exit);
            true
        });
    }
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.publish(ReadLoopExit::aborted());
    }
}

pub(crate) struct ReadLoop<R> {
    reader: AsyncFrameReader<R>,
    handler: Arc<HandlerSlot>,
    cancel: CancellationToken,
    diagnostics: DiagnosticsMode,
    decode_error_policy: DecodeErrorPolicy,
    read_timeout: Option<Duration>,
}

impl<R: AsyncRead + Unpin> ReadLoop<R> {
    pub(crate) fn new(
        reader: R,
        handler: Arc<HandlerSlot>,
        cancel: CancellationToken,
        config: &TransportConfig,
    ) -> Self {
        Self {
            reader: AsyncFrameReader::with_config(reader, config.frame.clone()),
            handler,
            cancel,
            diagnostics: config.diagnostics,
            decode_error_policy: config.decode_error_policy,
            read_timeout: config.read_timeout,
        }
    }

    /// Run until end of stream, shutdown, or a fatal error. The reader is
    /// dropped when this returns.
    pub(crate) async fn run(mut self) -> ReadLoopExit {
        let cancel = self.cancel.clone();
        let mut delivered = 0u64;

        loop {
            let len = tokio::select! {
                biased;
                _ = cancel.cancelled() => return ReadLoopExit::Shutdown,
                res = self.reader.read_prefix() => match res {
                    Ok(len) => len,
                    Err(FrameError::ConnectionClosed) => {
                        tracing::debug!(delivered, "read loop reached end of stream");
                        return ReadLoopExit::EndOfStream;
                    }
                    Err(err) => return fail(TransportError::from_read(err)),
                },
            };

            let payload = tokio::select! {
                biased;
                _ = cancel.cancelled() => return ReadLoopExit::Shutdown,
                res = self.read_payload(len) => match res {
                    Ok(payload) => payload,
                    Err(err) => return fail(err),
                },
            };

            match decode_message(&payload) {
                Ok(message) => {
                    log_message(self.diagnostics, Direction::Recv, &message);
                    let handler = self.handler.current();
                    handler(message);
                    delivered += 1;
                }
                Err(err) => match self.decode_error_policy {
                    DecodeErrorPolicy::Fatal => return fail(TransportError::Decode(err)),
                    DecodeErrorPolicy::Skip => {
                        tracing::warn!(error = %err, len, "skipping undecodable frame");
                    }
                },
            }

            tokio::task::yield_now().await;
        }
    }

    async fn read_payload(&mut self, len: usize) -> Result<Bytes, TransportError> {
        let read = self.reader.read_payload(len);
        let result = match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| TransportError::Timeout(limit))?,
            None => read.await,
        };
        result.map_err(TransportError::from_read)
    }
}

fn fail(err: TransportError) -> ReadLoopExit {
    tracing::debug!(error = %err, "read loop stopped");
    ReadLoopExit::Failed(Arc::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_is_published_once() {
        let (tx, rx) = watch::channel(None);
        let guard = ExitGuard::new(tx);
        guard.publish(ReadLoopExit::EndOfStream);
        guard.publish(ReadLoopExit::Shutdown);
        drop(guard);

        assert!(matches!(*rx.borrow(), Some(ReadLoopExit::EndOfStream)));
    }

    #[test]
    fn dropped_guard_reports_abort() {
        let (tx, rx) = watch::channel(None);
        drop(ExitGuard::new(tx));

        let exit = rx.borrow().clone().unwrap();
        assert!(matches!(exit.error(), Some(TransportError::Aborted)));
        assert!(!exit.is_clean());
    }

    #[tokio::test]
    async fn truncated_prefix_ends_loop_without_dispatch() {
        let slot = Arc::new(HandlerSlot::new());
        let hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        slot.replace(Arc::new(move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }));

        let read_loop = ReadLoop::new(
            &b"\x18\x00"[..],
            slot,
            CancellationToken::new(),
            &TransportConfig::default(),
        );
        let exit = read_loop.run().await;

        assert!(exit.error().is_some_and(TransportError::is_truncated));
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancelled_before_first_read() {
        let (_keep_open, reader) = tokio::io::duplex(8);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let read_loop = ReadLoop::new(
            reader,
            Arc::new(HandlerSlot::new()),
            cancel,
            &TransportConfig::default(),
        );
        assert!(matches!(read_loop.run().await, ReadLoopExit::Shutdown));
    }
}
