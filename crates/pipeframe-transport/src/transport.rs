use std::sync::Arc;
use std::time::Duration;

use pipeframe_frame::AsyncFrameWriter;
use serde::de::IgnoredAny;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::TransportConfig;
use crate::diagnostics::{log_payload, DiagnosticsMode, Direction};
use crate::error::{Result, TransportError};
use crate::handler::HandlerSlot;
use crate::message::Message;
use crate::read_loop::{ExitGuard, ExitReceiver, ReadLoop, ReadLoopExit};

struct WriteHalf<W> {
    writer: AsyncFrameWriter<W>,
    poisoned: bool,
}

/// Bidirectional framed message transport over a pair of byte streams.
///
/// Construction spawns a read loop that decodes inbound frames and hands
/// each message to the registered handler, in wire order. Outbound messages
/// go through [`send`](Self::send), one whole frame at a time.
///
/// Dropping the transport (or calling [`shutdown`](Self::shutdown)) stops the
/// read loop at its next suspension point and releases the readable stream.
pub struct FramedTransport<W> {
    write: Mutex<WriteHalf<W>>,
    handler: Arc<HandlerSlot>,
    cancel: CancellationToken,
    exit: ExitReceiver,
    diagnostics: DiagnosticsMode,
    write_timeout: Option<Duration>,
}

impl<W: AsyncWrite + Unpin> FramedTransport<W> {
    /// Wrap `reader` and `writer` and start the read loop on `runtime`.
    ///
    /// Never blocks. Read and write timeouts, if configured, need a runtime
    /// with the time driver enabled.
    pub fn new<R>(reader: R, writer: W, config: TransportConfig, runtime: &Handle) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let handler = Arc::new(HandlerSlot::new());
        let cancel = CancellationToken::new();
        let (exit_tx, exit_rx) = watch::channel(None);

        let read_loop = ReadLoop::new(reader, Arc::clone(&handler), cancel.clone(), &config);
        runtime.spawn(async move {
            let guard = ExitGuard::new(exit_tx);
            tracing::debug!("read loop started");
            let exit = read_loop.run().await;
            guard.publish(exit);
        });

        Self {
            write: Mutex::new(WriteHalf {
                writer: AsyncFrameWriter::with_config(writer, config.frame.clone()),
                poisoned: false,
            }),
            handler,
            cancel,
            exit: exit_rx,
            diagnostics: config.diagnostics,
            write_timeout: config.write_timeout,
        }
    }

    /// Like [`new`](Self::new), on the current runtime with
    /// [`TransportConfig::from_env`].
    pub fn spawn<R>(reader: R, writer: W) -> Result<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| TransportError::NoRuntime)?;
        Ok(Self::new(reader, writer, TransportConfig::from_env(), &runtime))
    }

    /// Replace the message handler. Applies from the next decoded message.
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        self.handler.replace(Arc::new(handler));
    }

    /// Restore the default handler, which discards messages.
    pub fn clear_handler(&self) {
        self.set_handler(|_| {});
    }

    /// Serialize `message` as JSON and write it as one frame.
    ///
    /// Dropping the returned future part way through a frame leaves the
    /// writer poisoned: later sends fail with
    /// [`TransportError::WriterPoisoned`].
    pub async fn send<T>(&self, message: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(message).map_err(TransportError::Encoding)?;
        self.write_frame(&payload).await
    }

    /// Write pre-encoded JSON bytes as one frame, verbatim.
    ///
    /// The bytes are checked to hold exactly one JSON document first.
    pub async fn send_raw(&self, payload: &[u8]) -> Result<()> {
        serde_json::from_slice::<IgnoredAny>(payload).map_err(TransportError::Encoding)?;
        self.write_frame(payload).await
    }

    async fn write_frame(&self, payload: &[u8]) -> Result<()> {
        log_payload(self.diagnostics, Direction::Send, payload);

        let mut write = self.write.lock().await;
        if write.poisoned {
            return Err(TransportError::WriterPoisoned);
        }

        // Stays set if this future is dropped or times out mid-frame.
        write.poisoned = true;
        let result = match self.write_timeout {
            Some(limit) => match tokio::time::timeout(limit, write.writer.send(payload)).await {
                Ok(result) => result,
                Err(_) => return Err(TransportError::Timeout(limit)),
            },
            None => write.writer.send(payload).await,
        };
        write.poisoned = false;
        result.map_err(TransportError::from_write)
    }

    /// Stop the read loop. Idempotent.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// True once the read loop has ended, for any reason.
    pub fn is_closed(&self) -> bool {
        self.exit.borrow().is_some()
    }

    /// How the read loop ended, or `None` while it is still running.
    pub fn exit(&self) -> Option<ReadLoopExit> {
        self.exit.borrow().clone()
    }

    /// Wait for the read loop to end.
    pub async fn closed(&self) -> ReadLoopExit {
        let mut rx = self.exit.clone();
        let exit = match rx.wait_for(Option::is_some).await {
            Ok(exit) => exit.clone().unwrap_or_else(ReadLoopExit::aborted),
            Err(_) => ReadLoopExit::aborted(),
        };
        exit
    }
}

impl<W> Drop for FramedTransport<W> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
