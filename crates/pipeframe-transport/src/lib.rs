//! Bidirectional framed JSON message transport.
//!
//! [`FramedTransport`] wraps a readable and a writable byte stream (for
//! example the stdio pipes of a child process). A background read loop
//! decodes length-prefixed frames and hands each message to a single,
//! replaceable handler; [`FramedTransport::send`] encodes and frames
//! outgoing messages.
//!
//! Decoding failures stop the read loop by default. See
//! [`DecodeErrorPolicy`] for the alternative.

pub mod config;
pub mod diagnostics;
pub mod error;
mod handler;
pub mod message;
pub mod read_loop;
pub mod transport;

pub use config::{DecodeErrorPolicy, TransportConfig};
pub use diagnostics::{DiagnosticsMode, Direction};
pub use error::{DecodeError, Result, TransportError};
pub use handler::Handler;
pub use message::{decode_message, method_of, Message};
pub use read_loop::ReadLoopExit;
pub use transport::FramedTransport;
