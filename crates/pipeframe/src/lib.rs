//! Length-prefixed JSON messaging over a pair of byte streams.
//!
//! Every message travels as a 4-byte little-endian length followed by that
//! many bytes of UTF-8 JSON. A [`FramedTransport`](transport::FramedTransport)
//! reads frames in the background and hands each decoded message to a
//! replaceable handler, while callers send messages from any task.
//!
//! # Crate Structure
//!
//! - [`frame`]: wire format, blocking and async frame readers and writers
//! - [`transport`]: the framed message transport, its config and errors
//!
//! ```no_run
//! use pipeframe::transport::FramedTransport;
//!
//! # async fn demo() -> pipeframe::transport::Result<()> {
//! let transport = FramedTransport::spawn(tokio::io::stdin(), tokio::io::stdout())?;
//! transport.set_handler(|message| println!("got {message}"));
//! transport.send(&serde_json::json!({"method": "ping", "id": 1})).await?;
//! # Ok(())
//! # }
//! ```

/// Re-export frame types.
pub mod frame {
    pub use pipeframe_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use pipeframe_transport::*;
}
