use std::fmt;
use std::io;

use pipeframe_frame::FrameError;
use pipeframe_transport::{ReadLoopExit, TransportError};

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: &io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::BrokenPipe
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::UnexpectedEof => FAILURE,
        io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, &source),
        FrameError::PayloadTooLarge { .. } | FrameError::Truncated { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn transport_error(context: &str, err: &TransportError) -> CliError {
    match err {
        TransportError::Read(source) | TransportError::Write(source) => {
            io_error(context, source)
        }
        TransportError::Truncated { .. }
        | TransportError::Decode(_)
        | TransportError::Encoding(_)
        | TransportError::PayloadTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        TransportError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        TransportError::WriterPoisoned => CliError::new(FAILURE, format!("{context}: {err}")),
        TransportError::NoRuntime | TransportError::Aborted => {
            CliError::new(INTERNAL, format!("{context}: {err}"))
        }
    }
}

/// Exit code for a finished read loop.
pub fn read_loop_exit(context: &str, exit: &ReadLoopExit) -> CliResult<i32> {
    match exit.error() {
        None => Ok(SUCCESS),
        Some(err) => Err(transport_error(context, err)),
    }
}
