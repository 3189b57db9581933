use std::io::{self, Read, Write};

use pipeframe_frame::{FrameError, FrameReader};
use pipeframe_transport::decode_message;

use crate::cmd::{frame_config, DecodeArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{write_message, OutputFormat, Received};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let messages = decode_stream(stdin.lock(), &mut stdout.lock(), &args, format)?;
    tracing::debug!(messages, "decode finished");
    Ok(SUCCESS)
}

/// Print messages until end of stream or `--count`. Returns how many were
/// printed.
fn decode_stream<R: Read, W: Write>(
    input: R,
    out: &mut W,
    args: &DecodeArgs,
    format: OutputFormat,
) -> CliResult<usize> {
    let mut reader = FrameReader::with_config(input, frame_config(args.max_payload));
    let mut index = 0usize;

    while args.count.is_none_or(|count| index < count) {
        let frame = match reader.read_frame() {
            Ok(frame) => frame,
            Err(FrameError::ConnectionClosed) => break,
            Err(err) => return Err(frame_error(&format!("frame {index}"), err)),
        };

        let message = decode_message(&frame.payload)
            .map_err(|err| CliError::new(DATA_INVALID, format!("frame {index}: {err}")))?;

        let received = Received {
            index,
            payload_size: frame.payload.len(),
            message: &message,
        };
        write_message(out, &received, format)
            .map_err(|err| io_error("failed writing stdout", &err))?;
        index += 1;
    }

    Ok(index)
}
