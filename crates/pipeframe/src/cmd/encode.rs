use std::io::{self, BufRead, Write};

use pipeframe_frame::FrameWriter;
use pipeframe_transport::Message;

use crate::cmd::{frame_config, EncodeArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let frames = encode_lines(stdin.lock(), stdout.lock(), &args)?;
    tracing::debug!(frames, "encode finished");
    Ok(SUCCESS)
}

/// Frame each non-blank input line. Returns the number of frames written.
fn encode_lines<R: BufRead, W: Write>(input: R, output: W, args: &EncodeArgs) -> CliResult<usize> {
    let mut writer = FrameWriter::with_config(output, frame_config(args.max_payload));
    let mut frames = 0usize;

    for (index, line) in input.lines().enumerate() {
        let line = line.map_err(|err| io_error("failed reading stdin", &err))?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let line_no = index + 1;
        let message: Message = serde_json::from_str(text).map_err(|err| {
            CliError::new(DATA_INVALID, format!("line {line_no} is not valid JSON: {err}"))
        })?;

        let result = if args.compact {
            let payload = serde_json::to_vec(&message).map_err(|err| {
                CliError::new(DATA_INVALID, format!("line {line_no}: {err}"))
            })?;
            writer.send(&payload)
        } else {
            writer.send(text.as_bytes())
        };
        result.map_err(|err| frame_error(&format!("line {line_no}"), err))?;
        frames += 1;
    }

    Ok(frames)
}
