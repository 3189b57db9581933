use clap::{Args, Subcommand};
use pipeframe_frame::{FrameConfig, DEFAULT_MAX_PAYLOAD};
use pipeframe_transport::config::MAX_PAYLOAD_ENV;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod echo;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Frame newline-delimited JSON from stdin onto stdout.
    Encode(EncodeArgs),
    /// Print the messages in a framed stream read from stdin.
    Decode(DecodeArgs),
    /// Echo every message received on stdin back on stdout.
    Echo(EchoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args),
        Command::Decode(args) => decode::run(args, format),
        Command::Echo(args) => echo::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Re-serialize each line instead of framing its bytes verbatim.
    #[arg(long)]
    pub compact: bool,
    /// Largest payload accepted, in bytes.
    #[arg(long, env = MAX_PAYLOAD_ENV, default_value_t = DEFAULT_MAX_PAYLOAD, value_parser = parse_max_payload)]
    pub max_payload: usize,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Largest declared payload accepted, in bytes.
    #[arg(long, env = MAX_PAYLOAD_ENV, default_value_t = DEFAULT_MAX_PAYLOAD, value_parser = parse_max_payload)]
    pub max_payload: usize,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Exit after echoing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Skip frames that are not valid JSON instead of stopping.
    #[arg(long)]
    pub skip_invalid: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn frame_config(max_payload: usize) -> FrameConfig {
    FrameConfig {
        max_payload_size: max_payload,
        ..FrameConfig::default()
    }
}

fn parse_max_payload(input: &str) -> Result<usize, String> {
    let value: usize = input
        .trim()
        .parse()
        .map_err(|_| format!("invalid byte count: {input}"))?;
    if value == 0 {
        return Err("max payload must be greater than zero".to_string());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_payload_parsing() {
        assert_eq!(parse_max_payload("1024").unwrap(), 1024);
        assert_eq!(parse_max_payload(" 7 ").unwrap(), 7);
        assert!(parse_max_payload("0").is_err());
        assert!(parse_max_payload("1k").is_err());
    }
}
