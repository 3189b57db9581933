use pipeframe_frame::{DEFAULT_MAX_PAYLOAD, PREFIX_SIZE, READ_CHUNK_SIZE};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("pipeframe {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: pipeframe");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("PIPEFRAME_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("PIPEFRAME_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("PIPEFRAME_GIT_HASH").unwrap_or("unknown"));
    println!("wire: u32 little-endian length prefix ({PREFIX_SIZE} bytes) + UTF-8 JSON");
    println!("max_payload_default: {DEFAULT_MAX_PAYLOAD}");
    println!("read_chunk_size: {READ_CHUNK_SIZE}");

    Ok(SUCCESS)
}
