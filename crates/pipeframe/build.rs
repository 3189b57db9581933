use std::process::Command;

fn main() {
    if let Ok(target) = std::env::var("TARGET") {
        println!("cargo:rustc-env=PIPEFRAME_BUILD_TARGET={target}");
    }
    if let Ok(profile) = std::env::var("PROFILE") {
        println!("cargo:rustc-env=PIPEFRAME_BUILD_PROFILE={profile}");
    }

    // Builds from a source tarball have no git metadata; version falls back
    // to "unknown".
    let hash = Command::new("git")
        .args(["rev-parse", "--short=12", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok());
    if let Some(hash) = hash.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
        println!("cargo:rustc-env=PIPEFRAME_GIT_HASH={hash}");
    }

    println!("cargo:rerun-if-env-changed=TARGET");
    println!("cargo:rerun-if-env-changed=PROFILE");
    println!("cargo:rerun-if-changed=build.rs");
}
