use std::process::Command;

const VERSION_ENV: &str = "BOOMERANG_VERSION";
const BUILD_HASH_ENV: &str = "BOOMERANG_BUILD_HASH";

fn main() {
    println!("cargo:rerun-if-env-changed={VERSION_ENV}");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let version = std::env::var(VERSION_ENV).unwrap_or_else(|_| "dev".to_string());
    println!("cargo:rustc-env={VERSION_ENV}={version}");

    let hash = git_short_hash().unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env={BUILD_HASH_ENV}={hash}");
}

/// Short hash of the checked-out commit, if built from a git tree.
fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=10", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;

    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string())
}
