//! Generates `$OUT_DIR/version.rs` with the build metadata exposed by
//! `core::version`.
//!
//! Cargo only reruns this script when one of the `rerun-if-changed` paths
//! below changes, so every run regenerates the file unconditionally.

use chrono::Utc;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR"));
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR"));
    let cargo_toml = manifest_dir.join("Cargo.toml");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}", cargo_toml.display());
    for path in git_watch_paths(&manifest_dir) {
        println!("cargo:rerun-if-changed={}", path.display());
    }

    let key_schema_version = read_key_schema_version(&cargo_toml);
    let build_time = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let git_hash = git_short_hash().unwrap_or_else(|| "unknown".to_string());
    let pkg_version = env::var("CARGO_PKG_VERSION").unwrap_or_default();

    let generated = format!(
        "pub const KEY_SCHEMA_VERSION: u32 = {key_schema_version};\n\
         pub const PKG_VERSION: &str = {pkg_version:?};\n\
         pub const BUILD_TIME: &str = {build_time:?};\n\
         pub const GIT_HASH: &str = {git_hash:?};\n"
    );
    fs::write(out_dir.join("version.rs"), generated).expect("write version.rs");
}

/// `[package.metadata] key_schema_version`; the build fails without it since
/// brokers compare it against configured deployments.
fn read_key_schema_version(cargo_toml: &Path) -> u32 {
    let contents = fs::read_to_string(cargo_toml).expect("read Cargo.toml");
    let manifest: toml::Table = contents.parse().expect("parse Cargo.toml");

    let value = manifest
        .get("package")
        .and_then(|p| p.get("metadata"))
        .and_then(|m| m.get("key_schema_version"))
        .and_then(toml::Value::as_integer)
        .expect("Cargo.toml needs an integer [package.metadata] key_schema_version");

    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .expect("key_schema_version must be a positive 32-bit integer")
}

/// `.git/HEAD` plus the ref it points at, so a new commit refreshes GIT_HASH.
/// Paths that do not exist are left out; Cargo would rerun on every build.
fn git_watch_paths(manifest_dir: &Path) -> Vec<PathBuf> {
    let git_dir = manifest_dir.join(".git");
    let head = git_dir.join("HEAD");
    let Ok(head_contents) = fs::read_to_string(&head) else {
        return Vec::new();
    };

    let mut paths = vec![head];
    if let Some(reference) = head_contents.trim().strip_prefix("ref: ") {
        let ref_path = git_dir.join(reference);
        if ref_path.exists() {
            paths.push(ref_path);
        }
    }
    let packed = git_dir.join("packed-refs");
    if packed.exists() {
        paths.push(packed);
    }
    paths
}

fn git_short_hash() -> Option<String> {
    let output = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string())
}
