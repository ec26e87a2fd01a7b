//! Fixtures shared by the resolver integration tests.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use shimkit_natives::{LockPolicy, NativesConfig, Platform};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SHIM_BYTES: &[u8] = b"\x7fELF\x02\x01\x01 fake libshimkit";
pub const CODEC_BYTES: &[u8] = b"\x7fELF\x02\x01\x01 fake libopenh264";

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// gzip-compressed tarball of regular files.
pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, path, *data)
            .expect("append tar entry");
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

pub fn bzip2(data: &[u8]) -> Vec<u8> {
    let mut enc = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    enc.write_all(data).expect("compress");
    enc.finish().expect("finish bzip2")
}

/// The shim release tarball used across tests.
pub fn shim_archive() -> Vec<u8> {
    tar_gz(&[("LICENSE", b"MIT"), ("lib/libshimkit.so", SHIM_BYTES)])
}

pub fn manifest_json(base_url: &str, file: &str, sha256: &str) -> String {
    serde_json::json!({
        "schema_version": 1,
        "base_url": base_url,
        "flavors": {
            "default": {
                "release_tag": "v9.9.9",
                "assets": {
                    "linux_amd64": { "file": file, "sha256": sha256 }
                }
            }
        }
    })
    .to_string()
}

/// Config pinned to linux/amd64 with a short download timeout and fast
/// lock retries, independent of the host and its environment.
pub fn config(cache_root: &Path) -> NativesConfig {
    let mut cfg = NativesConfig::with_cache_dir(cache_root);
    cfg.platform = Platform::new("linux", "amd64");
    cfg.download_timeout = Duration::from_secs(10);
    cfg.lock = LockPolicy::covering_with_delay(cfg.download_timeout, Duration::from_millis(20));
    cfg
}

/// Every file and directory under `root`, sorted.
pub fn tree(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                stack.push(path.clone());
            }
            out.push(path.strip_prefix(root).unwrap_or(&path).to_path_buf());
        }
    }
    out.sort();
    out
}

/// Names under `root` that look like in-flight temporaries or locks.
pub fn leftovers(root: &Path) -> Vec<PathBuf> {
    tree(root)
        .into_iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'))
        })
        .collect()
}
