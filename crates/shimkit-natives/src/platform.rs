//! (OS, architecture) normalization and per-component platform keys.
//!
//! Keys look like `linux_amd64` / `darwin_arm64`. Each resolver owns its own
//! table of supported keys because the shim and the codec are published for
//! different platform sets.

use crate::errors::{NativeError, Result};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    os: String,
    arch: String,
}

impl Platform {
    /// Build from host identifiers. Rust target names (`macos`, `x86_64`,
    /// `aarch64`, ...) are folded onto the canonical spelling.
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: normalize_os(os),
            arch: normalize_arch(arch),
        }
    }

    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Parse `"os/arch"` (also accepts `os_arch` and `os-arch`).
    pub fn parse(s: &str) -> Option<Self> {
        let (os, arch) = s
            .trim()
            .split_once(['/', '_', '-'])
            .filter(|(o, a)| !o.is_empty() && !a.is_empty())?;
        Some(Self::new(os, arch))
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    pub fn is_darwin(&self) -> bool {
        self.os == "darwin"
    }

    pub fn is_linux(&self) -> bool {
        self.os == "linux"
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

fn normalize_os(os: &str) -> String {
    let os = os.trim().to_ascii_lowercase();
    match os.as_str() {
        "macos" | "osx" | "mac" => "darwin".to_string(),
        "win" | "win32" => "windows".to_string(),
        _ => os,
    }
}

fn normalize_arch(arch: &str) -> String {
    let arch = arch.trim().to_ascii_lowercase();
    match arch.as_str() {
        "x86_64" | "x64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        "x86" | "i386" | "i586" | "i686" => "386".to_string(),
        "armv7" | "armv7l" | "armhf" => "arm".to_string(),
        "powerpc64le" => "ppc64le".to_string(),
        "riscv64gc" => "riscv64".to_string(),
        _ => arch,
    }
}

/// Look `platform` up in a closed table of `os_arch` keys.
///
/// Absence is an error, never a guess.
pub fn platform_key(
    table: &[&'static str],
    platform: &Platform,
    component: &'static str,
) -> Result<&'static str> {
    let wanted = format!("{}_{}", platform.os(), platform.arch());
    table
        .iter()
        .copied()
        .find(|k| *k == wanted)
        .ok_or_else(|| NativeError::PlatformUnsupported {
            component,
            os: platform.os().to_string(),
            arch: platform.arch().to_string(),
        })
}
