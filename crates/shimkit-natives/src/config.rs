//! Resolver configuration.
//!
//! One [`NativesConfig`] is built at startup (usually from the environment)
//! and handed to the resolvers. Nothing below this module reads environment
//! variables.

use crate::codec::{DEFAULT_ABI, DEFAULT_BASE_URL, DEFAULT_VERSION};
use crate::errors::Result;
use crate::lock::LockPolicy;
use crate::paths::default_cache_root;
use crate::platform::Platform;
use crate::verify::parse_sha256;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const ENV_LIBRARY_PATH: &str = "SHIMKIT_LIBRARY_PATH";
pub const ENV_FLAVOR: &str = "SHIMKIT_FLAVOR";
pub const ENV_BASE_URL: &str = "SHIMKIT_BASE_URL";
pub const ENV_CACHE_DIR: &str = "SHIMKIT_CACHE_DIR";
pub const ENV_DISABLE_DOWNLOAD: &str = "SHIMKIT_DISABLE_DOWNLOAD";
pub const ENV_INSTALL_ROOT: &str = "SHIMKIT_INSTALL_ROOT";
pub const ENV_DOWNLOAD_TIMEOUT_SECS: &str = "SHIMKIT_DOWNLOAD_TIMEOUT_SECS";

pub const ENV_OPENH264_LIBRARY_PATH: &str = "OPENH264_LIBRARY_PATH";
pub const ENV_OPENH264_VERSION: &str = "OPENH264_VERSION";
pub const ENV_OPENH264_ABI: &str = "OPENH264_ABI";
pub const ENV_OPENH264_URL: &str = "OPENH264_URL";
pub const ENV_OPENH264_SHA256: &str = "OPENH264_SHA256";
pub const ENV_OPENH264_BASE_URL: &str = "OPENH264_BASE_URL";

/// Flavor used when none is configured.
pub const DEFAULT_FLAVOR: &str = "default";

/// Wall-clock ceiling for a single artifact download.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

const LOG_TARGET: &str = "shimkit::natives::config";

#[derive(Debug, Clone)]
pub struct NativesConfig {
    /// Root of the on-disk artifact cache.
    pub cache_dir: PathBuf,
    /// Skip network resolution; unresolved libraries come back as bare names.
    pub disable_download: bool,
    /// Optional install prefix searched as `<root>/lib`.
    pub install_root: Option<PathBuf>,
    pub download_timeout: Duration,
    pub platform: Platform,
    /// Wait budget for a busy cache entry. Keep it at least as long as
    /// `download_timeout`; see [`LockPolicy::covering`].
    pub lock: LockPolicy,
    pub shim: ShimConfig,
    pub openh264: Openh264Config,
}

/// Options for the manifest-driven shim library.
#[derive(Debug, Clone)]
pub struct ShimConfig {
    /// Operator-pinned library; used as-is and never verified.
    pub library_path: Option<PathBuf>,
    pub flavor: String,
    /// Replaces the manifest's `base_url`.
    pub base_url: Option<String>,
}

/// Options for the procedurally named OpenH264 codec library.
#[derive(Debug, Clone)]
pub struct Openh264Config {
    /// Operator-pinned library; used as-is and never verified.
    pub library_path: Option<PathBuf>,
    pub version: String,
    pub abi: String,
    /// Full download URL; skips archive-name derivation.
    pub url: Option<String>,
    /// Lowercase hex, validated when the config is built.
    pub sha256: Option<String>,
    pub base_url: String,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            library_path: None,
            flavor: DEFAULT_FLAVOR.to_string(),
            base_url: None,
        }
    }
}

impl Default for Openh264Config {
    fn default() -> Self {
        Self {
            library_path: None,
            version: DEFAULT_VERSION.to_string(),
            abi: DEFAULT_ABI.to_string(),
            url: None,
            sha256: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Default for NativesConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_root(),
            disable_download: false,
            install_root: None,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            platform: Platform::current(),
            lock: LockPolicy::default(),
            shim: ShimConfig::default(),
            openh264: Openh264Config::default(),
        }
    }
}

impl NativesConfig {
    /// Defaults rooted at a specific cache directory.
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }

    /// Read the `SHIMKIT_*` / `OPENH264_*` environment variables.
    ///
    /// Fails only on a malformed `OPENH264_SHA256`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`NativesConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // empty / whitespace-only values count as unset
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut cfg = Self::default();

        if let Some(dir) = get(ENV_CACHE_DIR) {
            cfg.cache_dir = PathBuf::from(dir);
        }
        if let Some(flag) = get(ENV_DISABLE_DOWNLOAD) {
            cfg.disable_download = parse_flag(&flag);
        }
        cfg.install_root = get(ENV_INSTALL_ROOT).map(PathBuf::from);
        if let Some(raw) = get(ENV_DOWNLOAD_TIMEOUT_SECS) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => cfg.download_timeout = Duration::from_secs(secs),
                _ => warn!(
                    target: LOG_TARGET,
                    value = %raw,
                    "ignoring invalid {ENV_DOWNLOAD_TIMEOUT_SECS}"
                ),
            }
        }
        // waiters must outlast a holder that uses its whole timeout
        cfg.lock = LockPolicy::covering(cfg.download_timeout);

        cfg.shim.library_path = get(ENV_LIBRARY_PATH).map(PathBuf::from);
        if let Some(flavor) = get(ENV_FLAVOR) {
            cfg.shim.flavor = flavor;
        }
        cfg.shim.base_url = get(ENV_BASE_URL);

        let codec = &mut cfg.openh264;
        codec.library_path = get(ENV_OPENH264_LIBRARY_PATH).map(PathBuf::from);
        if let Some(v) = get(ENV_OPENH264_VERSION) {
            codec.version = v;
        }
        if let Some(abi) = get(ENV_OPENH264_ABI) {
            codec.abi = abi;
        }
        codec.url = get(ENV_OPENH264_URL);
        if let Some(base) = get(ENV_OPENH264_BASE_URL) {
            codec.base_url = base;
        }
        codec.sha256 = get(ENV_OPENH264_SHA256)
            .map(|raw| parse_sha256(&raw, ENV_OPENH264_SHA256))
            .transpose()?;

        Ok(cfg)
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
