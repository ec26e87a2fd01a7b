//! shimkit-natives
//!
//! Blocking resolver for the native libraries shimkit loads at runtime.
//! - `shim`: described by an embedded manifest of flavors and release tags.
//! - `openh264`: derived from upstream naming conventions.
//!
//! Each resolution tries an explicit path and the usual local directories,
//! then the on-disk cache, then downloads, verifies (SHA-256), unpacks and
//! atomically installs into the cache under a cross-process lock file.
//!
//! ```no_run
//! use shimkit_natives::{resolve_shim, NativesConfig};
//!
//! let cfg = NativesConfig::from_env()?;
//! let shim = resolve_shim(&cfg)?;
//! println!("{} ({})", shim.path.display(), shim.origin);
//! # Ok::<(), shimkit_natives::NativeError>(())
//! ```
//!
//! Call from a blocking context; nothing here spawns threads or tasks.

pub mod codec;
pub mod config;
pub mod errors;
pub mod install;
pub mod lock;
pub mod locate;
pub mod manifest;
pub mod net;
pub mod paths;
pub mod platform;
pub mod resolve;
pub mod types;
pub mod verify;

pub use codec::DownloadSpec;
pub use config::{NativesConfig, Openh264Config, ShimConfig};
pub use errors::{ErrorKind, ManifestError, NativeError, Result};
pub use install::{ensure_installed, InstallOptions, InstallPlan};
pub use lock::{DownloadLock, LockPolicy};
pub use manifest::{embedded_manifest, Manifest};
pub use paths::{default_cache_root, CacheEntry};
pub use platform::Platform;
pub use resolve::{resolve_openh264, resolve_shim, Openh264Resolver, ShimResolver};
pub use types::{Origin, Resolved};
