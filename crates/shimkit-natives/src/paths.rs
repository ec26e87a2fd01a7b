use dirs::cache_dir;
use std::path::{Path, PathBuf};

/// Name of the lock file held while a cache entry is being populated.
pub const LOCK_FILE_NAME: &str = ".download.lock";

/// ~/.cache/shimkit/natives   (or platform-equivalent, temp dir as last resort)
pub fn default_cache_root() -> PathBuf {
    cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("shimkit")
        .join("natives")
}

/// One installed artifact in the cache.
///
/// Layout: `<root>/<component>/<variant>/<release>/<platform_key>/<library_file_name>`
/// where `variant` is the flavor (shim) or version (codec) and `release` is
/// the release tag (shim) or version (codec). The entry counts as cached when
/// [`CacheEntry::artifact_path`] exists; there is no other bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub root: PathBuf,
    pub component: String,
    pub variant: String,
    pub release: String,
    pub platform_key: String,
    pub library_file_name: String,
}

impl CacheEntry {
    /// Directory holding the artifact, its lock file and any notices.
    pub fn dir(&self) -> PathBuf {
        self.root
            .join(&self.component)
            .join(&self.variant)
            .join(&self.release)
            .join(&self.platform_key)
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.dir().join(&self.library_file_name)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir().join(LOCK_FILE_NAME)
    }

    pub fn is_cached(&self) -> bool {
        is_installed(&self.artifact_path())
    }
}

/// Regular file (or a symlink resolving to one) at `path`.
pub(crate) fn is_installed(path: &Path) -> bool {
    path.is_file()
}
