//! Lock, download, verify, extract and install one cache entry.
//!
//! The final artifact path only ever appears through a rename of a file
//! that has already passed digest verification. Everything before that
//! lives in temporaries inside the entry directory and is dropped on every
//! exit path.

mod extract;
mod place;
mod unzip;

pub use extract::{extract_library, find_by_name, ArchiveKind, MAX_DECOMPRESSED_BYTES};

use crate::errors::{NativeError, Result};
use crate::lock::{DownloadLock, LockPolicy};
use crate::net::download_to_temp;
use crate::paths::{is_installed, CacheEntry};
use crate::types::Origin;
use crate::verify::digests_match;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "shimkit::natives::install";

/// Everything the pipeline needs to populate one cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    pub component: &'static str,
    pub url: String,
    /// Expected lowercase hex digest. `None` accepts whatever arrives.
    pub sha256: Option<String>,
    /// Upstream file name; decides the archive format.
    pub download_file_name: String,
    pub entry: CacheEntry,
    /// Unversioned alias to point at the library after install.
    pub link_name: Option<String>,
}

/// Knobs shared by every install.
#[derive(Debug, Clone, Copy)]
pub struct InstallOptions {
    pub timeout: Duration,
    pub lock: LockPolicy,
}

/// Return the cached artifact for `plan`, installing it first if needed.
/// The origin is [`Origin::Cache`] or [`Origin::Download`].
pub fn ensure_installed(plan: &InstallPlan, opts: &InstallOptions) -> Result<(PathBuf, Origin)> {
    let final_path = plan.entry.artifact_path();
    if is_installed(&final_path) {
        debug!(
            target: LOG_TARGET,
            component = plan.component,
            path = %final_path.display(),
            "cache hit"
        );
        return Ok((final_path, Origin::Cache));
    }

    let dir = plan.entry.dir();
    fs::create_dir_all(&dir).map_err(|e| NativeError::install(&dir, e))?;

    let _lock = DownloadLock::acquire(&plan.entry.lock_path(), &opts.lock)?;
    if is_installed(&final_path) {
        debug!(
            target: LOG_TARGET,
            component = plan.component,
            path = %final_path.display(),
            "installed by another holder"
        );
        return Ok((final_path, Origin::Cache));
    }

    install_locked(plan, &dir, &final_path, opts.timeout)?;
    info!(
        target: LOG_TARGET,
        component = plan.component,
        url = %plan.url,
        path = %final_path.display(),
        "installed"
    );
    Ok((final_path, Origin::Download))
}

fn install_locked(
    plan: &InstallPlan,
    dir: &Path,
    final_path: &Path,
    timeout: Duration,
) -> Result<()> {
    let download = download_to_temp(&plan.url, dir, timeout)?;

    match &plan.sha256 {
        Some(expected) if !digests_match(expected, &download.sha256) => {
            return Err(NativeError::IntegrityMismatch {
                url: plan.url.clone(),
                expected: expected.clone(),
                actual: download.sha256.clone(),
            });
        }
        Some(_) => debug!(target: LOG_TARGET, sha256 = %download.sha256, "digest verified"),
        None => warn!(
            target: LOG_TARGET,
            component = plan.component,
            url = %plan.url,
            sha256 = %download.sha256,
            "no pinned digest; accepting download unverified"
        ),
    }

    let staging = tempfile::Builder::new()
        .prefix(".extract-")
        .tempdir_in(dir)
        .map_err(|e| NativeError::install(dir, e))?;
    let library = extract_library(
        download.path(),
        &plan.download_file_name,
        &plan.entry.library_file_name,
        staging.path(),
    )?;
    drop(download);

    place::make_executable(&library)?;
    place::copy_notices_around(&library, staging.path(), dir);
    place::move_into_place(&library, final_path)?;

    if let Some(link) = &plan.link_name {
        // no artifact without its alias: the next call starts over
        if let Err(e) = place::link_unversioned(dir, link, &plan.entry.library_file_name) {
            let _ = fs::remove_file(final_path);
            return Err(e);
        }
    }
    Ok(())
}
