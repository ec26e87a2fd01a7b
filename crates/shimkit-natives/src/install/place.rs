//! Moving a staged library to its final cache path.

use crate::errors::{NativeError, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

const LOG_TARGET: &str = "shimkit::natives::install";

const NOTICE_PREFIXES: &[&str] = &["LICENSE", "LICENCE", "NOTICE", "COPYING"];

/// Owner rwx, group and other rx.
#[cfg(unix)]
pub(crate) fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| NativeError::install(path, e))
}

#[cfg(not(unix))]
pub(crate) fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

fn is_notice(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    NOTICE_PREFIXES.iter().any(|p| upper.starts_with(p))
}

/// Copy license and notice files found directly in `from` into `to`.
/// Failures are logged, never returned.
pub(crate) fn copy_notices(from: &Path, to: &Path) {
    let entries = match fs::read_dir(from) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !is_notice(name) || !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let dst = to.join(name);
        match fs::copy(entry.path(), &dst) {
            Ok(_) => debug!(target: LOG_TARGET, file = %dst.display(), "copied notice"),
            Err(e) => warn!(
                target: LOG_TARGET,
                file = %dst.display(),
                error = %e,
                "could not copy notice"
            ),
        }
    }
}

/// Copy notices from every directory between the staging root and the
/// library, outermost first, so the copy nearest the library wins.
pub(crate) fn copy_notices_around(library: &Path, staging: &Path, to: &Path) {
    let mut dirs: Vec<&Path> = library
        .ancestors()
        .skip(1)
        .take_while(|d| d.starts_with(staging))
        .collect();
    dirs.reverse();
    for dir in dirs {
        copy_notices(dir, to);
    }
}

/// Point `dir/link_name` at `target_name` (relative), replacing whatever is
/// there.
#[cfg(unix)]
pub(crate) fn link_unversioned(dir: &Path, link_name: &str, target_name: &str) -> Result<()> {
    let link = dir.join(link_name);
    if fs::symlink_metadata(&link).is_ok() {
        fs::remove_file(&link).map_err(|e| NativeError::install(&link, e))?;
    }
    std::os::unix::fs::symlink(target_name, &link).map_err(|e| NativeError::install(&link, e))?;
    debug!(target: LOG_TARGET, link = %link.display(), target = target_name, "linked");
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn link_unversioned(_dir: &Path, _link_name: &str, _target_name: &str) -> Result<()> {
    Ok(())
}

/// Rename `staged` onto `final_path`. When rename fails (typically a
/// cross-device move), copy into a temp file beside `final_path` and rename
/// that instead, so readers never see a partial file.
pub(crate) fn move_into_place(staged: &Path, final_path: &Path) -> Result<()> {
    let rename_err = match fs::rename(staged, final_path) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    warn!(
        target: LOG_TARGET,
        from = %staged.display(),
        to = %final_path.display(),
        error = %rename_err,
        "rename failed; copying instead"
    );

    let dir = final_path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = tempfile::Builder::new()
        .prefix(".install-")
        .tempfile_in(dir)
        .map_err(|e| NativeError::install(dir, e))?;
    // fs::copy carries the permission bits across
    fs::copy(staged, tmp.path()).map_err(|e| NativeError::install(tmp.path(), e))?;
    tmp.persist(final_path)
        .map_err(|e| NativeError::install(final_path, e.error))?;
    let _ = fs::remove_file(staged);
    Ok(())
}
