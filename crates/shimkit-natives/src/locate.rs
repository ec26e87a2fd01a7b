//! Pre-existing libraries the operator put in place. Nothing found here is
//! verified.

use crate::paths::is_installed;
use crate::types::Origin;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const LOG_TARGET: &str = "shimkit::natives::locate";

/// Explicit path first, then the conventional directories.
pub(crate) fn locate_local(
    component: &str,
    explicit: Option<&Path>,
    library_file_name: &str,
    install_root: Option<&Path>,
) -> Option<(PathBuf, Origin)> {
    if let Some(p) = explicit {
        if is_installed(p) {
            warn!(
                target: LOG_TARGET,
                component,
                path = %p.display(),
                "using explicit library path without verification"
            );
            return Some((p.to_path_buf(), Origin::ExplicitPath));
        }
        warn!(
            target: LOG_TARGET,
            component,
            path = %p.display(),
            "explicit library path does not exist; continuing"
        );
    }

    let exe = env::current_exe().ok();
    let cwd = env::current_dir().ok();
    let dirs = candidate_dirs(exe.as_deref(), cwd.as_deref(), install_root);
    let found = find_in(&dirs, library_file_name)?;
    debug!(target: LOG_TARGET, component, path = %found.display(), "found local library");
    Some((found, Origin::LocalSearch))
}

/// Search order, most specific first:
/// exe dir, `<exe dir>/../lib`, cwd and each ancestor, `<install root>/lib`.
pub fn candidate_dirs(
    exe: Option<&Path>,
    cwd: Option<&Path>,
    install_root: Option<&Path>,
) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Some(exe_dir) = exe.and_then(Path::parent) {
        dirs.push(exe_dir.to_path_buf());
        dirs.push(exe_dir.join("..").join("lib"));
    }
    if let Some(cwd) = cwd {
        dirs.extend(cwd.ancestors().map(Path::to_path_buf));
    }
    if let Some(root) = install_root {
        dirs.push(root.join("lib"));
    }

    let mut seen = std::collections::HashSet::new();
    dirs.retain(|d| seen.insert(d.clone()));
    dirs
}

/// First `<dir>/<file_name>` that is a file.
pub fn find_in(dirs: &[PathBuf], file_name: &str) -> Option<PathBuf> {
    dirs.iter()
        .map(|d| d.join(file_name))
        .find(|p| is_installed(p))
}
