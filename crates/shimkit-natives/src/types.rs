use crate::errors::NativeError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Where a resolved library path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Taken from the component's `*_LIBRARY_PATH` variable; not verified.
    ExplicitPath,
    /// Found next to the executable, in the working directory or an
    /// ancestor, or under the install root; not verified.
    LocalSearch,
    /// Already present in the cache.
    Cache,
    /// Downloaded and installed by this call; checked against the digest
    /// whenever one is pinned.
    Download,
    /// Downloads disabled; a bare file name for the OS loader to search.
    SystemDefault,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::ExplicitPath => "explicit_path",
            Origin::LocalSearch => "local_search",
            Origin::Cache => "cache",
            Origin::Download => "download",
            Origin::SystemDefault => "system_default",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the lenient resolvers: always a path to hand to the loader,
/// plus the error that forced a fallback, if any.
#[derive(Debug)]
pub struct Resolved {
    pub path: PathBuf,
    pub origin: Origin,
    pub error: Option<NativeError>,
}

impl Resolved {
    pub(crate) fn found(path: PathBuf, origin: Origin) -> Self {
        Self {
            path,
            origin,
            error: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}
