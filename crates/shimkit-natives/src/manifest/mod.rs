//! Embedded release manifest for the shim library.
//!
//! The JSON ships inside the binary (`manifest/natives.json`), is parsed at
//! most once per process and then shared read-only.

mod resolve;
mod verify;

pub use resolve::{shim_library_file_name, ResolvedAsset, SHIM_COMPONENT, SHIM_PLATFORMS};

use crate::errors::ManifestError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema this build understands.
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Manifest compiled into the crate.
pub const EMBEDDED_MANIFEST_JSON: &str = include_str!("../../manifest/natives.json");

// Lazy serializes first access: one parse, and every caller sees the same
// manifest or the same error.
static EMBEDDED: Lazy<Result<Manifest, ManifestError>> =
    Lazy::new(|| Manifest::from_json(EMBEDDED_MANIFEST_JSON));

/// Top-level manifest: named flavors, each with its own release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: u32,
    pub base_url: String,
    pub flavors: BTreeMap<String, FlavorInfo>,
}

/// One build variant of the shim, published under a release tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorInfo {
    pub release_tag: String,
    #[serde(default)]
    pub assets: BTreeMap<String, AssetRef>, // platform key -> asset
}

/// A downloadable file and its digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    #[serde(default)]
    pub file: Option<String>, // e.g. "shimkit-default-linux_amd64.tar.gz"
    pub sha256: String,       // lowercase hex after parsing
}

impl Manifest {
    /// Parse and validate. Digests are checked and lowercased here so nothing
    /// downstream has to re-validate them.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        let mut m: Manifest =
            serde_json::from_str(json).map_err(|e| ManifestError::Malformed(e.to_string()))?;
        verify::validate(&mut m)?;
        Ok(m)
    }
}

/// The manifest compiled into this crate, parsed on first use.
pub fn embedded_manifest() -> Result<&'static Manifest, ManifestError> {
    EMBEDDED.as_ref().map_err(Clone::clone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn embedded_manifest_parses() {
        let m = embedded_manifest().expect("embedded manifest must be valid");
        assert_eq!(m.schema_version, MANIFEST_SCHEMA_VERSION);
        assert!(m.flavors.contains_key(crate::config::DEFAULT_FLAVOR));
    }

    #[test]
    fn concurrent_first_access_yields_one_instance() {
        let ptrs: Vec<usize> = (0..8)
            .map(|_| {
                thread::spawn(|| {
                    embedded_manifest().expect("manifest") as *const Manifest as usize
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().expect("join"))
            .collect();
        assert!(ptrs.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let err = Manifest::from_json(r#"{"schema_version":1,"flavors":{}}"#)
            .expect_err("base_url is required");
        assert!(matches!(err, ManifestError::Malformed(_)), "{err:?}");
    }
}
