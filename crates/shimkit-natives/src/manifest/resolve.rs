use super::Manifest;
use crate::errors::{ManifestError, Result};
use crate::platform::{platform_key, Platform};

pub const SHIM_COMPONENT: &str = "shim";

/// Platforms the shim is published for.
pub const SHIM_PLATFORMS: &[&str] = &[
    "darwin_amd64",
    "darwin_arm64",
    "linux_amd64",
    "linux_arm64",
    "windows_amd64",
];

/// Everything needed to fetch one shim asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub flavor: String,
    pub release_tag: String,
    pub platform_key: &'static str,
    pub file: String,
    pub sha256: String,
    pub url: String,
}

impl Manifest {
    /// Pick the asset for `flavor` on `platform`.
    ///
    /// Unknown flavor, missing platform asset and missing file name are
    /// separate errors; nothing is substituted.
    pub fn resolve_asset(
        &self,
        flavor: &str,
        platform: &Platform,
        base_url_override: Option<&str>,
    ) -> Result<ResolvedAsset> {
        let key = platform_key(SHIM_PLATFORMS, platform, SHIM_COMPONENT)?;

        let info = self
            .flavors
            .get(flavor)
            .ok_or_else(|| ManifestError::UnknownFlavor(flavor.to_string()))?;

        let asset = info
            .assets
            .get(key)
            .ok_or_else(|| ManifestError::MissingAsset {
                flavor: flavor.to_string(),
                platform_key: key.to_string(),
            })?;

        let file = asset
            .file
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .ok_or_else(|| ManifestError::MissingFile {
                flavor: flavor.to_string(),
                platform_key: key.to_string(),
            })?;

        let base = base_url_override
            .unwrap_or(&self.base_url)
            .trim_end_matches('/');

        Ok(ResolvedAsset {
            flavor: flavor.to_string(),
            release_tag: info.release_tag.clone(),
            platform_key: key,
            file: file.to_string(),
            sha256: asset.sha256.clone(),
            url: format!("{base}/{}/{file}", info.release_tag),
        })
    }
}

/// Install-time file name of the shim library.
pub fn shim_library_file_name(platform: &Platform) -> &'static str {
    if platform.is_windows() {
        "shimkit.dll"
    } else if platform.is_darwin() {
        "libshimkit.dylib"
    } else {
        "libshimkit.so"
    }
}
