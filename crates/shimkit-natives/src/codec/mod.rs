//! OpenH264 download spec, derived from naming conventions instead of a
//! manifest. A fresh [`DownloadSpec`] is built per resolution; only the
//! installed artifact is cached.

mod naming;

pub use naming::{archive_file_name, library_file_name, unversioned_link_name, CODEC_PLATFORMS};

use crate::config::NativesConfig;
use crate::errors::Result;
use crate::paths::CacheEntry;
use crate::platform::platform_key;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

pub const CODEC_COMPONENT: &str = "openh264";
pub const DEFAULT_VERSION: &str = "2.5.1";
pub const DEFAULT_ABI: &str = "7";
pub const DEFAULT_BASE_URL: &str = "http://ciscobinary.openh264.org";

pub(crate) const URL_OVERRIDE_HINT: &str = "OPENH264_URL or OPENH264_LIBRARY_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSpec {
    pub url: String,
    pub version: String,
    pub abi: String,
    pub platform_key: &'static str,
    pub library_file_name: String,
    /// `None` when the URL was supplied explicitly.
    pub archive_file_name: Option<String>,
    pub sha256: Option<String>,
    pub cache_root: PathBuf,
    url_overridden: bool,
}

impl DownloadSpec {
    /// Derive the spec for the configured platform.
    ///
    /// Platform support is checked first. Archive naming only runs without a
    /// URL override, so an unpublished platform is still usable with one.
    pub fn build(cfg: &NativesConfig) -> Result<Self> {
        let codec = &cfg.openh264;
        let key = platform_key(CODEC_PLATFORMS, &cfg.platform, CODEC_COMPONENT)?;
        let library_file_name = library_file_name(&cfg.platform, &codec.abi);

        let (url, archive_file_name, url_overridden) = match codec.url.as_deref() {
            Some(url) => (url.to_string(), None, true),
            None => {
                let archive = archive_file_name(&cfg.platform, &codec.version, &codec.abi)?;
                let base = codec.base_url.trim_end_matches('/');
                (format!("{base}/{archive}"), Some(archive), false)
            }
        };

        Ok(Self {
            url,
            version: codec.version.clone(),
            abi: codec.abi.clone(),
            platform_key: key,
            library_file_name,
            archive_file_name,
            sha256: codec.sha256.clone(),
            cache_root: cfg.cache_dir.clone(),
            url_overridden,
        })
    }

    /// Name that decides how the download is unpacked: the derived archive
    /// name, or the last path segment of an overridden URL.
    pub fn download_file_name(&self) -> String {
        if let Some(name) = &self.archive_file_name {
            return name.clone();
        }
        reqwest::Url::parse(&self.url)
            .ok()
            .and_then(|u| {
                u.path_segments()?
                    .last()
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| self.library_file_name.clone())
    }

    /// `<root>/openh264/<version>/<version>/<key>/<lib>`; an overridden URL
    /// gets its own `url-<hash>` slot so it never shadows upstream builds.
    pub fn cache_entry(&self) -> CacheEntry {
        let variant = if self.url_overridden {
            let digest = hex::encode(Sha256::digest(self.url.as_bytes()));
            format!("url-{}", &digest[..12])
        } else {
            self.version.clone()
        };
        CacheEntry {
            root: self.cache_root.clone(),
            component: CODEC_COMPONENT.to_string(),
            variant,
            release: self.version.clone(),
            platform_key: self.platform_key.to_string(),
            library_file_name: self.library_file_name.clone(),
        }
    }
}
