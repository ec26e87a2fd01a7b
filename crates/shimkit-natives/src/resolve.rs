//! Per-component orchestration: local override, then cache, then download.
//!
//! Both resolvers follow the same order:
//!
//! 1. explicit `*_LIBRARY_PATH`, then the conventional local directories
//!    (unverified);
//! 2. with downloads disabled, the bare library file name for the OS loader;
//! 3. the component's download plan, which rejects unsupported platforms
//!    before any network access;
//! 4. the install pipeline (cache check, lock, re-check, fetch, verify,
//!    extract, install).
//!
//! `resolve()` returns the first error. `resolve_or_fallback()` never fails:
//! on error it hands back the bare file name with the error attached so the
//! host can still try its loader's default search path.

use crate::codec::{unversioned_link_name, DownloadSpec, CODEC_COMPONENT};
use crate::config::NativesConfig;
use crate::errors::{ManifestError, Result};
use crate::install::{ensure_installed, InstallOptions, InstallPlan};
use crate::locate::locate_local;
use crate::manifest::{embedded_manifest, shim_library_file_name, Manifest, SHIM_COMPONENT};
use crate::paths::CacheEntry;
use crate::types::{Origin, Resolved};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const LOG_TARGET: &str = "shimkit::natives::resolve";

/// Resolves the shim library from the manifest.
#[derive(Debug, Clone)]
pub struct ShimResolver<'a> {
    cfg: &'a NativesConfig,
    manifest: std::result::Result<&'a Manifest, ManifestError>,
}

impl<'a> ShimResolver<'a> {
    /// Uses the manifest embedded in the crate. A broken embedded manifest
    /// surfaces from [`plan`](Self::plan) and [`resolve`](Self::resolve).
    pub fn new(cfg: &'a NativesConfig) -> Self {
        Self {
            cfg,
            manifest: embedded_manifest(),
        }
    }

    pub fn with_manifest(cfg: &'a NativesConfig, manifest: &'a Manifest) -> Self {
        Self {
            cfg,
            manifest: Ok(manifest),
        }
    }

    pub fn library_file_name(&self) -> &'static str {
        shim_library_file_name(&self.cfg.platform)
    }

    /// Download plan for the configured flavor and platform.
    pub fn plan(&self) -> Result<InstallPlan> {
        let manifest = self.manifest.clone()?;
        let shim = &self.cfg.shim;
        let asset =
            manifest.resolve_asset(&shim.flavor, &self.cfg.platform, shim.base_url.as_deref())?;

        Ok(InstallPlan {
            component: SHIM_COMPONENT,
            url: asset.url,
            sha256: Some(asset.sha256),
            download_file_name: asset.file,
            entry: CacheEntry {
                root: self.cfg.cache_dir.clone(),
                component: SHIM_COMPONENT.to_string(),
                variant: asset.flavor,
                release: asset.release_tag,
                platform_key: asset.platform_key.to_string(),
                library_file_name: self.library_file_name().to_string(),
            },
            link_name: None,
        })
    }

    pub fn resolve(&self) -> Result<Resolved> {
        debug!(
            target: LOG_TARGET,
            component = SHIM_COMPONENT,
            flavor = %self.cfg.shim.flavor,
            platform = %self.cfg.platform,
            "resolving"
        );
        resolve_component(
            self.cfg,
            SHIM_COMPONENT,
            self.cfg.shim.library_path.as_deref(),
            self.library_file_name(),
            || self.plan(),
        )
    }

    pub fn resolve_or_fallback(&self) -> Resolved {
        or_fallback(SHIM_COMPONENT, self.library_file_name(), self.resolve())
    }
}

/// Resolves the OpenH264 library from naming conventions.
#[derive(Debug, Clone, Copy)]
pub struct Openh264Resolver<'a> {
    cfg: &'a NativesConfig,
}

impl<'a> Openh264Resolver<'a> {
    pub fn new(cfg: &'a NativesConfig) -> Self {
        Self { cfg }
    }

    pub fn library_file_name(&self) -> String {
        crate::codec::library_file_name(&self.cfg.platform, &self.cfg.openh264.abi)
    }

    /// Fresh spec for this call; never cached.
    pub fn download_spec(&self) -> Result<DownloadSpec> {
        DownloadSpec::build(self.cfg)
    }

    pub fn plan(&self) -> Result<InstallPlan> {
        let spec = self.download_spec()?;
        Ok(InstallPlan {
            component: CODEC_COMPONENT,
            download_file_name: spec.download_file_name(),
            entry: spec.cache_entry(),
            link_name: unversioned_link_name(&self.cfg.platform).map(str::to_string),
            sha256: spec.sha256,
            url: spec.url,
        })
    }

    pub fn resolve(&self) -> Result<Resolved> {
        debug!(
            target: LOG_TARGET,
            component = CODEC_COMPONENT,
            version = %self.cfg.openh264.version,
            platform = %self.cfg.platform,
            "resolving"
        );
        resolve_component(
            self.cfg,
            CODEC_COMPONENT,
            self.cfg.openh264.library_path.as_deref(),
            &self.library_file_name(),
            || self.plan(),
        )
    }

    pub fn resolve_or_fallback(&self) -> Resolved {
        or_fallback(CODEC_COMPONENT, &self.library_file_name(), self.resolve())
    }
}

/// `ShimResolver::new(cfg).resolve()`.
pub fn resolve_shim(cfg: &NativesConfig) -> Result<Resolved> {
    ShimResolver::new(cfg).resolve()
}

/// `Openh264Resolver::new(cfg).resolve()`.
pub fn resolve_openh264(cfg: &NativesConfig) -> Result<Resolved> {
    Openh264Resolver::new(cfg).resolve()
}

fn resolve_component<F>(
    cfg: &NativesConfig,
    component: &'static str,
    explicit: Option<&Path>,
    library_file_name: &str,
    plan: F,
) -> Result<Resolved>
where
    F: FnOnce() -> Result<InstallPlan>,
{
    if let Some((path, origin)) = locate_local(
        component,
        explicit,
        library_file_name,
        cfg.install_root.as_deref(),
    ) {
        return Ok(Resolved::found(path, origin));
    }

    if cfg.disable_download {
        debug!(target: LOG_TARGET, component, "downloads disabled; deferring to system loader");
        return Ok(Resolved::found(
            PathBuf::from(library_file_name),
            Origin::SystemDefault,
        ));
    }

    let plan = plan()?;
    let opts = InstallOptions {
        timeout: cfg.download_timeout,
        lock: cfg.lock,
    };
    let (path, origin) = ensure_installed(&plan, &opts)?;
    Ok(Resolved::found(path, origin))
}

fn or_fallback(
    component: &'static str,
    library_file_name: &str,
    res: Result<Resolved>,
) -> Resolved {
    match res {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(
                target: LOG_TARGET,
                component,
                error = %e,
                fallback = library_file_name,
                "resolution failed; falling back to system loader search"
            );
            Resolved {
                path: PathBuf::from(library_file_name),
                origin: Origin::SystemDefault,
                error: Some(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::platform::Platform;
    use std::time::Duration;

    const MANIFEST: &str = r#"{
        "schema_version": 1,
        "base_url": "https://releases.example/shim",
        "flavors": {
            "default": {
                "release_tag": "v2.0.0",
                "assets": {
                    "linux_amd64": {
                        "file": "shimkit-linux_amd64.tar.gz",
                        "sha256": "ABABABABABABABABABABABABABABABABABABABABABABABABABABABABABABABAB"
                    }
                }
            }
        }
    }"#;

    fn cfg(root: &Path, os: &str, arch: &str) -> NativesConfig {
        let mut c = NativesConfig::with_cache_dir(root);
        c.platform = Platform::new(os, arch);
        c.download_timeout = Duration::from_secs(5);
        c
    }

    #[test]
    fn shim_plan_uses_flavor_and_tag() {
        let manifest = Manifest::from_json(MANIFEST).expect("manifest");
        let c = cfg(Path::new("/cache"), "linux", "amd64");
        let plan = ShimResolver::with_manifest(&c, &manifest).plan().expect("plan");

        assert_eq!(
            plan.url,
            "https://releases.example/shim/v2.0.0/shimkit-linux_amd64.tar.gz"
        );
        assert_eq!(plan.sha256.as_deref(), Some("ab".repeat(32).as_str()));
        assert_eq!(
            plan.entry.artifact_path(),
            Path::new("/cache/shim/default/v2.0.0/linux_amd64/libshimkit.so")
        );
    }

    #[test]
    fn base_url_override_replaces_manifest_host() {
        let manifest = Manifest::from_json(MANIFEST).expect("manifest");
        let mut c = cfg(Path::new("/cache"), "linux", "amd64");
        c.shim.base_url = Some("http://127.0.0.1:1234/mirror/".into());
        let plan = ShimResolver::with_manifest(&c, &manifest).plan().expect("plan");
        assert_eq!(
            plan.url,
            "http://127.0.0.1:1234/mirror/v2.0.0/shimkit-linux_amd64.tar.gz"
        );
    }

    #[test]
    fn unknown_flavor_fails_fast() {
        let manifest = Manifest::from_json(MANIFEST).expect("manifest");
        let mut c = cfg(Path::new("/cache"), "linux", "amd64");
        c.shim.flavor = "gpu".into();
        let err = ShimResolver::with_manifest(&c, &manifest).plan().expect_err("no such flavor");
        assert_eq!(err.kind(), ErrorKind::MissingAsset);
    }

    #[test]
    fn embedded_manifest_plans_every_published_platform() {
        for (os, arch) in [
            ("darwin", "amd64"),
            ("darwin", "arm64"),
            ("linux", "amd64"),
            ("linux", "arm64"),
            ("windows", "amd64"),
        ] {
            let c = cfg(Path::new("/cache"), os, arch);
            let plan = ShimResolver::new(&c).plan().expect("embedded asset");
            assert!(plan.url.starts_with("https://"), "{}", plan.url);
        }
    }

    #[test]
    fn codec_plan_links_on_linux_only() {
        let linux = cfg(Path::new("/cache"), "linux", "arm64");
        let plan = Openh264Resolver::new(&linux).plan().expect("plan");
        assert_eq!(plan.link_name.as_deref(), Some("libopenh264.so"));
        assert_eq!(plan.download_file_name, "libopenh264-2.5.1-linux-arm64.7.so.bz2");
        assert!(plan.sha256.is_none());

        let mac = cfg(Path::new("/cache"), "darwin", "arm64");
        assert_eq!(Openh264Resolver::new(&mac).plan().expect("plan").link_name, None);
    }

    #[test]
    fn fallback_carries_the_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let c = cfg(temp.path(), "windows", "arm64");
        let resolved = ShimResolver::new(&c).resolve_or_fallback();

        assert_eq!(resolved.origin, Origin::SystemDefault);
        assert_eq!(resolved.path, PathBuf::from("shimkit.dll"));
        let err = resolved.error.expect("error kept");
        assert_eq!(err.kind(), ErrorKind::PlatformUnsupported);
    }

    #[test]
    fn disabled_downloads_return_bare_name() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut c = cfg(temp.path(), "linux", "riscv64");
        c.disable_download = true;
        let resolved = Openh264Resolver::new(&c).resolve().expect("no network needed");
        assert_eq!(resolved.origin, Origin::SystemDefault);
        assert_eq!(resolved.path, PathBuf::from("libopenh264.so.7"));
        assert!(!resolved.is_fallback());
    }
}
