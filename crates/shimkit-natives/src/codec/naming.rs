//! OpenH264 file naming. Pure functions of (platform, version, abi).

use crate::errors::{NativeError, Result};
use crate::platform::Platform;

use super::{CODEC_COMPONENT, URL_OVERRIDE_HINT};

/// Platforms the codec can be resolved for at all (a local or overridden
/// binary may exist even where upstream publishes nothing).
pub const CODEC_PLATFORMS: &[&str] = &[
    "linux_amd64",
    "linux_386",
    "linux_arm64",
    "linux_arm",
    "linux_ppc64le",
    "linux_riscv64",
    "darwin_amd64",
    "darwin_arm64",
    "windows_amd64",
    "windows_386",
    "windows_arm64",
    "freebsd_amd64",
    "freebsd_arm64",
];

/// Install-time name; stable across versions of the same ABI.
pub fn library_file_name(platform: &Platform, abi: &str) -> String {
    if platform.is_windows() {
        format!("openh264-{abi}.dll")
    } else if platform.is_darwin() {
        format!("libopenh264.{abi}.dylib")
    } else {
        format!("libopenh264.so.{abi}")
    }
}

/// Unversioned alias created next to the library on Linux.
pub fn unversioned_link_name(platform: &Platform) -> Option<&'static str> {
    platform.is_linux().then_some("libopenh264.so")
}

/// Name of the upstream `.bz2` for this platform.
pub fn archive_file_name(platform: &Platform, version: &str, abi: &str) -> Result<String> {
    let name = match (platform.os(), platform.arch()) {
        ("linux", "amd64") => format!("libopenh264-{version}-linux64.{abi}.so.bz2"),
        ("linux", "386") => format!("libopenh264-{version}-linux32.{abi}.so.bz2"),
        ("linux", "arm64") => format!("libopenh264-{version}-linux-arm64.{abi}.so.bz2"),
        ("linux", "arm") => format!("libopenh264-{version}-linux-arm.{abi}.so.bz2"),
        ("darwin", "amd64") => format!("libopenh264-{version}-mac-x64.dylib.bz2"),
        ("darwin", "arm64") => format!("libopenh264-{version}-mac-arm64.dylib.bz2"),
        ("windows", "amd64") => format!("openh264-{version}-win64.dll.bz2"),
        ("windows", "386") => format!("openh264-{version}-win32.dll.bz2"),
        ("windows", "arm64") => format!("openh264-{version}-win-arm64.dll.bz2"),
        (os, arch) => {
            return Err(NativeError::BinaryNotPublished {
                component: CODEC_COMPONENT,
                os: os.to_string(),
                arch: arch.to_string(),
                hint: URL_OVERRIDE_HINT,
            })
        }
    };
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use rstest::rstest;

    #[rstest]
    #[case("darwin", "arm64", "libopenh264-2.5.1-mac-arm64.dylib.bz2")]
    #[case("darwin", "amd64", "libopenh264-2.5.1-mac-x64.dylib.bz2")]
    #[case("linux", "amd64", "libopenh264-2.5.1-linux64.7.so.bz2")]
    #[case("linux", "arm64", "libopenh264-2.5.1-linux-arm64.7.so.bz2")]
    #[case("linux", "386", "libopenh264-2.5.1-linux32.7.so.bz2")]
    #[case("windows", "amd64", "openh264-2.5.1-win64.dll.bz2")]
    #[case("windows", "arm64", "openh264-2.5.1-win-arm64.dll.bz2")]
    fn archive_names(#[case] os: &str, #[case] arch: &str, #[case] want: &str) {
        let p = Platform::new(os, arch);
        let first = archive_file_name(&p, "2.5.1", "7").expect("published");
        let second = archive_file_name(&p, "2.5.1", "7").expect("published");
        assert_eq!(first, want);
        assert_eq!(first, second);
    }

    #[rstest]
    #[case("linux", "libopenh264.so.7")]
    #[case("freebsd", "libopenh264.so.7")]
    #[case("darwin", "libopenh264.7.dylib")]
    #[case("windows", "openh264-7.dll")]
    fn library_names(#[case] os: &str, #[case] want: &str) {
        assert_eq!(library_file_name(&Platform::new(os, "amd64"), "7"), want);
    }

    #[test]
    fn library_name_ignores_version() {
        let p = Platform::new("linux", "amd64");
        assert_eq!(library_file_name(&p, "7"), library_file_name(&p, "7"));
        assert_eq!(unversioned_link_name(&p), Some("libopenh264.so"));
        assert_eq!(unversioned_link_name(&Platform::new("darwin", "arm64")), None);
    }

    #[rstest]
    #[case("linux", "ppc64le")]
    #[case("linux", "riscv64")]
    #[case("freebsd", "amd64")]
    fn unpublished_platforms(#[case] os: &str, #[case] arch: &str) {
        let err = archive_file_name(&Platform::new(os, arch), "2.5.1", "7")
            .expect_err("nothing published");
        assert_eq!(err.kind(), ErrorKind::BinaryNotPublished);
    }
}
