use std::path::PathBuf;
use thiserror::Error;

/// A sha256 string that is not exactly 64 hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{context}: {value:?} is not a 64-character hex sha256")]
pub struct InvalidDigest {
    pub context: String,
    pub value: String,
}

/// Manifest problems. Cloneable so the memoized parse result can be handed
/// to every caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("manifest is malformed: {0}")]
    Malformed(String),

    #[error("unsupported manifest schema_version {found} (this build understands {expected})")]
    UnsupportedSchema { found: u32, expected: u32 },

    #[error("flavor {0:?} is not defined in the manifest")]
    UnknownFlavor(String),

    #[error("flavor {flavor:?} has no asset for platform {platform_key}")]
    MissingAsset { flavor: String, platform_key: String },

    #[error("asset for {flavor:?}/{platform_key} has no file name")]
    MissingFile { flavor: String, platform_key: String },

    #[error(transparent)]
    InvalidDigest(#[from] InvalidDigest),
}

#[derive(Debug, Error)]
pub enum NativeError {
    #[error("{component} is not supported on {os}/{arch}")]
    PlatformUnsupported {
        component: &'static str,
        os: String,
        arch: String,
    },

    #[error("no prebuilt {component} binary is published for {os}/{arch}; supply one with {hint}")]
    BinaryNotPublished {
        component: &'static str,
        os: String,
        arch: String,
        hint: &'static str,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    InvalidDigest(#[from] InvalidDigest),

    #[error("GET {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("reading body of {url}: {source}")]
    NetworkRead {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("sha256 mismatch for {url} (got {actual}, want {expected})")]
    IntegrityMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("archive {archive}: {reason}")]
    Archive { archive: String, reason: String },

    #[error("archive {archive}: entry {entry:?} escapes the extraction root")]
    UnsafeArchivePath { archive: String, entry: String },

    #[error(
        "gave up waiting for {} after {attempts} attempts; if no download is running, remove it manually",
        path.display()
    )]
    LockTimeout { path: PathBuf, attempts: u32 },

    #[error("install failed at {}: {source}", path.display())]
    Install {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of [`NativeError`] for callers that branch on the
/// failure rather than print it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    PlatformUnsupported,
    ManifestMalformed,
    MissingAsset,
    InvalidDigestFormat,
    NetworkError,
    IntegrityMismatch,
    ArchiveError,
    LockTimeout,
    InstallError,
    BinaryNotPublished,
}

impl NativeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NativeError::PlatformUnsupported { .. } => ErrorKind::PlatformUnsupported,
            NativeError::BinaryNotPublished { .. } => ErrorKind::BinaryNotPublished,
            NativeError::Manifest(m) => match m {
                ManifestError::Malformed(_) | ManifestError::UnsupportedSchema { .. } => {
                    ErrorKind::ManifestMalformed
                }
                ManifestError::UnknownFlavor(_)
                | ManifestError::MissingAsset { .. }
                | ManifestError::MissingFile { .. } => ErrorKind::MissingAsset,
                ManifestError::InvalidDigest(_) => ErrorKind::InvalidDigestFormat,
            },
            NativeError::InvalidDigest(_) => ErrorKind::InvalidDigestFormat,
            NativeError::Network { .. }
            | NativeError::HttpStatus { .. }
            | NativeError::NetworkRead { .. } => ErrorKind::NetworkError,
            NativeError::IntegrityMismatch { .. } => ErrorKind::IntegrityMismatch,
            NativeError::Archive { .. } | NativeError::UnsafeArchivePath { .. } => {
                ErrorKind::ArchiveError
            }
            NativeError::LockTimeout { .. } => ErrorKind::LockTimeout,
            NativeError::Install { .. } => ErrorKind::InstallError,
        }
    }

    /// True when the platform simply has no upstream binary; callers may
    /// degrade to a software path instead of failing.
    pub fn is_not_published(&self) -> bool {
        self.kind() == ErrorKind::BinaryNotPublished
    }

    pub(crate) fn install(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NativeError::Install {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn archive(archive: &str, reason: impl Into<String>) -> Self {
        NativeError::Archive {
            archive: archive.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NativeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_errors_map_to_distinct_kinds() {
        let unknown: NativeError = ManifestError::UnknownFlavor("gpu".into()).into();
        let malformed: NativeError = ManifestError::Malformed("eof".into()).into();
        let digest: NativeError = ManifestError::InvalidDigest(InvalidDigest {
            context: "flavor default".into(),
            value: "abc".into(),
        })
        .into();

        assert_eq!(unknown.kind(), ErrorKind::MissingAsset);
        assert_eq!(malformed.kind(), ErrorKind::ManifestMalformed);
        assert_eq!(digest.kind(), ErrorKind::InvalidDigestFormat);
    }

    #[test]
    fn lock_timeout_message_tells_operator_what_to_do() {
        let err = NativeError::LockTimeout {
            path: PathBuf::from("/cache/shim/.download.lock"),
            attempts: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("/cache/shim/.download.lock"), "{msg}");
        assert!(msg.contains("remove it manually"), "{msg}");
    }

    #[test]
    fn not_published_is_distinct_from_unsupported() {
        let np = NativeError::BinaryNotPublished {
            component: "openh264",
            os: "linux".into(),
            arch: "ppc64le".into(),
            hint: "OPENH264_URL",
        };
        let unsupported = NativeError::PlatformUnsupported {
            component: "openh264",
            os: "plan9".into(),
            arch: "amd64".into(),
        };
        assert!(np.is_not_published());
        assert!(!unsupported.is_not_published());
    }
}
