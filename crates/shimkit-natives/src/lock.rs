//! Cross-process download lock.
//!
//! A `.download.lock` file inside the cache entry directory marks the entry
//! as being populated. Creation with `create_new` is the test-and-set; the
//! guard deletes the file on drop. Works across processes sharing one cache
//! root, not just threads.
//!
//! There is no staleness recovery: a lock left behind by a crashed holder
//! blocks that entry until someone removes it, and waiters give up with
//! [`NativeError::LockTimeout`] instead of hanging.

use crate::config::DEFAULT_DOWNLOAD_TIMEOUT;
use crate::errors::{NativeError, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const LOG_TARGET: &str = "shimkit::natives::lock";

/// How long to wait for a busy lock.
///
/// A holder can legitimately keep the lock for a whole download, so the
/// wait budget is derived from the download timeout rather than fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    pub attempts: u32,
    pub retry_delay: Duration,
}

impl LockPolicy {
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

    /// Slack on top of the download timeout for verify, extract and install.
    pub const HOLDER_GRACE: Duration = Duration::from_secs(60);

    /// Outlast a holder that spends up to `download_timeout` downloading.
    pub fn covering(download_timeout: Duration) -> Self {
        Self::covering_with_delay(download_timeout, Self::DEFAULT_RETRY_DELAY)
    }

    pub fn covering_with_delay(download_timeout: Duration, retry_delay: Duration) -> Self {
        let wait = download_timeout.saturating_add(Self::HOLDER_GRACE);
        // a zero delay is counted as 1ms so the attempt count stays finite
        let step = retry_delay.as_nanos().max(1_000_000);
        let sleeps = wait.as_nanos().div_ceil(step);
        Self {
            attempts: u32::try_from(sleeps.saturating_add(1)).unwrap_or(u32::MAX),
            retry_delay,
        }
    }

    /// Total time spent sleeping before giving up.
    pub fn budget(&self) -> Duration {
        self.retry_delay
            .saturating_mul(self.attempts.max(1).saturating_sub(1))
    }
}

impl Default for LockPolicy {
    /// 500 ms retries covering [`DEFAULT_DOWNLOAD_TIMEOUT`] plus grace.
    fn default() -> Self {
        Self::covering(DEFAULT_DOWNLOAD_TIMEOUT)
    }
}

/// Held lock; the file is removed when this is dropped.
#[derive(Debug)]
pub struct DownloadLock {
    path: PathBuf,
}

impl DownloadLock {
    /// Create `path` exclusively, retrying while another holder has it.
    pub fn acquire(path: &Path, policy: &LockPolicy) -> Result<Self> {
        let attempts = policy.attempts.max(1);

        for attempt in 1..=attempts {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    // pid is informational for whoever finds a leftover lock
                    if let Err(e) = writeln!(file, "{}", std::process::id()) {
                        debug!(
                            target: LOG_TARGET,
                            path = %path.display(),
                            error = %e,
                            "could not record pid in lock file"
                        );
                    }
                    debug!(target: LOG_TARGET, path = %path.display(), attempt, "lock acquired");
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if attempt == 1 {
                        debug!(target: LOG_TARGET, path = %path.display(), "lock busy, waiting");
                    }
                    if attempt < attempts {
                        thread::sleep(policy.retry_delay);
                    }
                }
                Err(e) => return Err(NativeError::install(path, e)),
            }
        }

        warn!(target: LOG_TARGET, path = %path.display(), attempts, "gave up waiting for lock");
        Err(NativeError::LockTimeout {
            path: path.to_path_buf(),
            attempts,
        })
    }

}

impl Drop for DownloadLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(
                target: LOG_TARGET,
                path = %self.path.display(),
                error = %e,
                "failed to remove lock file"
            );
        }
    }
}
