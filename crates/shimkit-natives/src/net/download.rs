use crate::errors::{NativeError, Result};
use crate::verify::HashingWriter;
use reqwest::blocking::Client;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::debug;

const LOG_TARGET: &str = "shimkit::natives::net";

/// A finished download: the temp file is deleted when this is dropped.
#[derive(Debug)]
pub struct Downloaded {
    pub file: NamedTempFile,
    /// Lowercase hex sha256 of exactly the bytes in `file`.
    pub sha256: String,
    pub bytes: u64,
}

impl Downloaded {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Blocking HTTPS download into a temp file inside `dir`, hashed on the way
/// through. Nothing is left behind on failure.
pub fn download_to_temp(url: &str, dir: &Path, timeout: Duration) -> Result<Downloaded> {
    let net_err = |source| NativeError::Network {
        url: url.to_string(),
        source,
    };

    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("shimkit-natives/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(net_err)?;

    debug!(target: LOG_TARGET, url, "GET");
    let mut resp = client.get(url).send().map_err(net_err)?;
    if !resp.status().is_success() {
        return Err(NativeError::HttpStatus {
            url: url.to_string(),
            status: resp.status().as_u16(),
        });
    }

    let tmp = tempfile::Builder::new()
        .prefix(".download-")
        .tempfile_in(dir)
        .map_err(|e| NativeError::install(dir, e))?;
    let tmp_path = tmp.path().to_path_buf();

    let mut out = HashingWriter::new(tmp);
    let mut buf = vec![0u8; 128 * 1024];

    loop {
        let n = resp.read(&mut buf).map_err(|source| NativeError::NetworkRead {
            url: url.to_string(),
            source,
        })?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])
            .map_err(|e| NativeError::install(&tmp_path, e))?;
    }

    let bytes = out.bytes_written();
    let (file, sha256) = out
        .finish()
        .map_err(|e| NativeError::install(&tmp_path, e))?;
    debug!(target: LOG_TARGET, url, bytes, sha256 = %sha256, "download complete");

    Ok(Downloaded {
        file,
        sha256,
        bytes,
    })
}
