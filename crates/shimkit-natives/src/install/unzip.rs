use crate::errors::{NativeError, Result};
use std::fs;
use std::path::Path;
use zip::ZipArchive;

use super::extract::{clean_relative, write_entry};

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Unpack a zip under `dest`. Entries whose names would land outside `dest`
/// abort the whole extraction, as do symlinks.
pub fn unzip_into(zip_path: &Path, archive_name: &str, dest: &Path) -> Result<()> {
    let bad = |e: zip::result::ZipError| NativeError::archive(archive_name, e.to_string());

    let f = fs::File::open(zip_path).map_err(|e| NativeError::install(zip_path, e))?;
    let mut archive = ZipArchive::new(f).map_err(bad)?;
    fs::create_dir_all(dest).map_err(|e| NativeError::install(dest, e))?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(bad)?;
        let rel = file
            .enclosed_name()
            .and_then(clean_relative)
            .ok_or_else(|| NativeError::UnsafeArchivePath {
                archive: archive_name.to_string(),
                entry: file.name().to_string(),
            })?;
        let outpath = dest.join(&rel);

        if file.unix_mode().is_some_and(|m| m & S_IFMT == S_IFLNK) {
            return Err(NativeError::archive(
                archive_name,
                format!("entry {} is a symlink", file.name()),
            ));
        }
        if file.is_dir() {
            fs::create_dir_all(&outpath).map_err(|e| NativeError::install(&outpath, e))?;
        } else {
            write_entry(&mut file, &outpath, archive_name)?;
        }
    }
    Ok(())
}
