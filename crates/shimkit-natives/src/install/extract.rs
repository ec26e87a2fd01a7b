//! Unpack a verified download into a staging directory and locate the
//! library inside it.

use crate::errors::{NativeError, Result};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::EntryType;

use super::unzip::unzip_into;

/// Ceiling for any single decompressed file.
pub const MAX_DECOMPRESSED_BYTES: u64 = 512 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
    /// One bzip2-compressed file.
    Bzip2,
    /// One gzip-compressed file.
    Gzip,
    /// The download is the library itself.
    Raw,
}

impl ArchiveKind {
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            ArchiveKind::TarGz
        } else if lower.ends_with(".zip") {
            ArchiveKind::Zip
        } else if lower.ends_with(".bz2") {
            ArchiveKind::Bzip2
        } else if lower.ends_with(".gz") {
            ArchiveKind::Gzip
        } else {
            ArchiveKind::Raw
        }
    }
}

/// Unpack `download` (named `archive_name` upstream) under `staging` and
/// return the path of `library_file_name` inside it.
pub fn extract_library(
    download: &Path,
    archive_name: &str,
    library_file_name: &str,
    staging: &Path,
) -> Result<PathBuf> {
    match ArchiveKind::from_file_name(archive_name) {
        ArchiveKind::TarGz => {
            extract_tar_gz(download, archive_name, staging)?;
            locate_in_tree(staging, library_file_name, archive_name)
        }
        ArchiveKind::Zip => {
            unzip_into(download, archive_name, staging)?;
            locate_in_tree(staging, library_file_name, archive_name)
        }
        ArchiveKind::Bzip2 => {
            let src = open(download)?;
            decompress_single(BzDecoder::new(src), archive_name, &staging.join(library_file_name))
        }
        ArchiveKind::Gzip => {
            let src = open(download)?;
            decompress_single(GzDecoder::new(src), archive_name, &staging.join(library_file_name))
        }
        ArchiveKind::Raw => {
            let dst = staging.join(library_file_name);
            fs::copy(download, &dst).map_err(|e| NativeError::install(&dst, e))?;
            Ok(dst)
        }
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| NativeError::install(path, e))
}

/// Stream a tar.gz into `dest`. Every entry path is cleaned and checked
/// before anything is written; only directories and regular files are
/// accepted.
pub fn extract_tar_gz(archive_path: &Path, archive_name: &str, dest: &Path) -> Result<()> {
    let bad = |e: io::Error| NativeError::archive(archive_name, e.to_string());

    let mut archive = tar::Archive::new(GzDecoder::new(open(archive_path)?));
    fs::create_dir_all(dest).map_err(|e| NativeError::install(dest, e))?;

    for entry in archive.entries().map_err(bad)? {
        let mut entry = entry.map_err(bad)?;
        let raw = entry.path().map_err(bad)?.into_owned();
        let rel = clean_relative(&raw).ok_or_else(|| NativeError::UnsafeArchivePath {
            archive: archive_name.to_string(),
            entry: raw.display().to_string(),
        })?;
        let out = dest.join(&rel);

        match entry.header().entry_type() {
            EntryType::Directory => {
                fs::create_dir_all(&out).map_err(|e| NativeError::install(&out, e))?;
            }
            EntryType::Regular | EntryType::Continuous => {
                if rel.as_os_str().is_empty() {
                    return Err(NativeError::archive(archive_name, "file entry with empty path"));
                }
                write_entry(&mut entry, &out, archive_name)?;
            }
            // pax global header: metadata only, carries no file
            EntryType::XGlobalHeader => {}
            other => {
                return Err(NativeError::archive(
                    archive_name,
                    format!("entry {} has unsupported type {other:?}", raw.display()),
                ));
            }
        }
    }
    Ok(())
}

/// Write one archive member to `out`, creating parents and enforcing the
/// size ceiling.
pub(super) fn write_entry<R: Read>(reader: &mut R, out: &Path, archive_name: &str) -> Result<()> {
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent).map_err(|e| NativeError::install(parent, e))?;
    }
    let mut file = File::create(out).map_err(|e| NativeError::install(out, e))?;
    copy_bounded(reader, &mut file, MAX_DECOMPRESSED_BYTES)
        .map_err(|e| e.into_native(archive_name, out))?;
    Ok(())
}

fn decompress_single<R: Read>(mut decoder: R, archive_name: &str, out: &Path) -> Result<PathBuf> {
    write_entry(&mut decoder, out, archive_name)?;
    Ok(out.to_path_buf())
}

pub(super) enum CopyError {
    Read(io::Error),
    Write(io::Error),
    TooLarge(u64),
}

impl CopyError {
    fn into_native(self, archive_name: &str, out: &Path) -> NativeError {
        match self {
            CopyError::Read(e) => NativeError::archive(archive_name, format!("decompress: {e}")),
            CopyError::Write(e) => NativeError::install(out, e),
            CopyError::TooLarge(limit) => NativeError::archive(
                archive_name,
                format!("{} exceeds the {limit}-byte extraction limit", out.display()),
            ),
        }
    }
}

/// `io::copy` that tells read and write failures apart and stops after
/// `limit` bytes.
pub(super) fn copy_bounded<R: Read + ?Sized, W: Write>(
    reader: &mut R,
    writer: &mut W,
    limit: u64,
) -> std::result::Result<u64, CopyError> {
    let mut buf = vec![0u8; 64 * 1024];
    let mut total: u64 = 0;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        total += n as u64;
        if total > limit {
            return Err(CopyError::TooLarge(limit));
        }
        writer.write_all(&buf[..n]).map_err(CopyError::Write)?;
    }
    writer.flush().map_err(CopyError::Write)?;
    Ok(total)
}

/// Lexically clean an archive path. `None` if it is absolute or climbs out
/// of the extraction root.
pub(crate) fn clean_relative(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for c in path.components() {
        match c {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

/// Breadth-first search for a regular file called `name`; shallowest match
/// wins, siblings in name order.
pub fn find_by_name(root: &Path, name: &str) -> io::Result<Option<PathBuf>> {
    let mut queue = vec![root.to_path_buf()];
    while !queue.is_empty() {
        let mut next = Vec::new();
        for dir in queue {
            let mut entries = fs::read_dir(&dir)?.collect::<io::Result<Vec<_>>>()?;
            entries.sort_by_key(|e| e.file_name());
            for e in entries {
                let ft = e.file_type()?;
                if ft.is_file() && e.file_name() == name {
                    return Ok(Some(e.path()));
                }
                if ft.is_dir() {
                    next.push(e.path());
                }
            }
        }
        queue = next;
    }
    Ok(None)
}

fn locate_in_tree(root: &Path, name: &str, archive_name: &str) -> Result<PathBuf> {
    find_by_name(root, name)
        .map_err(|e| NativeError::install(root, e))?
        .ok_or_else(|| NativeError::archive(archive_name, format!("{name} not found in archive")))
}
