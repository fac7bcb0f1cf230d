//! Copy step
//!
//! Copies one source file into its extension bucket. Bytes are written to a
//! temp file inside the bucket and renamed over the destination, so a reader
//! never sees a torn file and the last completed copy wins.

use crate::error::{Result, SortCopyError};
use crate::fs::BucketLayout;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Copy buffer size
const BUFFER_SIZE: usize = 256 * 1024;

/// Outcome of a successful copy
#[derive(Debug, Clone)]
pub struct CopiedFile {
    /// Source path
    pub source: PathBuf,
    /// Final destination path
    pub destination: PathBuf,
    /// Bytes written
    pub bytes_copied: u64,
}

/// Ensure a bucket folder exists.
///
/// Safe to race: a folder created by another worker counts as success.
pub fn ensure_bucket(dir: &Path) -> Result<()> {
    match std::fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(SortCopyError::copy(dir, e)),
    }
}

/// Copy `source` into `layout`'s bucket for it, overwriting any existing file
pub fn copy_into_bucket(layout: &BucketLayout, source: &Path) -> Result<CopiedFile> {
    let destination = layout.destination_for(source).ok_or_else(|| {
        SortCopyError::copy(
            source,
            io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    let bucket = layout.bucket_dir(source);

    ensure_bucket(&bucket)?;

    let bytes_copied = write_atomically(source, &bucket, &destination)
        .map_err(|e| SortCopyError::copy(source, e))?;

    Ok(CopiedFile {
        source: source.to_path_buf(),
        destination,
        bytes_copied,
    })
}

/// Stream `source` into a temp file in `bucket`, then rename it to `destination`.
///
/// The temp file is deleted on every error path.
fn write_atomically(source: &Path, bucket: &Path, destination: &Path) -> io::Result<u64> {
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, File::open(source)?);

    let temp = tempfile::Builder::new()
        .prefix(".sortcopy-")
        .suffix(".partial")
        .tempfile_in(bucket)?;

    let bytes = {
        let mut writer = BufWriter::with_capacity(BUFFER_SIZE, temp.as_file());
        let bytes = io::copy(&mut reader, &mut writer)?;
        writer.flush()?;
        bytes
    };

    copy_permissions(source, &temp)?;

    temp.persist(destination).map_err(|e| e.error)?;
    Ok(bytes)
}

fn copy_permissions(source: &Path, temp: &NamedTempFile) -> io::Result<()> {
    let permissions = std::fs::metadata(source)?.permissions();
    temp.as_file().set_permissions(permissions)
}
