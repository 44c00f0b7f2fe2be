//! Capability-based helpers for locating the Stalela database file.
//!
//! Paths are UTF-8 (`camino`) and every filesystem touch goes through a
//! `cap-std` directory handle opened from the nearest ambient root.
#![forbid(unsafe_code)]

use std::io;
use std::path::{Component, MAIN_SEPARATOR};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use log::debug;

/// Create every missing directory above a database file.
///
/// Bare file names and paths directly under the filesystem root need no
/// work and succeed immediately.
///
/// # Errors
/// Returns the underlying IO error when a directory cannot be opened or
/// created.
pub fn prepare_database_dir(database: &Utf8Path) -> io::Result<()> {
    let Some(parent) = database.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() {
        return Ok(());
    }
    let (root, relative) = split_ambient(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    debug!("creating database directory {parent}");
    root.create_dir_all(&relative)
}

/// Report whether `database` names an existing regular file.
///
/// A missing parent directory counts as "no database" rather than an
/// error, so callers can decide whether to bootstrap a fresh file.
///
/// # Errors
/// Returns IO errors other than [`io::ErrorKind::NotFound`].
pub fn database_exists(database: &Utf8Path) -> io::Result<bool> {
    let parent = match database.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let name = database
        .file_name()
        .ok_or_else(|| io::Error::other("database path should name a file"))?;
    let dir = match fs_utf8::Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(dir) => dir,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    match dir.metadata(name) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Split a directory path into an ambient root handle and the path
/// relative to it.
///
/// Absolute paths are rooted at `/` (or the drive prefix on Windows);
/// relative paths at the current directory.
///
/// # Errors
/// Fails when the root cannot be opened or the path is not UTF-8 after
/// stripping its prefix.
pub fn split_ambient(dir: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_dir = dir.as_std_path();
    let root = match std_dir.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            Utf8PathBuf::from(format!("{prefix}{MAIN_SEPARATOR}"))
        }
        Some(Component::RootDir) => Utf8PathBuf::from(MAIN_SEPARATOR.to_string()),
        _ => Utf8PathBuf::from("."),
    };
    let relative = if root.as_str() == "." {
        dir.to_path_buf()
    } else {
        dir.strip_prefix(&root)
            .map_err(|_| io::Error::other(format!("failed to strip the root from {dir}")))?
            .to_path_buf()
    };
    let handle = fs_utf8::Dir::open_ambient_dir(&root, ambient_authority())?;
    Ok((handle, relative))
}
