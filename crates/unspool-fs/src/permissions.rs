//! Mode-aware creation of directories and regular files.
//!
//! Mode bits are handed to the creating system call, so the process umask
//! applies exactly as it does for `mkdir(2)` and `open(2)`.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use crate::{Error, Result};

/// What to do when a directory entry's path already exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExistingDirectory {
    /// Treat a pre-existing path as a creation failure.
    #[default]
    Fail,
    /// Accept a pre-existing directory as-is. A non-directory still fails.
    Reuse,
}

/// Create a single directory with `mode` permission bits.
///
/// The parent must already exist. Returns `true` when the directory was
/// created and `false` when an existing directory was reused.
pub fn create_dir(path: &Path, mode: u32, existing: ExistingDirectory) -> Result<bool> {
    let mut builder = fs::DirBuilder::new();

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    match builder.create(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && existing == ExistingDirectory::Reuse => {
            let is_dir = fs::symlink_metadata(path)
                .map(|m| m.is_dir())
                .unwrap_or(false);
            if is_dir {
                tracing::trace!(path = %path.display(), "reusing existing directory");
                Ok(false)
            } else {
                Err(Error::CreateDir {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        }
        Err(e) => Err(Error::CreateDir {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Open `path` for writing with `mode` permission bits, creating or
/// truncating it.
pub fn create_file(path: &Path, mode: u32) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    options.open(path).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Open an existing file for reading.
pub fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::Open {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Fail unless `path` exists and is a directory (symlinks followed).
pub fn require_dir(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::NotADirectory {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(Error::Open {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
