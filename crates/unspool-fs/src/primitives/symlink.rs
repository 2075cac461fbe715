use crate::{Error, Result};
use std::path::Path;

/// Create a symbolic link at `link` pointing to `target`.
///
/// The target is stored verbatim; it is neither resolved nor required to
/// exist.
pub fn symlink(target: impl AsRef<Path>, link: impl AsRef<Path>) -> Result<()> {
    let target = target.as_ref();
    let link = link.as_ref();

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).map_err(|e| Error::Symlink {
            target: target.to_path_buf(),
            link: link.to_path_buf(),
            source: e,
        })
    }

    #[cfg(windows)]
    {
        let result = if target.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        };
        result.map_err(|e| Error::Symlink {
            target: target.to_path_buf(),
            link: link.to_path_buf(),
            source: e,
        })
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = (target, link);
        Err(Error::Unsupported("symlink"))
    }
}
