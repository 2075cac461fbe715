//! Owner and group resolution plus ownership changes.

use std::path::Path;

#[cfg(unix)]
use nix::unistd::{Group, User};

use crate::{Error, Result};

/// A resolved numeric owner and group.
///
/// Resolve once per extraction and apply to every materialized path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ownership {
    uid: u32,
    gid: u32,
}

impl Ownership {
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    pub fn uid(&self) -> u32 {
        self.uid
    }

    pub fn gid(&self) -> u32 {
        self.gid
    }

    /// The real uid and gid of the running process.
    #[cfg(unix)]
    pub fn current() -> Self {
        Self {
            uid: nix::unistd::getuid().as_raw(),
            gid: nix::unistd::getgid().as_raw(),
        }
    }

    #[cfg(not(unix))]
    pub fn current() -> Self {
        Self { uid: 0, gid: 0 }
    }

    /// Resolve `owner` and `group`, each given as a name or a numeric id.
    ///
    /// Names take precedence; a string that is not a known name but parses
    /// as a number is used as the id directly, the way `chown(1)` does.
    #[cfg(unix)]
    pub fn resolve(owner: &str, group: &str) -> Result<Self> {
        Ok(Self {
            uid: resolve_user(owner)?,
            gid: resolve_group(group)?,
        })
    }

    #[cfg(not(unix))]
    pub fn resolve(_owner: &str, _group: &str) -> Result<Self> {
        Err(Error::Unsupported("ownership"))
    }

    /// Change ownership of `path` without following a final symlink.
    #[cfg(unix)]
    pub fn apply(&self, path: &Path) -> Result<()> {
        std::os::unix::fs::lchown(path, Some(self.uid), Some(self.gid)).map_err(|e| {
            Error::Chown {
                path: path.to_path_buf(),
                source: e,
            }
        })
    }

    #[cfg(not(unix))]
    pub fn apply(&self, _path: &Path) -> Result<()> {
        Err(Error::Unsupported("ownership"))
    }
}

#[cfg(unix)]
fn resolve_user(name: &str) -> Result<u32> {
    match User::from_name(name) {
        Ok(Some(user)) => Ok(user.uid.as_raw()),
        Ok(None) => name
            .parse::<u32>()
            .map_err(|_| Error::UnknownUser(name.to_string())),
        Err(errno) => Err(Error::Lookup {
            name: name.to_string(),
            source: errno.into(),
        }),
    }
}

#[cfg(unix)]
fn resolve_group(name: &str) -> Result<u32> {
    match Group::from_name(name) {
        Ok(Some(group)) => Ok(group.gid.as_raw()),
        Ok(None) => name
            .parse::<u32>()
            .map_err(|_| Error::UnknownGroup(name.to_string())),
        Err(errno) => Err(Error::Lookup {
            name: name.to_string(),
            source: errno.into(),
        }),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::MetadataExt;

    #[test]
    fn numeric_ids_resolve_directly() {
        let current = Ownership::current();
        let resolved =
            Ownership::resolve(&current.uid().to_string(), &current.gid().to_string()).unwrap();
        assert_eq!(resolved, current);
    }

    #[test]
    fn root_resolves_by_name() {
        let resolved = Ownership::resolve("root", "0").unwrap();
        assert_eq!(resolved.uid(), 0);
        assert_eq!(resolved.gid(), 0);
    }

    #[test]
    fn unknown_names_are_reported() {
        let err = Ownership::resolve("no-such-user-unspool", "0").unwrap_err();
        assert!(matches!(err, Error::UnknownUser(name) if name == "no-such-user-unspool"));

        let err = Ownership::resolve("0", "no-such-group-unspool").unwrap_err();
        assert!(matches!(err, Error::UnknownGroup(name) if name == "no-such-group-unspool"));
    }

    #[test]
    fn apply_to_self_owner_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file");
        std::fs::write(&path, "x").unwrap();

        let owner = Ownership::current();
        owner.apply(&path).unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert_eq!(meta.uid(), owner.uid());
        assert_eq!(meta.gid(), owner.gid());
    }

    #[test]
    fn apply_does_not_follow_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("dangling");
        std::os::unix::fs::symlink("missing-target", &link).unwrap();

        Ownership::current().apply(&link).unwrap();
    }

    #[test]
    fn apply_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");

        let err = Ownership::current().apply(&path).unwrap_err();
        assert!(matches!(err, Error::Chown { .. }));
        assert_eq!(err.path(), Some(path.as_path()));
    }
}
