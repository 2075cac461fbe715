use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open '{path}': {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("'{path}' is not an existing directory")]
    NotADirectory { path: PathBuf },

    #[error("failed to create directory '{path}': {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to create symlink '{link}' -> '{target}': {source}")]
    Symlink {
        target: PathBuf,
        link: PathBuf,
        source: io::Error,
    },

    #[error("failed to change ownership of '{path}': {source}")]
    Chown { path: PathBuf, source: io::Error },

    #[error("unknown user '{0}'")]
    UnknownUser(String),

    #[error("unknown group '{0}'")]
    UnknownGroup(String),

    #[error("failed to look up '{name}': {source}")]
    Lookup { name: String, source: io::Error },

    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

impl Error {
    /// The filesystem path the failed operation was acting on, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Open { path, .. }
            | Self::NotADirectory { path }
            | Self::CreateDir { path, .. }
            | Self::Write { path, .. }
            | Self::Chown { path, .. } => Some(path),
            Self::Symlink { link, .. } => Some(link),
            _ => None,
        }
    }

    /// The underlying OS error, if the failure came from a system call.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::Open { source, .. }
            | Self::CreateDir { source, .. }
            | Self::Write { source, .. }
            | Self::Symlink { source, .. }
            | Self::Chown { source, .. }
            | Self::Lookup { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_and_io_error_are_exposed() {
        let err = Error::Write {
            path: PathBuf::from("/out/bin/run"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.path(), Some(Path::new("/out/bin/run")));
        assert_eq!(
            err.io_error().map(io::Error::kind),
            Some(io::ErrorKind::PermissionDenied)
        );
    }

    #[test]
    fn symlink_error_reports_link_path() {
        let err = Error::Symlink {
            target: PathBuf::from("../bin/run"),
            link: PathBuf::from("/out/lib/link"),
            source: io::Error::from(io::ErrorKind::AlreadyExists),
        };
        assert_eq!(err.path(), Some(Path::new("/out/lib/link")));
        assert!(err.to_string().contains("../bin/run"));
    }

    #[test]
    fn lookup_failures_have_no_path() {
        let err = Error::UnknownUser("nobody-here".into());
        assert!(err.path().is_none());
        assert!(err.io_error().is_none());
        assert_eq!(err.to_string(), "unknown user 'nobody-here'");
    }
}
