use std::io;
use std::path::PathBuf;

use crate::format::CompressionKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown or unsupported archive extension: '{path}'")]
    UnsupportedFormat { path: PathBuf },

    #[error("{kind} decompression is not available in this build: '{path}'")]
    NotImplemented { kind: CompressionKind, path: PathBuf },

    #[error("unknown tar entry type {flag:#04x} for '{entry}' in '{archive}'")]
    UnknownEntryType {
        flag: u8,
        entry: String,
        archive: PathBuf,
    },

    #[error(transparent)]
    Filesystem(#[from] unspool_fs::Error),

    #[error("malformed archive at offset {offset}: {kind}")]
    MalformedArchive { offset: u64, kind: Malformed },

    #[error("entry '{entry}' resolves outside the destination: '{resolved}'")]
    PathTraversal { entry: String, resolved: PathBuf },

    #[error("failed to read archive stream at offset {offset}: {source}")]
    Read { offset: u64, source: io::Error },
}

/// Structural problems found while decoding the tar stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Malformed {
    #[error("header checksum mismatch: stored {stored}, computed {computed}")]
    Checksum { stored: u64, computed: u64 },

    #[error("invalid numeric field `{field}`")]
    InvalidNumeric { field: &'static str },

    #[error("unexpected end of stream")]
    Truncated,

    #[error("long name record of {size} bytes exceeds limit of {limit}")]
    LongNameTooLarge { size: u64, limit: u64 },

    #[error("long name record follows another without an intervening entry")]
    DuplicateLongName,

    #[error("long name record is not followed by an entry")]
    DanglingLongName,

    #[error("`{field}` is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    #[error("symlink '{0}' has no target")]
    MissingLinkTarget(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_entry_type_message_shows_flag() {
        let err = Error::UnknownEntryType {
            flag: b'3',
            entry: "dev/tty".into(),
            archive: PathBuf::from("/tmp/a.tar"),
        };
        assert_eq!(
            err.to_string(),
            "unknown tar entry type 0x33 for 'dev/tty' in '/tmp/a.tar'"
        );
    }

    #[test]
    fn malformed_message_includes_offset() {
        let err = Error::MalformedArchive {
            offset: 1024,
            kind: Malformed::Truncated,
        };
        assert_eq!(
            err.to_string(),
            "malformed archive at offset 1024: unexpected end of stream"
        );
    }

    #[test]
    fn filesystem_errors_convert() {
        let err: Error = unspool_fs::Error::UnknownGroup("svc".into()).into();
        assert!(matches!(err, Error::Filesystem(_)));
    }
}
