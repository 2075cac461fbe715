//! Turning decoded entries into filesystem objects.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use unspool_fs::{ExistingDirectory, Ownership};

use crate::error::{Error, Malformed, Result};
use crate::options::{ArchiveRequest, TraversalPolicy};
use crate::sanitize;
use crate::tar::{EntryType, TarEntry};

/// Body bytes copied per read.
pub const CHUNK_SIZE: usize = 4096;

/// What happened to one entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Materialized(PathBuf),
    /// Nothing left of the name after stripping.
    Skipped,
}

/// Per-extraction settings applied to every entry.
#[derive(Debug)]
pub struct Materializer<'a> {
    archive: &'a Path,
    destination: &'a Path,
    strip_components: usize,
    existing_directories: ExistingDirectory,
    traversal: TraversalPolicy,
    ownership: Ownership,
}

impl<'a> Materializer<'a> {
    pub fn new(request: &'a ArchiveRequest, ownership: Ownership) -> Self {
        Self {
            archive: &request.source_path,
            destination: &request.destination_dir,
            strip_components: request.strip_components,
            existing_directories: request.existing_directories,
            traversal: request.traversal,
            ownership,
        }
    }

    pub fn materialize<R: Read>(&self, mut entry: TarEntry<'_, R>) -> Result<Outcome> {
        let Some(relative) = sanitize::strip_components(entry.full_name(), self.strip_components)
        else {
            debug!(entry = entry.full_name(), "skipping entry with no remaining components");
            entry.skip()?;
            return Ok(Outcome::Skipped);
        };
        let path = sanitize::resolve(self.destination, relative, self.traversal)?;

        match entry.entry_type() {
            EntryType::Directory => {
                unspool_fs::create_dir(&path, entry.mode(), self.existing_directories)?;
            }
            EntryType::RegularFile => write_body(&mut entry, &path)?,
            EntryType::Symlink => {
                let target = entry.link_target().ok_or_else(|| Error::MalformedArchive {
                    offset: entry.offset(),
                    kind: Malformed::MissingLinkTarget(entry.full_name().to_string()),
                })?;
                unspool_fs::symlink(target, &path)?;
            }
            EntryType::Other(flag) => {
                return Err(Error::UnknownEntryType {
                    flag,
                    entry: entry.full_name().to_string(),
                    archive: self.archive.to_path_buf(),
                });
            }
        }

        self.ownership.apply(&path)?;
        debug!(
            entry = entry.full_name(),
            kind = ?entry.entry_type(),
            mode = entry.mode(),
            path = %path.display(),
            "materialized entry"
        );
        Ok(Outcome::Materialized(path))
    }
}

fn write_body<R: Read>(entry: &mut TarEntry<'_, R>, path: &Path) -> Result<()> {
    let mut file = unspool_fs::create_file(path, entry.mode())?;
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = entry.read_chunk(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(|e| unspool_fs::Error::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::fs::{MetadataExt, PermissionsExt};

    use super::*;
    use crate::tar::TarDecoder;
    use crate::tar::header::tests::block;

    fn archive(blocks: &[Vec<u8>]) -> Vec<u8> {
        let mut out = blocks.concat();
        out.extend([0u8; 1024]);
        out
    }

    fn body(data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        out.resize(data.len().div_ceil(512) * 512, 0);
        out
    }

    fn run(bytes: &[u8], request: &ArchiveRequest) -> Result<Vec<Outcome>> {
        let materializer = Materializer::new(request, Ownership::current());
        let mut decoder = TarDecoder::new(bytes);
        let mut outcomes = Vec::new();
        while let Some(entry) = decoder.next_entry()? {
            outcomes.push(materializer.materialize(entry)?);
        }
        Ok(outcomes)
    }

    fn request(dest: &Path) -> ArchiveRequest {
        ArchiveRequest::new("test.tar", dest, "0", "0")
    }

    #[test]
    fn creates_each_entry_type() {
        let dir = tempfile::tempdir().unwrap();
        let data = vec![7u8; CHUNK_SIZE * 2 + 10];
        let bytes = archive(&[
            block(b"bin/", b'5', 0o755, 0, b"").to_vec(),
            block(b"bin/tool", b'0', 0o750, data.len() as u64, b"").to_vec(),
            body(&data),
            block(b"tool", b'2', 0o777, 0, b"bin/tool").to_vec(),
        ]);

        let outcomes = run(&bytes, &request(dir.path())).unwrap();
        assert_eq!(outcomes.len(), 3);

        let tool = dir.path().join("bin/tool");
        assert_eq!(std::fs::read(&tool).unwrap(), data);
        assert_eq!(std::fs::metadata(&tool).unwrap().permissions().mode() & 0o777, 0o750);
        assert_eq!(
            std::fs::read_link(dir.path().join("tool")).unwrap(),
            Path::new("bin/tool")
        );
        assert_eq!(
            std::fs::symlink_metadata(dir.path().join("tool")).unwrap().uid(),
            Ownership::current().uid()
        );
    }

    #[test]
    fn stripped_away_entries_leave_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = archive(&[
            block(b"pkg/", b'5', 0o755, 0, b"").to_vec(),
            block(b"pkg/readme", b'0', 0o644, 3, b"").to_vec(),
            body(b"hey"),
        ]);

        let outcomes = run(&bytes, &request(dir.path()).strip_components(1)).unwrap();
        assert_eq!(outcomes[0], Outcome::Skipped);
        assert_eq!(outcomes[1], Outcome::Materialized(dir.path().join("readme")));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn unknown_type_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = archive(&[block(b"dev/null", b'3', 0o666, 0, b"").to_vec()]);

        let err = run(&bytes, &request(dir.path())).unwrap_err();
        assert!(matches!(err, Error::UnknownEntryType { flag: b'3', .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn symlink_without_target_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = archive(&[block(b"dangling", b'2', 0o777, 0, b"").to_vec()]);

        let err = run(&bytes, &request(dir.path())).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedArchive {
                kind: Malformed::MissingLinkTarget(_),
                ..
            }
        ));
    }

    #[test]
    fn existing_directory_follows_policy() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("lib")).unwrap();
        let bytes = archive(&[block(b"lib/", b'5', 0o755, 0, b"").to_vec()]);

        let err = run(&bytes, &request(dir.path())).unwrap_err();
        assert!(matches!(
            err,
            Error::Filesystem(unspool_fs::Error::CreateDir { .. })
        ));

        let reuse = request(dir.path()).existing_directories(ExistingDirectory::Reuse);
        assert!(run(&bytes, &reuse).is_ok());
    }

    #[test]
    fn traversal_policy_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dest");
        std::fs::create_dir(&dest).unwrap();
        let bytes = archive(&[
            block(b"../escaped", b'0', 0o644, 1, b"").to_vec(),
            body(b"x"),
        ]);

        let reject = request(&dest).traversal(TraversalPolicy::Reject);
        let err = run(&bytes, &reject).unwrap_err();
        assert!(matches!(err, Error::PathTraversal { .. }));
        assert!(!dir.path().join("escaped").exists());

        run(&bytes, &request(&dest)).unwrap();
        assert_eq!(std::fs::read(dir.path().join("escaped")).unwrap(), b"x");
    }

    #[test]
    fn reject_does_not_guard_against_earlier_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dest");
        let outside = dir.path().join("outside");
        std::fs::create_dir(&dest).unwrap();
        std::fs::create_dir(&outside).unwrap();
        let target = outside.to_str().unwrap().as_bytes().to_vec();
        let bytes = archive(&[
            block(b"link", b'2', 0o777, 0, &target).to_vec(),
            block(b"link/planted", b'0', 0o644, 1, b"").to_vec(),
            body(b"x"),
        ]);

        let reject = request(&dest).traversal(TraversalPolicy::Reject);
        run(&bytes, &reject).unwrap();
        assert_eq!(std::fs::read(outside.join("planted")).unwrap(), b"x");
    }
}
