use std::path::PathBuf;

use crate::tar::Limits;

pub use unspool_fs::ExistingDirectory;

/// How entry names containing `..` segments are handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TraversalPolicy {
    /// Join the stripped name onto the destination unchecked.
    #[default]
    Allow,
    /// Fail with [`crate::Error::PathTraversal`] on any `..` segment.
    ///
    /// Only the entry name is checked. Symlinks created earlier in the same
    /// archive are still followed, so `lib/link -> /etc` followed by
    /// `lib/link/passwd` writes outside the destination. This is not full
    /// containment.
    Reject,
}

/// One extraction: where from, where to, and as whom.
#[derive(Clone, Debug)]
pub struct ArchiveRequest {
    pub source_path: PathBuf,
    /// Must already exist.
    pub destination_dir: PathBuf,
    pub strip_components: usize,
    /// User name or numeric uid.
    pub owner: String,
    /// Group name or numeric gid.
    pub group: String,
    pub existing_directories: ExistingDirectory,
    pub traversal: TraversalPolicy,
    pub limits: Limits,
}

impl ArchiveRequest {
    pub fn new(
        source_path: impl Into<PathBuf>,
        destination_dir: impl Into<PathBuf>,
        owner: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            destination_dir: destination_dir.into(),
            strip_components: 0,
            owner: owner.into(),
            group: group.into(),
            existing_directories: ExistingDirectory::default(),
            traversal: TraversalPolicy::default(),
            limits: Limits::default(),
        }
    }

    pub fn strip_components(mut self, n: usize) -> Self {
        self.strip_components = n;
        self
    }

    pub fn existing_directories(mut self, policy: ExistingDirectory) -> Self {
        self.existing_directories = policy;
        self
    }

    pub fn traversal(mut self, policy: TraversalPolicy) -> Self {
        self.traversal = policy;
        self
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}
