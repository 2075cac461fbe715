use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::options::TraversalPolicy;

/// Drop the first `count` `/`-separated segments of `name`.
///
/// Returns `None` when nothing is left to materialize. Leading `/` of the
/// remainder is dropped so absolute names stay under the destination.
pub fn strip_components(name: &str, count: usize) -> Option<&str> {
    let mut rest = name;
    for _ in 0..count {
        let slash = rest.find('/')?;
        rest = &rest[slash + 1..];
    }
    let rest = rest.trim_start_matches('/');
    (!rest.is_empty()).then_some(rest)
}

/// Join a stripped entry name onto `destination`.
pub fn resolve(destination: &Path, relative: &str, policy: TraversalPolicy) -> Result<PathBuf> {
    let resolved = destination.join(relative);
    if policy == TraversalPolicy::Reject && relative.split('/').any(|segment| segment == "..") {
        return Err(Error::PathTraversal {
            entry: relative.to_string(),
            resolved,
        });
    }
    Ok(resolved)
}
