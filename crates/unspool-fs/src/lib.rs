//! Filesystem primitives used when materializing archive entries.
//!
//! Every operation reports the offending path together with the OS error so
//! callers can surface a single failure without extra bookkeeping.

mod error;
mod owner;
pub mod permissions;
pub mod primitives;

pub use error::{Error, Result};
pub use owner::Ownership;
pub use permissions::{ExistingDirectory, create_dir, create_file, open_file, require_dir};
pub use primitives::symlink;
