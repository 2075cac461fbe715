//! Streaming tar extraction with optional gzip or bzip2 decompression.
//!
//! # Architecture
//!
//! - `format.rs` - Suffix classification and the decompression layer
//! - `tar/` - Forward-only tar decoding, GNU long names included
//! - `sanitize.rs` - Component stripping and destination joining
//! - `materialize.rs` - Per-entry filesystem effects and ownership
//! - `extract.rs` - The pipeline tying the three together
//!
//! The handle chain (file, decompressor, decoder) is owned by the
//! extraction call and dropped as a unit on every exit path.

pub use error::{Error, Malformed, Result};
pub use extract::{extract, extract_from_reader};
pub use format::{CompressionKind, Decoder};
pub use options::{ArchiveRequest, ExistingDirectory, TraversalPolicy};
pub use crate::tar::{EntryType, Limits, TarDecoder, TarEntry};

mod error;
mod extract;
pub mod format;
mod materialize;
pub mod options;
mod sanitize;
pub mod tar;
