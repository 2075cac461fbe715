//! Forward-only tar decoding.
//!
//! [`TarDecoder`] reads 512-byte header blocks from any [`std::io::Read`]
//! and hands out one [`TarEntry`] at a time. GNU `././@LongLink` records are
//! folded into the entry that follows them and never surface on their own.
//!
//! The sequence is single pass: an entry borrows the decoder, and its body
//! must be read or skipped before the next header can be reached. Advancing
//! with an unread body drains the remainder first, so skipping is always
//! safe, only slower than not reading at all. Re-iterating requires a new
//! decoder over a freshly opened stream.

mod decoder;
mod entry;
pub(crate) mod header;
mod limits;

pub use decoder::TarDecoder;
pub use entry::{EntryType, TarEntry};
pub use header::{BLOCK_SIZE, LONG_LINK_NAME};
pub use limits::Limits;
