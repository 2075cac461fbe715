use std::io::{self, Read};

use super::decoder::TarDecoder;
use crate::Result;

/// Entry kind, decided once from the header's type flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryType {
    RegularFile,
    Directory,
    Symlink,
    /// Any flag this extractor does not materialize, with the raw byte.
    Other(u8),
}

impl EntryType {
    pub fn from_flag(flag: u8) -> Self {
        match flag {
            b'0' | b'\0' => Self::RegularFile,
            b'5' => Self::Directory,
            b'2' => Self::Symlink,
            other => Self::Other(other),
        }
    }

    pub fn flag(self) -> u8 {
        match self {
            Self::RegularFile => b'0',
            Self::Directory => b'5',
            Self::Symlink => b'2',
            Self::Other(flag) => flag,
        }
    }
}

/// One decoded entry plus a bounded cursor over its body.
///
/// Borrows the decoder; drop it (or call [`skip`](Self::skip)) to continue
/// iterating.
#[derive(Debug)]
pub struct TarEntry<'a, R> {
    pub(super) full_name: String,
    pub(super) entry_type: EntryType,
    pub(super) mode: u32,
    pub(super) link_target: Option<String>,
    pub(super) size: u64,
    pub(super) offset: u64,
    pub(super) decoder: &'a mut TarDecoder<R>,
}

impl<R: Read> TarEntry<'_, R> {
    /// Entry name with any long-name record already applied.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    /// Permission bits (`0o7777` mask) from the header.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    pub fn link_target(&self) -> Option<&str> {
        self.link_target.as_deref()
    }

    /// Body length declared by the header.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Stream offset of this entry's header block.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read the next part of the body into `buf`; `Ok(0)` once exhausted.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.decoder.read_body(buf)
    }

    /// Discard the unread body and its padding.
    pub fn skip(self) -> Result<()> {
        self.decoder.finish_entry()
    }
}

impl<R: Read> Read for TarEntry<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.decoder.read_body(buf).map_err(io::Error::other)
    }
}
