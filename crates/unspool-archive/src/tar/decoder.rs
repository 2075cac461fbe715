use std::io::{self, Read};

use tracing::trace;

use super::entry::{EntryType, TarEntry};
use super::header::{self, BLOCK_SIZE, RawHeader};
use super::limits::Limits;
use crate::error::{Error, Malformed, Result};

/// Long name / long link target waiting for the next real header.
#[derive(Debug, Default)]
struct LongNameState {
    name: Option<String>,
    link_target: Option<String>,
}

impl LongNameState {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.link_target.is_none()
    }
}

/// Streaming tar decoder over a (possibly decompressing) byte stream.
///
/// ```no_run
/// use std::fs::File;
/// use unspool_archive::TarDecoder;
///
/// let mut decoder = TarDecoder::new(File::open("pkg.tar").unwrap());
/// while let Some(entry) = decoder.next_entry().unwrap() {
///     println!("{} ({} bytes)", entry.full_name(), entry.size());
///     entry.skip().unwrap();
/// }
/// ```
#[derive(Debug)]
pub struct TarDecoder<R> {
    reader: R,
    limits: Limits,
    pending: LongNameState,
    header: [u8; BLOCK_SIZE],
    /// Bytes consumed from `reader` so far.
    offset: u64,
    /// Unread body bytes of the current entry.
    remaining: u64,
    /// Padding after the current entry's body.
    padding: u64,
    done: bool,
}

impl<R: Read> TarDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_limits(reader, Limits::default())
    }

    pub fn with_limits(reader: R, limits: Limits) -> Self {
        Self {
            reader,
            limits,
            pending: LongNameState::default(),
            header: [0u8; BLOCK_SIZE],
            offset: 0,
            remaining: 0,
            padding: 0,
            done: false,
        }
    }

    /// Bytes consumed from the underlying stream.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Advance to the next entry.
    ///
    /// Returns `Ok(None)` at the first all-zero block or at a clean end of
    /// stream on a block boundary. Any unread body of the previous entry is
    /// drained first.
    pub fn next_entry(&mut self) -> Result<Option<TarEntry<'_, R>>> {
        if self.done {
            return Ok(None);
        }
        self.finish_entry()?;

        loop {
            let header_offset = self.offset;
            if !self.read_header()? || header::is_zero_block(&self.header) {
                self.done = true;
                if !self.pending.is_empty() {
                    return Err(malformed(header_offset, Malformed::DanglingLongName));
                }
                return Ok(None);
            }

            let raw = header::parse(&self.header).map_err(|kind| malformed(header_offset, kind))?;

            if raw.is_long_link() {
                self.read_long_link(&raw, header_offset)?;
                continue;
            }

            return self.make_entry(raw, header_offset).map(Some);
        }
    }

    /// Skip whatever is left of the current entry, padding included.
    pub(crate) fn finish_entry(&mut self) -> Result<()> {
        let rest = self.remaining.saturating_add(self.padding);
        self.remaining = 0;
        self.padding = 0;
        self.skip_bytes(rest)
    }

    pub(crate) fn read_body(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = loop {
            match self.reader.read(&mut buf[..want]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.read_error(e)),
            }
        };
        if n == 0 {
            return Err(malformed(self.offset, Malformed::Truncated));
        }
        self.remaining -= n as u64;
        self.offset += n as u64;
        Ok(n)
    }

    fn make_entry(&mut self, raw: RawHeader, offset: u64) -> Result<TarEntry<'_, R>> {
        let header_name = utf8(raw.full_name, "name", offset)?;
        let full_name = match self.pending.name.take() {
            Some(long) => long,
            None => header_name,
        };
        let link_target = match self.pending.link_target.take() {
            Some(long) => Some(long),
            None if raw.link_name.is_empty() => None,
            None => Some(utf8(raw.link_name, "link target", offset)?),
        };

        self.remaining = raw.size;
        self.padding = padding(raw.size);

        Ok(TarEntry {
            full_name,
            entry_type: EntryType::from_flag(raw.flag),
            mode: raw.mode,
            link_target,
            size: raw.size,
            offset,
            decoder: self,
        })
    }

    fn read_long_link(&mut self, raw: &RawHeader, offset: u64) -> Result<()> {
        let is_link = raw.flag == b'K';
        let slot_taken = if is_link {
            self.pending.link_target.is_some()
        } else {
            self.pending.name.is_some()
        };
        if slot_taken {
            return Err(malformed(offset, Malformed::DuplicateLongName));
        }
        if raw.size > self.limits.max_long_name {
            return Err(malformed(
                offset,
                Malformed::LongNameTooLarge {
                    size: raw.size,
                    limit: self.limits.max_long_name,
                },
            ));
        }

        // Bounded by the limit checked above.
        let mut body = vec![0u8; raw.size as usize];
        if let Err(e) = self.reader.read_exact(&mut body) {
            return Err(self.read_error(e));
        }
        self.offset += raw.size;
        self.skip_bytes(padding(raw.size))?;

        while body.last().is_some_and(|&b| b == 0 || b.is_ascii_whitespace()) {
            body.pop();
        }
        let value = utf8(body, "long name", offset)?;
        trace!(offset, link = is_link, value = %value, "buffered long name record");

        if is_link {
            self.pending.link_target = Some(value);
        } else {
            self.pending.name = Some(value);
        }
        Ok(())
    }

    /// Fill the header buffer; `Ok(false)` on end of stream before any byte.
    fn read_header(&mut self) -> Result<bool> {
        let mut filled = 0;
        while filled < BLOCK_SIZE {
            match self.reader.read(&mut self.header[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => return Err(malformed(self.offset, Malformed::Truncated)),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.read_error(e)),
            }
        }
        self.offset += BLOCK_SIZE as u64;
        Ok(true)
    }

    fn skip_bytes(&mut self, len: u64) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        let result = io::copy(&mut (&mut self.reader).take(len), &mut io::sink());
        let copied = result.map_err(|e| self.read_error(e))?;
        self.offset += copied;
        if copied < len {
            return Err(malformed(self.offset, Malformed::Truncated));
        }
        Ok(())
    }

    fn read_error(&self, e: io::Error) -> Error {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            malformed(self.offset, Malformed::Truncated)
        } else {
            Error::Read {
                offset: self.offset,
                source: e,
            }
        }
    }
}

fn padding(size: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    (block - size % block) % block
}

fn malformed(offset: u64, kind: Malformed) -> Error {
    Error::MalformedArchive { offset, kind }
}

fn utf8(bytes: Vec<u8>, field: &'static str, offset: u64) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| malformed(offset, Malformed::InvalidUtf8 { field }))
}
