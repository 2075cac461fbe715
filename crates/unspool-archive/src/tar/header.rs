//! Raw 512-byte header block parsing.
//!
//! Field offsets follow the POSIX ustar layout; GNU headers share the same
//! offsets for every field read here.

use crate::error::Malformed;

pub const BLOCK_SIZE: usize = 512;

/// Name field of the GNU record carrying an over-long name or link target.
pub const LONG_LINK_NAME: &[u8] = b"././@LongLink";

const NAME: std::ops::Range<usize> = 0..100;
const MODE: std::ops::Range<usize> = 100..108;
const SIZE: std::ops::Range<usize> = 124..136;
const CHECKSUM: std::ops::Range<usize> = 148..156;
const TYPEFLAG: usize = 156;
const LINKNAME: std::ops::Range<usize> = 157..257;
const MAGIC: std::ops::Range<usize> = 257..263;
const PREFIX: std::ops::Range<usize> = 345..500;

const USTAR_MAGIC: &[u8] = b"ustar\0";

/// Owned fields of one header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeader {
    /// Name field as stored, before any ustar prefix is applied.
    pub name: Vec<u8>,
    /// `prefix/name` for POSIX ustar headers, otherwise the name field.
    pub full_name: Vec<u8>,
    pub flag: u8,
    pub mode: u32,
    pub size: u64,
    pub link_name: Vec<u8>,
}

impl RawHeader {
    pub fn is_long_link(&self) -> bool {
        self.name == LONG_LINK_NAME
    }
}

pub fn is_zero_block(block: &[u8; BLOCK_SIZE]) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Verify the checksum and decode the fields of a non-zero header block.
pub fn parse(block: &[u8; BLOCK_SIZE]) -> Result<RawHeader, Malformed> {
    verify_checksum(block)?;

    let name = truncate_null(&block[NAME]).to_vec();
    let full_name = if &block[MAGIC] == USTAR_MAGIC {
        let prefix = truncate_null(&block[PREFIX]);
        if prefix.is_empty() {
            name.clone()
        } else {
            let mut joined = Vec::with_capacity(prefix.len() + 1 + name.len());
            joined.extend_from_slice(prefix);
            joined.push(b'/');
            joined.extend_from_slice(&name);
            joined
        }
    } else {
        name.clone()
    };

    let mode = parse_numeric(&block[MODE], "mode")?;
    let size = parse_numeric(&block[SIZE], "size")?;
    // Body plus padding must stay addressable as a byte count.
    if size.checked_add(BLOCK_SIZE as u64 - 1).is_none() {
        return Err(Malformed::InvalidNumeric { field: "size" });
    }

    Ok(RawHeader {
        name,
        full_name,
        flag: block[TYPEFLAG],
        mode: (mode & 0o7777) as u32,
        size,
        link_name: truncate_null(&block[LINKNAME]).to_vec(),
    })
}

/// Accepts the unsigned sum and, for archives written by old tar
/// implementations, the signed sum.
fn verify_checksum(block: &[u8; BLOCK_SIZE]) -> Result<(), Malformed> {
    let stored = parse_octal(&block[CHECKSUM], "checksum")?;

    let mut unsigned: u64 = 0;
    let mut signed: i64 = 0;
    for (i, &byte) in block.iter().enumerate() {
        let byte = if CHECKSUM.contains(&i) { b' ' } else { byte };
        unsigned += u64::from(byte);
        signed += i64::from(byte as i8);
    }

    if stored == unsigned || i64::try_from(stored).is_ok_and(|s| s == signed) {
        Ok(())
    } else {
        Err(Malformed::Checksum {
            stored,
            computed: unsigned,
        })
    }
}

/// Octal ASCII with optional leading spaces, terminated by space or NUL.
fn parse_octal(bytes: &[u8], field: &'static str) -> Result<u64, Malformed> {
    let start = bytes.iter().position(|&b| b != b' ').unwrap_or(bytes.len());
    let end = bytes[start..]
        .iter()
        .position(|&b| b == b' ' || b == 0)
        .map_or(bytes.len(), |i| start + i);

    let mut value: u64 = 0;
    for &byte in &bytes[start..end] {
        if !(b'0'..=b'7').contains(&byte) {
            return Err(Malformed::InvalidNumeric { field });
        }
        value = value
            .checked_mul(8)
            .and_then(|v| v.checked_add(u64::from(byte - b'0')))
            .ok_or(Malformed::InvalidNumeric { field })?;
    }
    Ok(value)
}

/// Octal, or GNU base-256 when the high bit of the first byte is set.
fn parse_numeric(bytes: &[u8], field: &'static str) -> Result<u64, Malformed> {
    match bytes.first() {
        Some(&first) if first & 0x80 != 0 => {
            let mut value: u64 = u64::from(first & 0x7f);
            for &byte in &bytes[1..] {
                value = value
                    .checked_mul(256)
                    .and_then(|v| v.checked_add(u64::from(byte)))
                    .ok_or(Malformed::InvalidNumeric { field })?;
            }
            Ok(value)
        }
        _ => parse_octal(bytes, field),
    }
}

fn truncate_null(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(pos) => &bytes[..pos],
        None => bytes,
    }
}
