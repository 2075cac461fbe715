use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::{Error, Result};

static TAR_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.tar$").unwrap());
static GZIP_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.t?gz$").unwrap());
static BZIP2_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.t?bz2?$").unwrap());

/// Decompression layer in front of the tar stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionKind {
    None,
    Gzip,
    Bzip2,
}

impl fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "uncompressed",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
        })
    }
}

impl CompressionKind {
    /// Classify `path` by the suffix of its file name.
    ///
    /// Checked in order: `.tar`, then `.gz`/`.tgz`, then `.bz`/`.bz2`/`.tbz`/
    /// `.tbz2`. Matching is case-sensitive.
    pub fn from_path(path: &Path) -> Result<Self> {
        let unsupported = || Error::UnsupportedFormat {
            path: path.to_path_buf(),
        };
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(unsupported)?;

        if TAR_SUFFIX.is_match(name) {
            Ok(Self::None)
        } else if GZIP_SUFFIX.is_match(name) {
            Ok(Self::Gzip)
        } else if BZIP2_SUFFIX.is_match(name) {
            Ok(Self::Bzip2)
        } else {
            Err(unsupported())
        }
    }

    /// Whether this build can decode the layer.
    pub fn is_available(self) -> bool {
        match self {
            Self::None | Self::Gzip => true,
            Self::Bzip2 => cfg!(feature = "bzip2"),
        }
    }

    /// Wrap `reader` in the matching decoder. `path` is only used for errors.
    pub fn decoder<R: Read>(self, reader: R, path: &Path) -> Result<Decoder<R>> {
        trace!(kind = %self, path = %path.display(), "selecting stream filter");
        match self {
            Self::None => Ok(Decoder::Passthrough(reader)),
            Self::Gzip => Ok(Decoder::Gzip(Box::new(flate2::read::GzDecoder::new(
                reader,
            )))),
            #[cfg(feature = "bzip2")]
            Self::Bzip2 => Ok(Decoder::Bzip2(Box::new(bzip2::read::BzDecoder::new(
                reader,
            )))),
            #[cfg(not(feature = "bzip2"))]
            Self::Bzip2 => {
                let _ = reader;
                Err(Error::NotImplemented {
                    kind: self,
                    path: path.to_path_buf(),
                })
            }
        }
    }
}

/// A tar byte stream with zero or one decompression layer.
///
/// Owns the inner reader; dropping the decoder releases the whole chain.
pub enum Decoder<R> {
    Passthrough(R),
    Gzip(Box<flate2::read::GzDecoder<R>>),
    #[cfg(feature = "bzip2")]
    Bzip2(Box<bzip2::read::BzDecoder<R>>),
}

impl<R> Decoder<R> {
    pub fn kind(&self) -> CompressionKind {
        match self {
            Self::Passthrough(_) => CompressionKind::None,
            Self::Gzip(_) => CompressionKind::Gzip,
            #[cfg(feature = "bzip2")]
            Self::Bzip2(_) => CompressionKind::Bzip2,
        }
    }
}

// BzDecoder has no Debug impl.
impl<R> fmt::Debug for Decoder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Decoder").field(&self.kind()).finish()
    }
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Passthrough(r) => r.read(buf),
            Self::Gzip(d) => d.read(buf),
            #[cfg(feature = "bzip2")]
            Self::Bzip2(d) => d.read(buf),
        }
    }
}

/// Classify `path`, then open it and wrap it in the matching decoder.
///
/// Unknown suffixes and unavailable codecs fail before the file is opened.
pub fn open(path: &Path) -> Result<Decoder<BufReader<File>>> {
    open_as(path, CompressionKind::from_path(path)?)
}

/// Open `path` behind an already chosen decoder.
pub fn open_as(path: &Path, kind: CompressionKind) -> Result<Decoder<BufReader<File>>> {
    if !kind.is_available() {
        return Err(Error::NotImplemented {
            kind,
            path: path.to_path_buf(),
        });
    }
    let file = unspool_fs::open_file(path)?;
    kind.decoder(BufReader::new(file), path)
}
