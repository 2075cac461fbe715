/// Resource limits applied while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Largest accepted `././@LongLink` body in bytes.
    ///
    /// Default: 64 KiB.
    pub max_long_name: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_long_name: 64 * 1024,
        }
    }
}

impl Limits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_long_name(mut self, bytes: u64) -> Self {
        self.max_long_name = bytes;
        self
    }
}
