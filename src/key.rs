//! Key codec
//!
//! Maps log offsets to object keys and back.
//!
//! ## Key Format
//! ```text
//! {prefix}/{offset as 20-digit zero-padded decimal}
//!
//! wal/00000000000000000001
//! wal/00000000000000000002
//! ...
//! wal/18446744073709551615
//! ```
//!
//! Twenty digits cover the whole `u64` range, and a fixed width makes the
//! lexicographic order of keys equal to the numeric order of offsets. Recovery
//! depends on that.

use crate::error::{LogError, Result};

/// Width of the decimal offset part of a key
pub const OFFSET_WIDTH: usize = 20;

/// Encodes and decodes the keys of one log namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCodec {
    /// `{prefix}/`, kept with the separator so encode/decode never rebuild it
    namespace: String,
}

impl KeyCodec {
    /// Create a codec for the given prefix
    ///
    /// The prefix must be a valid object path: non-empty, no leading or
    /// trailing `/`, no empty, `.` or `..` segments. Segments may only use
    /// ASCII letters, digits, `-`, `_` and `.`, so that every backend stores
    /// and lists the key byte-for-byte as it was built.
    pub fn new(prefix: &str) -> Result<Self> {
        if prefix.is_empty() {
            return Err(LogError::Config("prefix must not be empty".to_string()));
        }
        for segment in prefix.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(LogError::Config(format!(
                    "prefix {:?} has an invalid path segment {:?}",
                    prefix, segment
                )));
            }
            if let Some(c) = segment.chars().find(|c| !is_plain_key_char(*c)) {
                return Err(LogError::Config(format!(
                    "prefix {:?} contains {:?}, which object stores would escape",
                    prefix, c
                )));
            }
        }

        Ok(Self {
            namespace: format!("{}/", prefix),
        })
    }

    /// The prefix this codec was built with (without the trailing `/`)
    pub fn prefix(&self) -> &str {
        &self.namespace[..self.namespace.len() - 1]
    }

    /// The listing prefix, `{prefix}/`
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Build the key for an offset
    pub fn encode(&self, offset: u64) -> String {
        format!("{}{:0width$}", self.namespace, offset, width = OFFSET_WIDTH)
    }

    /// Recover the offset from a key
    pub fn decode(&self, key: &str) -> Result<u64> {
        let malformed = || LogError::MalformedKey {
            key: key.to_string(),
        };

        let digits = key.strip_prefix(self.namespace.as_str()).ok_or_else(malformed)?;
        if digits.len() != OFFSET_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        // 20 digits can still exceed u64::MAX
        digits.parse::<u64>().map_err(|_| malformed())
    }
}

/// Characters that object paths keep verbatim
fn is_plain_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}
