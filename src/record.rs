//! Record framing
//!
//! Every log record is stored as a single object with a fixed layout.
//!
//! ## Frame Format
//! ```text
//! ┌──────────────┬─────────────────────┬──────────────┐
//! │ Offset (8)   │ Payload (N)         │ CRC16 (2)    │
//! │ big-endian   │ verbatim            │ big-endian   │
//! └──────────────┴─────────────────────┴──────────────┘
//!   CRC16 covers Offset + Payload
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum::{crc16, CHECKSUM_SIZE};
use crate::error::{LogError, Result};

/// Size of the offset header in bytes
pub const OFFSET_SIZE: usize = 8;

/// Smallest valid frame: header + checksum, empty payload
pub const MIN_FRAME_SIZE: usize = OFFSET_SIZE + CHECKSUM_SIZE;

/// A single record of the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based position in the log
    pub offset: u64,

    /// Opaque record contents
    pub payload: Bytes,
}

impl Record {
    pub fn new(offset: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            offset,
            payload: payload.into(),
        }
    }

    /// Serialize this record into a frame
    pub fn encode(&self) -> Bytes {
        encode(self.offset, &self.payload)
    }
}

/// Build the frame for `(offset, payload)`
pub fn encode(offset: u64, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(MIN_FRAME_SIZE + payload.len());
    buf.put_u64(offset);
    buf.put_slice(payload);
    let crc = crc16(&buf);
    buf.put_u16(crc);
    buf.freeze()
}

/// Read the offset header of a frame without validating the checksum
pub fn embedded_offset(frame: &[u8]) -> Result<u64> {
    check_len(frame)?;
    let mut header = [0u8; OFFSET_SIZE];
    header.copy_from_slice(&frame[..OFFSET_SIZE]);
    Ok(u64::from_be_bytes(header))
}

/// Parse and validate a frame
///
/// The payload of the returned record shares the frame's buffer.
pub fn parse(frame: Bytes) -> Result<Record> {
    let offset = embedded_offset(&frame)?;

    let body_len = frame.len() - CHECKSUM_SIZE;
    let stored = u16::from_be_bytes([frame[body_len], frame[body_len + 1]]);
    let computed = crc16(&frame[..body_len]);
    if stored != computed {
        return Err(LogError::ChecksumMismatch { stored, computed });
    }

    Ok(Record {
        offset,
        payload: frame.slice(OFFSET_SIZE..body_len),
    })
}

fn check_len(frame: &[u8]) -> Result<()> {
    if frame.len() < MIN_FRAME_SIZE {
        return Err(LogError::MalformedRecord { len: frame.len() });
    }
    Ok(())
}
