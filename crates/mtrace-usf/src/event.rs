//! Access events and their on-disk record layout.

use crate::{Result, UsfError};

/// Size of one encoded access record in bytes.
pub(crate) const RECORD_SIZE: usize = 29;

/// How an operand touched memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read = 0,
    Write = 1,
    ReadWrite = 2,
}

impl AccessKind {
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Read),
            1 => Some(Self::Write),
            2 => Some(Self::ReadWrite),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "R",
            Self::Write => "W",
            Self::ReadWrite => "RW",
        }
    }
}

impl std::fmt::Display for AccessKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded memory access.
///
/// Immutable once constructed; produced one per qualifying memory operand.
/// `time` is the absolute logical timestamp; the codec converts to and
/// from deltas on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessEvent {
    /// Address of the instruction performing the access.
    pub pc: u64,
    /// Effective address touched.
    pub addr: u64,
    /// Logical timestamp, non-decreasing across the trace.
    pub time: u64,
    /// Thread that performed the access.
    pub tid: u16,
    /// Access length in bytes.
    pub len: u16,
    pub kind: AccessKind,
}

/// Encode one record; `time_delta` replaces the absolute timestamp.
pub(crate) fn encode_record(event: &AccessEvent, time_delta: u64) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    buf[0..8].copy_from_slice(&event.pc.to_le_bytes());
    buf[8..16].copy_from_slice(&event.addr.to_le_bytes());
    buf[16..24].copy_from_slice(&time_delta.to_le_bytes());
    buf[24..26].copy_from_slice(&event.tid.to_le_bytes());
    buf[26..28].copy_from_slice(&event.len.to_le_bytes());
    buf[28] = event.kind as u8;
    buf
}

/// Decode one record, returning the event with `time` zeroed plus the
/// stored time delta; the reader reconstructs the absolute timestamp.
pub(crate) fn decode_record(buf: &[u8; RECORD_SIZE]) -> Result<(AccessEvent, u64)> {
    let kind = AccessKind::from_u8(buf[28]).ok_or(UsfError::UnknownAccessKind(buf[28]))?;
    let event = AccessEvent {
        pc: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
        addr: u64::from_le_bytes(buf[8..16].try_into().unwrap()),
        time: 0,
        tid: u16::from_le_bytes(buf[24..26].try_into().unwrap()),
        len: u16::from_le_bytes(buf[26..28].try_into().unwrap()),
        kind,
    };
    let time_delta = u64::from_le_bytes(buf[16..24].try_into().unwrap());
    Ok((event, time_delta))
}
