//! Trace header: format constants, flag set, and the header record itself.

use bitflags::bitflags;

use crate::{Result, UsfError};

/// File magic, written uncompressed at offset zero.
pub const MAGIC: [u8; 4] = *b"USF\0";

/// Current format version.
pub const VERSION_CURRENT: u32 = 1;

bitflags! {
    /// Header flag set.
    ///
    /// A trace written by the recorder always carries `NATIVE_ENDIAN`,
    /// `TRACE` and `DELTA`, plus exactly one of the two time-base flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HeaderFlags: u32 {
        /// Integer fields are in the producer's native byte order.
        const NATIVE_ENDIAN = 1 << 0;
        /// The file holds an ordered access trace (not a sample set).
        const TRACE = 1 << 1;
        /// Timestamps are stored as successive deltas.
        const DELTA = 1 << 2;
        /// The logical clock ticked once per recorded access.
        const TIME_ACCESSES = 1 << 3;
        /// The logical clock ticked once per executed instruction.
        const TIME_INSTRUCTIONS = 1 << 4;
    }
}

/// Stream compression applied to the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None = 0,
    Bzip2 = 1,
}

impl Compression {
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Bzip2),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bzip2 => "bzip2",
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit by which the logical clock advances, fixed for one trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeBase {
    /// One tick per recorded access; timestamps are unique.
    #[default]
    Accesses,
    /// One tick per capture-eligible instruction; all operand accesses of
    /// one instruction share the tick.
    Instructions,
}

impl TimeBase {
    #[must_use]
    pub const fn flag(self) -> HeaderFlags {
        match self {
            Self::Accesses => HeaderFlags::TIME_ACCESSES,
            Self::Instructions => HeaderFlags::TIME_INSTRUCTIONS,
        }
    }
}

/// One-time trace header, written before any access record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceHeader {
    pub version: u32,
    pub compression: Compression,
    pub flags: HeaderFlags,
    /// POSIX wall-clock seconds at open; 0 when the clock was unavailable.
    pub time_begin: u64,
    /// The traced program's own command line, tracer arguments excluded.
    pub argv: Vec<String>,
}

impl TraceHeader {
    /// Build a header for a new recording with the standard flag set.
    #[must_use]
    pub fn new(
        compression: Compression,
        time_base: TimeBase,
        time_begin: u64,
        argv: Vec<String>,
    ) -> Self {
        Self {
            version: VERSION_CURRENT,
            compression,
            flags: HeaderFlags::NATIVE_ENDIAN
                | HeaderFlags::TRACE
                | HeaderFlags::DELTA
                | time_base.flag(),
            time_begin,
            argv,
        }
    }

    /// Decode the time base recorded in the flag set.
    ///
    /// # Errors
    /// Returns [`UsfError::InvalidFlags`] unless exactly one time-base flag
    /// is set.
    pub fn time_base(&self) -> Result<TimeBase> {
        let accesses = self.flags.contains(HeaderFlags::TIME_ACCESSES);
        let instructions = self.flags.contains(HeaderFlags::TIME_INSTRUCTIONS);
        match (accesses, instructions) {
            (true, false) => Ok(TimeBase::Accesses),
            (false, true) => Ok(TimeBase::Instructions),
            _ => Err(UsfError::InvalidFlags(self.flags.bits())),
        }
    }

    /// Check the header against the codec contract.
    ///
    /// # Errors
    /// Returns an error for a version this codec does not write, a flag set
    /// missing the trace/delta markers, or an ambiguous time base.
    pub fn validate(&self) -> Result<()> {
        if self.version != VERSION_CURRENT {
            return Err(UsfError::UnsupportedVersion(self.version));
        }
        if !self.flags.contains(HeaderFlags::TRACE | HeaderFlags::DELTA) {
            return Err(UsfError::InvalidFlags(self.flags.bits()));
        }
        self.time_base()?;
        Ok(())
    }
}
