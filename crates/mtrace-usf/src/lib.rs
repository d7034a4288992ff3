//! USF trace file codec.
//!
//! Defines the on-disk layout of memory-access traces: an uncompressed
//! prelude (magic, format version, compression mode) followed by a body
//! holding the header flag set, wall-clock start time, the traced program's
//! command line, and a stream of fixed-size access records. Timestamps are
//! stored delta-encoded; the body may be wrapped in a BZip2 stream.

mod event;
mod header;
mod reader;
mod writer;

pub use event::{AccessEvent, AccessKind};
pub use header::{Compression, HeaderFlags, MAGIC, TimeBase, TraceHeader, VERSION_CURRENT};
pub use reader::UsfReader;
pub use writer::UsfWriter;

use thiserror::Error;

/// Trace codec errors.
#[derive(Error, Debug)]
pub enum UsfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid USF magic number")]
    InvalidMagic,
    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u32),
    #[error("Unknown compression code: {0}")]
    UnknownCompression(u8),
    #[error("Invalid header flags: {0:#x}")]
    InvalidFlags(u32),
    #[error("Unknown access kind: {0}")]
    UnknownAccessKind(u8),
    #[error("Header string is not valid UTF-8")]
    InvalidString(#[from] std::string::FromUtf8Error),
    #[error("Truncated event record")]
    TruncatedRecord,
    #[error("Trace already closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, UsfError>;
