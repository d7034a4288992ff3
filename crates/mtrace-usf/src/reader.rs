//! Trace reader.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use bzip2::read::BzDecoder;

use crate::event::{RECORD_SIZE, decode_record};
use crate::header::{Compression, HeaderFlags, MAGIC, TraceHeader, VERSION_CURRENT};
use crate::{AccessEvent, Result, UsfError};

enum Source<R: Read> {
    Plain(R),
    Bzip2(BzDecoder<R>),
}

impl<R: Read> Read for Source<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(r) => r.read(buf),
            Self::Bzip2(r) => r.read(buf),
        }
    }
}

/// Reads a trace back: header validation up front, then one record per
/// call with absolute timestamps reconstructed from the stored deltas.
pub struct UsfReader<R: Read> {
    source: Source<R>,
    header: TraceHeader,
    last_time: u64,
}

impl UsfReader<BufReader<File>> {
    /// Open the trace file at `path` and parse its header.
    ///
    /// # Errors
    /// Fails if the file cannot be opened or the header is malformed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read> UsfReader<R> {
    /// Parse the prelude and header from `inner`.
    ///
    /// # Errors
    /// Fails on a bad magic number, an unsupported version, an unknown
    /// compression code, or a flag set that is not a valid trace.
    pub fn new(mut inner: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        inner.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(UsfError::InvalidMagic);
        }

        let version = read_u32(&mut inner)?;
        if version != VERSION_CURRENT {
            return Err(UsfError::UnsupportedVersion(version));
        }

        let compression_raw = read_u8(&mut inner)?;
        let compression = Compression::from_u8(compression_raw)
            .ok_or(UsfError::UnknownCompression(compression_raw))?;

        let mut source = match compression {
            Compression::None => Source::Plain(inner),
            Compression::Bzip2 => Source::Bzip2(BzDecoder::new(inner)),
        };

        let flags_raw = read_u32(&mut source)?;
        let flags = HeaderFlags::from_bits(flags_raw).ok_or(UsfError::InvalidFlags(flags_raw))?;
        let time_begin = read_u64(&mut source)?;

        let argc = read_u32(&mut source)? as usize;
        let mut argv = Vec::with_capacity(argc.min(1024));
        for _ in 0..argc {
            let len = read_u32(&mut source)? as usize;
            let mut buf = vec![0u8; len];
            source.read_exact(&mut buf)?;
            argv.push(String::from_utf8(buf)?);
        }

        let header = TraceHeader {
            version,
            compression,
            flags,
            time_begin,
            argv,
        };
        header.validate()?;

        Ok(Self {
            source,
            header,
            last_time: 0,
        })
    }

    #[must_use]
    pub const fn header(&self) -> &TraceHeader {
        &self.header
    }

    /// Read the next access record, or `None` at a clean end of stream.
    ///
    /// # Errors
    /// Fails on a record cut short mid-way or an unknown access kind.
    pub fn next_event(&mut self) -> Result<Option<AccessEvent>> {
        let mut buf = [0u8; RECORD_SIZE];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.source.read(&mut buf[filled..])?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(UsfError::TruncatedRecord);
            }
            filled += n;
        }

        let (mut event, time_delta) = decode_record(&buf)?;
        self.last_time = self.last_time.wrapping_add(time_delta);
        event.time = self.last_time;
        Ok(Some(event))
    }
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::TimeBase;
    use crate::{AccessKind, UsfWriter};

    fn access(pc: u64, addr: u64, time: u64, kind: AccessKind) -> AccessEvent {
        AccessEvent {
            pc,
            addr,
            time,
            tid: 1,
            len: 8,
            kind,
        }
    }

    fn write_trace(header: &TraceHeader, events: &[AccessEvent]) -> Vec<u8> {
        let mut writer = UsfWriter::new(Vec::new(), header).unwrap();
        for event in events {
            writer.append(event).unwrap();
        }
        writer.finish().unwrap()
    }

    #[test]
    fn test_round_trip_uncompressed() {
        let header = TraceHeader::new(
            Compression::None,
            TimeBase::Accesses,
            1234,
            vec!["./app".to_string(), "--input".to_string()],
        );
        let events = [
            access(0x1000, 0x2000, 0, AccessKind::Read),
            access(0x1004, 0x2008, 1, AccessKind::Write),
            access(0x1008, 0x2010, 2, AccessKind::ReadWrite),
        ];
        let bytes = write_trace(&header, &events);

        let mut reader = UsfReader::new(&bytes[..]).unwrap();
        assert_eq!(reader.header(), &header);
        for expected in &events {
            assert_eq!(reader.next_event().unwrap(), Some(*expected));
        }
        assert_eq!(reader.next_event().unwrap(), None);
    }

    #[test]
    fn test_round_trip_bzip2_instruction_base() {
        // The header must come back bit-identical through the compressed
        // stream, time-base flag included.
        let header = TraceHeader::new(
            Compression::Bzip2,
            TimeBase::Instructions,
            99,
            vec!["prog".to_string()],
        );
        let events = [
            access(0x40, 0x100, 1, AccessKind::Read),
            access(0x40, 0x108, 1, AccessKind::Write),
            access(0x44, 0x110, 2, AccessKind::Read),
        ];
        let bytes = write_trace(&header, &events);

        let mut reader = UsfReader::new(&bytes[..]).unwrap();
        assert_eq!(reader.header().flags, header.flags);
        assert_eq!(reader.header().compression, Compression::Bzip2);
        assert_eq!(reader.header().time_base().unwrap(), TimeBase::Instructions);
        for expected in &events {
            assert_eq!(reader.next_event().unwrap(), Some(*expected));
        }
        assert_eq!(reader.next_event().unwrap(), None);
    }

    #[test]
    fn test_delta_reconstruction_with_gaps() {
        let header = TraceHeader::new(Compression::None, TimeBase::Accesses, 0, vec![]);
        let events = [
            access(0x10, 0x20, 5, AccessKind::Read),
            access(0x14, 0x28, 5000, AccessKind::Read),
            access(0x18, 0x30, 5001, AccessKind::Write),
        ];
        let bytes = write_trace(&header, &events);

        let mut reader = UsfReader::new(&bytes[..]).unwrap();
        let times: Vec<u64> = std::iter::from_fn(|| reader.next_event().unwrap())
            .map(|e| e.time)
            .collect();
        assert_eq!(times, vec![5, 5000, 5001]);
    }

    #[test]
    fn test_invalid_magic() {
        let bytes = b"NOPE\x01\x00\x00\x00\x00";
        assert!(matches!(
            UsfReader::new(&bytes[..]),
            Err(UsfError::InvalidMagic)
        ));
    }

    #[test]
    fn test_truncated_record() {
        let header = TraceHeader::new(Compression::None, TimeBase::Accesses, 0, vec![]);
        let events = [access(0x10, 0x20, 0, AccessKind::Read)];
        let mut bytes = write_trace(&header, &events);
        bytes.truncate(bytes.len() - 5);

        let mut reader = UsfReader::new(&bytes[..]).unwrap();
        assert!(matches!(
            reader.next_event(),
            Err(UsfError::TruncatedRecord)
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.usf");

        let header = TraceHeader::new(Compression::Bzip2, TimeBase::Accesses, 42, vec![]);
        let mut writer = UsfWriter::create(&path, &header).unwrap();
        writer
            .append(&access(0x1000, 0x8000, 0, AccessKind::Write))
            .unwrap();
        writer.close().unwrap();

        let mut reader = UsfReader::open(&path).unwrap();
        assert_eq!(reader.header().time_begin, 42);
        let event = reader.next_event().unwrap().unwrap();
        assert_eq!(event.pc, 0x1000);
        assert_eq!(event.kind, AccessKind::Write);
        assert_eq!(reader.next_event().unwrap(), None);
    }
}
