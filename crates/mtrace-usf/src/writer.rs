//! Trace writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use bzip2::write::BzEncoder;

use crate::event::{RECORD_SIZE, encode_record};
use crate::header::{Compression, MAGIC, TraceHeader};
use crate::{AccessEvent, Result, UsfError};

enum Stream<W: Write> {
    Plain(W),
    Bzip2(BzEncoder<W>),
}

impl<W: Write> Write for Stream<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Bzip2(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Bzip2(w) => w.flush(),
        }
    }
}

/// Writes a trace: header at open, one record per append, explicit close.
///
/// `close` is idempotent. There is no implicit close on drop: an aborted
/// recording must leave a visibly unterminated stream rather than a
/// well-formed trace that silently ends early.
pub struct UsfWriter<W: Write> {
    stream: Option<Stream<W>>,
    last_time: u64,
    events_written: u64,
}

impl UsfWriter<BufWriter<File>> {
    /// Create the trace file at `path` and write `header` immediately.
    ///
    /// # Errors
    /// Fails if the file cannot be created or the codec rejects the header.
    pub fn create(path: impl AsRef<Path>, header: &TraceHeader) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), header)
    }
}

impl<W: Write> UsfWriter<W> {
    /// Wrap `inner` and write `header` immediately.
    ///
    /// The magic, version and compression mode go out uncompressed; the
    /// remaining header fields and all records follow on the (possibly
    /// compressed) body stream.
    ///
    /// # Errors
    /// Fails if the codec rejects the header or the prelude cannot be
    /// written.
    pub fn new(mut inner: W, header: &TraceHeader) -> Result<Self> {
        header.validate()?;

        inner.write_all(&MAGIC)?;
        inner.write_all(&header.version.to_le_bytes())?;
        inner.write_all(&[header.compression as u8])?;

        let mut stream = match header.compression {
            Compression::None => Stream::Plain(inner),
            Compression::Bzip2 => {
                Stream::Bzip2(BzEncoder::new(inner, bzip2::Compression::default()))
            }
        };

        stream.write_all(&header.flags.bits().to_le_bytes())?;
        stream.write_all(&header.time_begin.to_le_bytes())?;
        let argc = u32::try_from(header.argv.len()).map_err(|_| {
            UsfError::Io(std::io::Error::other("argv longer than u32::MAX entries"))
        })?;
        stream.write_all(&argc.to_le_bytes())?;
        for arg in &header.argv {
            let len = u32::try_from(arg.len()).map_err(|_| {
                UsfError::Io(std::io::Error::other("argv entry longer than u32::MAX"))
            })?;
            stream.write_all(&len.to_le_bytes())?;
            stream.write_all(arg.as_bytes())?;
        }

        Ok(Self {
            stream: Some(stream),
            last_time: 0,
            events_written: 0,
        })
    }

    /// Append one access record, delta-encoding its timestamp.
    ///
    /// # Errors
    /// Fails if the writer is closed or the underlying write fails.
    pub fn append(&mut self, event: &AccessEvent) -> Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(UsfError::Closed);
        };
        let delta = event.time.wrapping_sub(self.last_time);
        let record: [u8; RECORD_SIZE] = encode_record(event, delta);
        stream.write_all(&record)?;
        self.last_time = event.time;
        self.events_written += 1;
        Ok(())
    }

    /// Flush and release the output. The second and later calls are no-ops.
    ///
    /// # Errors
    /// Fails if finishing the compressed stream or the final flush fails.
    pub fn close(&mut self) -> Result<()> {
        self.close_inner().map(|_| ())
    }

    /// Close and hand back the underlying writer.
    ///
    /// # Errors
    /// Fails if the writer was already closed or the final flush fails.
    pub fn finish(mut self) -> Result<W> {
        self.close_inner()?.ok_or(UsfError::Closed)
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Number of records appended so far.
    #[must_use]
    pub const fn events_written(&self) -> u64 {
        self.events_written
    }

    fn close_inner(&mut self) -> Result<Option<W>> {
        match self.stream.take() {
            None => Ok(None),
            Some(Stream::Plain(mut w)) => {
                w.flush()?;
                Ok(Some(w))
            }
            Some(Stream::Bzip2(encoder)) => {
                let mut w = encoder.finish()?;
                w.flush()?;
                Ok(Some(w))
            }
        }
    }
}
