//! Trace sinks.

use std::io::Write;

use mtrace_usf::{AccessEvent, UsfWriter};

/// Destination for recorded access events.
///
/// `close` must be idempotent. The session closes the sink exactly once on
/// an orderly shutdown, and not at all when an append has failed.
pub trait TraceSink {
    /// # Errors
    /// Propagates the sink's write failure.
    fn append(&mut self, event: &AccessEvent) -> mtrace_usf::Result<()>;

    /// # Errors
    /// Propagates the sink's finalization failure.
    fn close(&mut self) -> mtrace_usf::Result<()>;
}

impl<W: Write> TraceSink for UsfWriter<W> {
    fn append(&mut self, event: &AccessEvent) -> mtrace_usf::Result<()> {
        UsfWriter::append(self, event)
    }

    fn close(&mut self) -> mtrace_usf::Result<()> {
        UsfWriter::close(self)
    }
}

/// In-memory sink for tests and analysis passes that never touch disk.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Vec<AccessEvent>,
    closes: usize,
}

impl MemorySink {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            events: Vec::new(),
            closes: 0,
        }
    }

    #[must_use]
    pub fn events(&self) -> &[AccessEvent] {
        &self.events
    }

    /// How many times `close` was called.
    #[must_use]
    pub const fn close_count(&self) -> usize {
        self.closes
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closes > 0
    }
}

impl TraceSink for MemorySink {
    fn append(&mut self, event: &AccessEvent) -> mtrace_usf::Result<()> {
        self.events.push(*event);
        Ok(())
    }

    fn close(&mut self) -> mtrace_usf::Result<()> {
        self.closes += 1;
        Ok(())
    }
}
