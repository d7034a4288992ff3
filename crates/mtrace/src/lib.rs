//! Memory-access trace recorder.
//!
//! Records the memory accesses a program makes inside a capture window into
//! a USF trace file. The window opens and closes on trigger addresses or on
//! host control events; each recorded access carries a logical timestamp, a
//! thread id, and a read/write classification.
//!
//! The recorder is split in three:
//! - [`mtrace_usf`]: the on-disk trace format (header, records, compression)
//! - [`mtrace_core`]: the capture window, logical clock, and session
//! - this crate: the CLI, the script-driven replay host, and metrics
//!
//! ```ignore
//! use mtrace::host::ScriptHost;
//! use mtrace::{CaptureWindow, LogicalClock, Session, TimeBase, Trigger};
//!
//! let host = ScriptHost::load("events.txt")?;
//! let mut session = Session::new(
//!     CaptureWindow::new(Trigger::AddressRange {
//!         begin: Some(0x1000),
//!         end: Some(0x2000),
//!         detach_on_stop: false,
//!     }),
//!     LogicalClock::new(TimeBase::Accesses),
//!     writer,
//!     Box::new(host.controller()),
//! );
//! let stats = host.run(&mut session)?;
//! ```

pub mod host;
pub mod metrics;

pub use mtrace_core::{
    AccessEvent, AccessKind, CaptureWindow, ControlSignal, ExecutionContext, HostControl,
    LogicalClock, MemOperand, MemorySink, NoopHost, Session, SessionError, SharedSession,
    TimeBase, TraceSink, Trigger, WindowEffect,
};
pub use mtrace_usf::{Compression, HeaderFlags, TraceHeader, UsfError, UsfReader, UsfWriter};
