//! Capture-window state machine, logical clock, and recording session for
//! memory-access tracing.
//!
//! The pieces compose into a [`Session`]: a host (an emulator, a binary
//! instrumentation engine, a replay driver) reports executed instructions
//! and control events, the session decides what falls inside the capture
//! window, stamps each access with a logical timestamp, and hands the
//! records to a [`TraceSink`].
//!
//! ```ignore
//! use mtrace_core::{CaptureWindow, LogicalClock, MemOperand, NoopHost, Session, Trigger};
//! use mtrace_usf::TimeBase;
//!
//! let window = CaptureWindow::new(Trigger::AddressRange {
//!     begin: Some(0x1000),
//!     end: Some(0x2000),
//!     detach_on_stop: false,
//! });
//! let mut session = Session::new(
//!     window,
//!     LogicalClock::new(TimeBase::Accesses),
//!     sink,
//!     Box::new(NoopHost),
//! );
//! session.on_instruction(0x1000, 0, &[MemOperand::read(0x8000, 8)])?;
//! ```

mod access;
mod clock;
mod host;
mod session;
mod sink;
mod window;

pub use access::MemOperand;
pub use clock::LogicalClock;
pub use host::{ExecutionContext, HostControl, NoopHost};
pub use session::{Session, SharedSession};
pub use sink::{MemorySink, TraceSink};
pub use window::{CaptureWindow, ControlSignal, Trigger, WindowEffect};

// Event and time-base types are shared with the on-disk codec.
pub use mtrace_usf::{AccessEvent, AccessKind, TimeBase};

use thiserror::Error;

/// Recording errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to append trace event: {0}")]
    Append(#[source] mtrace_usf::UsfError),
    #[error("Failed to close trace sink: {0}")]
    Close(#[source] mtrace_usf::UsfError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
