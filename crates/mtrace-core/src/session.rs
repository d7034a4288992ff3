//! Recording session: the glue between host, window, clock and sink.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::access::MemOperand;
use crate::clock::LogicalClock;
use crate::host::{ExecutionContext, HostControl};
use crate::sink::TraceSink;
use crate::window::{CaptureWindow, ControlSignal, WindowEffect};
use crate::{AccessEvent, Result, SessionError};

/// One recording: a capture window gating a stream of instructions, a
/// logical clock stamping their accesses, and a sink receiving the records.
///
/// The session owns the shutdown contract. The sink is closed exactly once,
/// and only on an orderly end of recording; after a failed append the sink
/// is left open so the truncation stays visible.
pub struct Session<S: TraceSink> {
    window: CaptureWindow,
    clock: LogicalClock,
    sink: S,
    host: Box<dyn HostControl>,
    closed: bool,
}

impl<S: TraceSink> Session<S> {
    #[must_use]
    pub fn new(
        window: CaptureWindow,
        clock: LogicalClock,
        sink: S,
        host: Box<dyn HostControl>,
    ) -> Self {
        Self {
            window,
            clock,
            sink,
            host,
            closed: false,
        }
    }

    /// Report one executed instruction and its memory operands.
    ///
    /// Window transitions triggered by `pc` fire before the gate is
    /// consulted, so the instruction at a begin address is recorded and the
    /// one at an end address is not.
    ///
    /// # Errors
    /// Fails when a record cannot be appended or, on a window that ends the
    /// recording, when the final close fails. After an append failure the
    /// host has been told to abort.
    pub fn on_instruction(&mut self, pc: u64, tid: u16, operands: &[MemOperand]) -> Result<()> {
        match self.window.on_address(pc) {
            Some(WindowEffect::Opened) => {
                debug!(pc = format!("{pc:#x}"), "capture window opened");
            }
            Some(WindowEffect::Closed) => {
                debug!(pc = format!("{pc:#x}"), "capture window closed");
            }
            Some(WindowEffect::Terminate) => {
                info!(
                    pc = format!("{pc:#x}"),
                    "capture window closed, stopping traced program"
                );
                self.shutdown()?;
                self.host.terminate(0);
                return Ok(());
            }
            Some(WindowEffect::Detach) | None => {}
        }

        if !self.window.is_enabled() {
            return Ok(());
        }

        self.clock.begin_instruction();
        for op in operands {
            let event = AccessEvent {
                pc,
                addr: op.addr,
                time: self.clock.stamp(),
                tid,
                len: op.len,
                kind: op.kind(),
            };
            self.append(&event)?;
        }
        Ok(())
    }

    /// Deliver a host control event, with an optional execution context to
    /// resume the traced program from afterwards.
    ///
    /// A stop that terminates the traced program never resumes it, even
    /// when a context was supplied.
    ///
    /// # Errors
    /// Fails when a terminating stop cannot finalize the trace.
    pub fn on_control_event(
        &mut self,
        signal: ControlSignal,
        ctx: Option<ExecutionContext>,
    ) -> Result<()> {
        match self.window.on_control(signal) {
            Some(WindowEffect::Opened) => {
                info!("tracing enabled by control event");
                self.host.flush_pending();
            }
            Some(WindowEffect::Terminate) => {
                info!("tracing stopped, terminating traced program");
                self.shutdown()?;
                self.host.terminate(0);
                return Ok(());
            }
            Some(WindowEffect::Detach) => {
                info!("tracing stopped, detaching from traced program");
                self.host.detach();
            }
            Some(WindowEffect::Closed) | None => {}
        }

        if let Some(ctx) = ctx {
            self.host.resume(&ctx);
        }
        Ok(())
    }

    /// Close the sink. The second and later calls are no-ops.
    ///
    /// # Errors
    /// Fails when the sink's finalization fails.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.sink.close().map_err(SessionError::Close)
    }

    /// Whether accesses are recorded right now.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.window.is_enabled()
    }

    #[must_use]
    pub const fn clock(&self) -> &LogicalClock {
        &self.clock
    }

    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Tear the session apart, handing back the sink.
    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn append(&mut self, event: &AccessEvent) -> Result<()> {
        if let Err(e) = self.sink.append(event) {
            error!(error = %e, "failed to append trace event");
            self.host.abort();
            return Err(SessionError::Append(e));
        }
        Ok(())
    }
}

/// Clonable handle sharing one [`Session`] across threads.
///
/// Hosts that observe several threads funnel their reports through clones
/// of one handle; the mutex puts all records into a single total order, so
/// timestamps stay non-decreasing no matter which thread reports.
pub struct SharedSession<S: TraceSink> {
    inner: Arc<Mutex<Session<S>>>,
}

impl<S: TraceSink> Clone for SharedSession<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: TraceSink> SharedSession<S> {
    #[must_use]
    pub fn new(session: Session<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// See [`Session::on_instruction`].
    ///
    /// # Errors
    /// Propagates the session's append failure.
    pub fn on_instruction(&self, pc: u64, tid: u16, operands: &[MemOperand]) -> Result<()> {
        self.inner.lock().on_instruction(pc, tid, operands)
    }

    /// See [`Session::on_control_event`].
    ///
    /// # Errors
    /// Propagates the session's close failure.
    pub fn on_control_event(
        &self,
        signal: ControlSignal,
        ctx: Option<ExecutionContext>,
    ) -> Result<()> {
        self.inner.lock().on_control_event(signal, ctx)
    }

    /// See [`Session::shutdown`].
    ///
    /// # Errors
    /// Propagates the sink's finalization failure.
    pub fn shutdown(&self) -> Result<()> {
        self.inner.lock().shutdown()
    }

    /// Recover the session once this is the last handle.
    ///
    /// # Errors
    /// Hands the handle back when other clones are still alive.
    pub fn try_into_inner(self) -> std::result::Result<Session<S>, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}
