//! Host control surface.

/// Saved execution state a host needs to resume the traced program after a
/// control event has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Program counter to resume at.
    pub pc: u64,
}

/// Host-side effects the session can request.
///
/// The host is whatever drives execution: an emulator, a binary
/// instrumentation engine, a replay reader. `terminate` and `abort` must be
/// implemented; the rest default to no-ops.
pub trait HostControl: Send {
    /// Called when a control-triggered window opens: commit any
    /// instrumentation the host queued while tracing was disabled.
    fn flush_pending(&mut self) {}

    /// Stop observing the traced program but leave it running.
    fn detach(&mut self) {}

    /// Hand control back to the traced program after a control event.
    fn resume(&mut self, _ctx: &ExecutionContext) {}

    /// End the traced program with `code`. The trace is already finalized
    /// when this is called.
    fn terminate(&mut self, code: i32);

    /// Kill the recording immediately. The trace is not finalized; a
    /// truncated file must stay truncated.
    fn abort(&mut self);
}

/// Host that ignores every request; useful for replay and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl HostControl for NoopHost {
    fn terminate(&mut self, _code: i32) {}

    fn abort(&mut self) {}
}
