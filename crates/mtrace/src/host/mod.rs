//! Script-driven host.
//!
//! Replays an instruction event script through a recording session, standing
//! in for a live instrumentation engine. The script format is line-based:
//!
//! ```text
//! # comment
//! tid 1
//! 0x1000 r:0x8000:8 w:0x8010:4
//! !start
//! !stop ctx=0x1040
//! ```
//!
//! A `tid` directive sets the thread id for the lines after it. Control
//! lines only matter to sessions armed with a control trigger.

mod script;

pub use script::{ScriptError, ScriptEvent, parse_reader, parse_script};

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use mtrace_core::{HostControl, Result, Session, TraceSink};

/// Counters from one script replay.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunStats {
    /// Instructions fed to the session.
    pub instructions: u64,
    /// Control events fed to the session.
    pub control_events: u64,
}

/// Replays a parsed event script into a session.
pub struct ScriptHost {
    events: Vec<ScriptEvent>,
    detached: Arc<AtomicBool>,
}

impl ScriptHost {
    /// Load and parse the script at `path`.
    ///
    /// # Errors
    /// Fails when the file cannot be read or a line does not parse.
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, ScriptError> {
        Ok(Self::from_events(parse_script(path)?))
    }

    #[must_use]
    pub fn from_events(events: Vec<ScriptEvent>) -> Self {
        Self {
            events,
            detached: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Controller half to hand to the session.
    #[must_use]
    pub fn controller(&self) -> ProcessControl {
        ProcessControl {
            detached: Arc::clone(&self.detached),
        }
    }

    /// Feed every script event into `session`, then shut it down.
    ///
    /// Stops early once the session has detached this host.
    ///
    /// # Errors
    /// Propagates the session's append and close failures.
    pub fn run<S: TraceSink>(&self, session: &mut Session<S>) -> Result<RunStats> {
        let mut stats = RunStats::default();
        for event in &self.events {
            if self.detached.load(Ordering::SeqCst) {
                debug!("host detached, replay stops");
                break;
            }
            match event {
                ScriptEvent::Instruction { pc, tid, operands } => {
                    stats.instructions += 1;
                    session.on_instruction(*pc, *tid, operands)?;
                }
                ScriptEvent::Control { signal, ctx } => {
                    stats.control_events += 1;
                    session.on_control_event(*signal, *ctx)?;
                }
            }
        }
        session.shutdown()?;
        Ok(stats)
    }
}

/// Process-level control backing a script replay.
///
/// `terminate` and `abort` end the recorder process itself, the same way an
/// in-process instrumentation host would go down with its target.
pub struct ProcessControl {
    detached: Arc<AtomicBool>,
}

impl HostControl for ProcessControl {
    fn detach(&mut self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    fn terminate(&mut self, code: i32) {
        std::process::exit(code);
    }

    fn abort(&mut self) {
        std::process::abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mtrace_core::{
        CaptureWindow, ControlSignal, LogicalClock, MemOperand, MemorySink, TimeBase, Trigger,
    };

    fn open_session(host: &ScriptHost) -> Session<MemorySink> {
        Session::new(
            CaptureWindow::new(Trigger::AddressRange {
                begin: None,
                end: None,
                detach_on_stop: false,
            }),
            LogicalClock::new(TimeBase::Accesses),
            MemorySink::new(),
            Box::new(host.controller()),
        )
    }

    #[test]
    fn test_run_replays_script_and_closes_sink() {
        let host = ScriptHost::from_events(vec![
            ScriptEvent::Instruction {
                pc: 0x1000,
                tid: 0,
                operands: vec![MemOperand::read(0x8000, 8)],
            },
            ScriptEvent::Instruction {
                pc: 0x1004,
                tid: 0,
                operands: vec![MemOperand::read(0x8008, 8), MemOperand::write(0x8010, 4)],
            },
        ]);
        let mut session = open_session(&host);

        let stats = host.run(&mut session).unwrap();
        assert_eq!(stats.instructions, 2);
        assert_eq!(stats.control_events, 0);
        assert_eq!(session.sink().events().len(), 3);
        assert_eq!(session.sink().close_count(), 1);
    }

    #[test]
    fn test_detach_stops_replay_but_still_finalizes() {
        let host = ScriptHost::from_events(vec![
            ScriptEvent::Control {
                signal: ControlSignal::Start,
                ctx: None,
            },
            ScriptEvent::Instruction {
                pc: 0x1000,
                tid: 0,
                operands: vec![MemOperand::read(0x8000, 8)],
            },
            ScriptEvent::Control {
                signal: ControlSignal::Stop,
                ctx: None,
            },
            ScriptEvent::Instruction {
                pc: 0x1004,
                tid: 0,
                operands: vec![MemOperand::read(0x8008, 8)],
            },
        ]);
        let mut session = Session::new(
            CaptureWindow::new(Trigger::Control { early_exit: false }),
            LogicalClock::new(TimeBase::Accesses),
            MemorySink::new(),
            Box::new(host.controller()),
        );

        let stats = host.run(&mut session).unwrap();
        // The stop detaches the host, so the trailing instruction is never
        // replayed.
        assert_eq!(stats.instructions, 1);
        assert_eq!(stats.control_events, 2);
        assert_eq!(session.sink().events().len(), 1);
        assert_eq!(session.sink().close_count(), 1);
    }
}
