//! Logical clock.

use mtrace_usf::TimeBase;

/// Monotonic logical clock, ticked by the session.
///
/// With [`TimeBase::Accesses`] every stamped access gets a fresh tick, so
/// timestamps are unique across the trace. With [`TimeBase::Instructions`]
/// the clock ticks once per capture-eligible instruction and every operand
/// of that instruction shares the tick; an instruction with no memory
/// operands still advances time.
#[derive(Debug, Clone)]
pub struct LogicalClock {
    time_base: TimeBase,
    now: u64,
}

impl LogicalClock {
    #[must_use]
    pub const fn new(time_base: TimeBase) -> Self {
        Self { time_base, now: 0 }
    }

    /// Advance for one capture-eligible instruction.
    pub const fn begin_instruction(&mut self) {
        if matches!(self.time_base, TimeBase::Instructions) {
            self.now += 1;
        }
    }

    /// Timestamp for the next access.
    pub const fn stamp(&mut self) -> u64 {
        match self.time_base {
            TimeBase::Accesses => {
                let t = self.now;
                self.now += 1;
                t
            }
            TimeBase::Instructions => self.now,
        }
    }

    #[must_use]
    pub const fn now(&self) -> u64 {
        self.now
    }

    #[must_use]
    pub const fn time_base(&self) -> TimeBase {
        self.time_base
    }
}
