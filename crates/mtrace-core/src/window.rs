//! Capture window state machine.

/// Control event delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Start,
    Stop,
}

/// What arms and disarms the capture window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Toggle on program-counter match.
    ///
    /// `begin: None` opens the window from the first instruction. The begin
    /// match is checked before the end match, so `begin == end` opens and
    /// closes the window on the same instruction. Matches keep toggling, so
    /// a trigger address inside a loop re-opens the window on every pass.
    AddressRange {
        begin: Option<u64>,
        end: Option<u64>,
        /// Stop for good on the first end match and shut the traced
        /// program down instead of letting it run on.
        detach_on_stop: bool,
    },
    /// Toggle on host-delivered control events. The first stop ends the
    /// recording for good.
    Control {
        /// On stop, terminate the traced program instead of detaching
        /// from it.
        early_exit: bool,
    },
}

/// Side effect the session must carry out after a window transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEffect {
    /// The window opened.
    Opened,
    /// The window closed; recording may start again later.
    Closed,
    /// The window closed for good; finalize the trace and terminate the
    /// traced program.
    Terminate,
    /// The window closed for good; finalize the trace and detach from the
    /// traced program, leaving it running.
    Detach,
}

/// Gate deciding which instructions are recorded.
#[derive(Debug, Clone)]
pub struct CaptureWindow {
    trigger: Trigger,
    enabled: bool,
    terminal: bool,
}

impl CaptureWindow {
    #[must_use]
    pub const fn new(trigger: Trigger) -> Self {
        let enabled = matches!(trigger, Trigger::AddressRange { begin: None, .. });
        Self {
            trigger,
            enabled,
            terminal: false,
        }
    }

    /// Whether accesses are recorded right now.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether recording has permanently ended.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Feed the program counter of the instruction about to execute.
    ///
    /// Transitions fire before the instruction's accesses are considered,
    /// so the begin instruction is recorded and the end instruction is not.
    pub fn on_address(&mut self, pc: u64) -> Option<WindowEffect> {
        if self.terminal {
            return None;
        }
        let Trigger::AddressRange {
            begin,
            end,
            detach_on_stop,
        } = self.trigger
        else {
            return None;
        };

        let mut effect = None;
        if begin == Some(pc) {
            self.enabled = true;
            effect = Some(WindowEffect::Opened);
        }
        if end == Some(pc) {
            self.enabled = false;
            effect = Some(if detach_on_stop {
                self.terminal = true;
                WindowEffect::Terminate
            } else {
                WindowEffect::Closed
            });
        }
        effect
    }

    /// Feed a host control event.
    pub fn on_control(&mut self, signal: ControlSignal) -> Option<WindowEffect> {
        if self.terminal {
            return None;
        }
        let Trigger::Control { early_exit } = self.trigger else {
            return None;
        };

        match signal {
            ControlSignal::Start => {
                self.enabled = true;
                Some(WindowEffect::Opened)
            }
            ControlSignal::Stop => {
                self.enabled = false;
                self.terminal = true;
                Some(if early_exit {
                    WindowEffect::Terminate
                } else {
                    WindowEffect::Detach
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn range(begin: Option<u64>, end: Option<u64>) -> Trigger {
        Trigger::AddressRange {
            begin,
            end,
            detach_on_stop: false,
        }
    }

    #[test]
    fn test_address_range_toggles() {
        let mut window = CaptureWindow::new(range(Some(0x1000), Some(0x2000)));
        assert!(!window.is_enabled());

        assert_eq!(window.on_address(0xfff), None);
        assert!(!window.is_enabled());

        assert_eq!(window.on_address(0x1000), Some(WindowEffect::Opened));
        assert!(window.is_enabled());

        assert_eq!(window.on_address(0x1004), None);
        assert!(window.is_enabled());

        assert_eq!(window.on_address(0x2000), Some(WindowEffect::Closed));
        assert!(!window.is_enabled());

        // A loop around the trigger re-opens the window.
        assert_eq!(window.on_address(0x1000), Some(WindowEffect::Opened));
        assert!(window.is_enabled());
    }

    #[test]
    fn test_unset_begin_captures_from_start() {
        let window = CaptureWindow::new(range(None, Some(0x2000)));
        assert!(window.is_enabled());

        let mut window = window;
        assert_eq!(window.on_address(0x2000), Some(WindowEffect::Closed));
        assert!(!window.is_enabled());
    }

    #[test]
    fn test_begin_equals_end_closes_same_instruction() {
        let mut window = CaptureWindow::new(range(Some(0x1000), Some(0x1000)));
        assert_eq!(window.on_address(0x1000), Some(WindowEffect::Closed));
        assert!(!window.is_enabled());
    }

    #[test]
    fn test_detach_on_stop_is_terminal() {
        let mut window = CaptureWindow::new(Trigger::AddressRange {
            begin: Some(0x1000),
            end: Some(0x2000),
            detach_on_stop: true,
        });
        assert_eq!(window.on_address(0x1000), Some(WindowEffect::Opened));
        assert_eq!(window.on_address(0x2000), Some(WindowEffect::Terminate));
        assert!(window.is_terminal());

        assert_eq!(window.on_address(0x1000), None);
        assert!(!window.is_enabled());
    }

    #[test]
    fn test_control_start_stop() {
        let mut window = CaptureWindow::new(Trigger::Control { early_exit: false });
        assert!(!window.is_enabled());

        assert_eq!(
            window.on_control(ControlSignal::Start),
            Some(WindowEffect::Opened)
        );
        assert!(window.is_enabled());

        assert_eq!(
            window.on_control(ControlSignal::Stop),
            Some(WindowEffect::Detach)
        );
        assert!(!window.is_enabled());
        assert!(window.is_terminal());

        assert_eq!(window.on_control(ControlSignal::Start), None);
        assert!(!window.is_enabled());
    }

    #[test]
    fn test_control_early_exit_terminates() {
        let mut window = CaptureWindow::new(Trigger::Control { early_exit: true });
        window.on_control(ControlSignal::Start);
        assert_eq!(
            window.on_control(ControlSignal::Stop),
            Some(WindowEffect::Terminate)
        );
        assert!(window.is_terminal());
    }

    #[test]
    fn test_triggers_ignore_the_other_source() {
        let mut window = CaptureWindow::new(Trigger::Control { early_exit: false });
        assert_eq!(window.on_address(0x1000), None);
        assert!(!window.is_enabled());

        let mut window = CaptureWindow::new(range(Some(0x1000), None));
        assert_eq!(window.on_control(ControlSignal::Stop), None);
        assert!(!window.is_terminal());
    }
}
