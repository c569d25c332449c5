use heapless::Vec;

use crate::{
    engine::{CapturePhase, CaptureStatus},
    TRACE_CAPACITY,
};

/// A trigger plus a terminal milestone.
pub type SessionEvents = Vec<SessionEvent, 2>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Triggered,
    Completed,
    Aborted,
}

/// Turns polled [`CaptureStatus`] values into session milestones for the
/// task that started the capture.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionMonitor {
    armed: bool,
    triggered: bool,
}

impl SessionMonitor {
    pub const fn new() -> Self {
        Self {
            armed: false,
            triggered: false,
        }
    }

    /// Call right after starting a capture.
    pub fn arm(&mut self) {
        self.armed = true;
        self.triggered = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Reports at most one milestone per call. A trigger and a completion that
    /// both happen between two polls yield `Triggered` first.
    pub fn observe(&mut self, status: CaptureStatus) -> Option<SessionEvent> {
        if !self.armed {
            return None;
        }
        let filled = status.cursor >= TRACE_CAPACITY;
        let past_trigger = match status.phase {
            CapturePhase::WaitingForTrigger => false,
            CapturePhase::Tracing => true,
            CapturePhase::Done => filled,
        };
        if past_trigger && !self.triggered {
            self.triggered = true;
            return Some(SessionEvent::Triggered);
        }
        if status.phase != CapturePhase::Done {
            return None;
        }

        self.armed = false;
        if filled {
            Some(SessionEvent::Completed)
        } else {
            Some(SessionEvent::Aborted)
        }
    }

    /// Every milestone `status` still implies, oldest first. Must run before a
    /// `reset`, which parks the cursor and would turn a finished capture into
    /// an abort.
    pub fn settle(&mut self, status: CaptureStatus) -> SessionEvents {
        let mut events = SessionEvents::new();
        while let Some(event) = self.observe(status) {
            if events.push(event).is_err() {
                break;
            }
        }
        events
    }
}
