use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

use crate::{
    engine::{CaptureEngine, CaptureStatus, TickOutcome},
    lines::LineReader,
    report::CaptureSnapshot,
};

/// Engine slot shared between the tick interrupt and task context.
///
/// Every access runs inside one critical section, so a tick never observes a
/// half-applied `start` or `reset`. The engine is installed at boot because
/// the state machine cannot be built in a `static` initializer.
pub struct SharedCapture {
    engine: Mutex<CriticalSectionRawMutex, RefCell<Option<CaptureEngine>>>,
}

impl Default for SharedCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedCapture {
    pub const fn new() -> Self {
        Self {
            engine: Mutex::new(RefCell::new(None)),
        }
    }

    /// Replaces any installed engine.
    pub fn install(&self, engine: CaptureEngine) {
        self.engine.lock(|slot| {
            slot.borrow_mut().replace(engine);
        });
    }

    /// Runs `f` on the engine inside the critical section. `None` before
    /// [`Self::install`].
    pub fn with<T>(&self, f: impl FnOnce(&mut CaptureEngine) -> T) -> Option<T> {
        self.engine
            .lock(|slot| slot.borrow_mut().as_mut().map(f))
    }

    /// Interrupt entry point.
    #[inline]
    pub fn on_tick<R: LineReader + ?Sized>(&self, reader: &mut R) -> TickOutcome {
        self.with(|engine| engine.tick(reader)).unwrap_or_default()
    }

    pub fn start(&self) -> bool {
        self.with(CaptureEngine::start).is_some()
    }

    pub fn reset(&self) -> bool {
        self.with(CaptureEngine::reset).is_some()
    }

    pub fn status(&self) -> Option<CaptureStatus> {
        self.with(|engine| engine.status())
    }

    pub fn snapshot(&self) -> Option<CaptureSnapshot> {
        self.with(|engine| engine.snapshot())
    }
}
