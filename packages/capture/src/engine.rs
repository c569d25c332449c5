use statig::{blocking::IntoStateMachineExt as _, prelude::*};

use crate::{
    error::{CaptureConfigError, PeriodChangeError},
    lines::{LineRange, LineReader, TraceTable, DEFAULT_LINE_RANGE},
    report::CaptureSnapshot,
    store::SampleStore,
    trigger::{Edge, TriggerMask},
};

#[cfg(test)]
mod tests;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapturePhase {
    WaitingForTrigger,
    Tracing,
    Done,
}

impl CapturePhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::WaitingForTrigger => "waiting",
            Self::Tracing => "tracing",
            Self::Done => "done",
        }
    }
}

/// What a single dispatch changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub triggered: bool,
    pub completed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureStatus {
    pub phase: CapturePhase,
    pub traces: usize,
    pub cursor: usize,
    pub trigger: TriggerMask,
    pub sample_period_us: u32,
}

#[derive(Clone, Copy, Debug)]
enum CaptureEvent {
    Arm,
    Sample(u8),
    Halt,
}

struct DispatchContext {
    trigger: TriggerMask,
    outcome: TickOutcome,
}

/// Sample/trigger/store state machine driven by [`CaptureEngine`].
///
/// Configuration is not stored here; it is handed in with every dispatch so
/// the machine only owns what the tick mutates.
pub struct CaptureEngine {
    machine: statig::blocking::StateMachine<CaptureHsm>,
    lines: TraceTable,
    line_range: LineRange,
    trigger: TriggerMask,
    sample_period_us: u32,
}

impl Default for CaptureEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureEngine {
    pub fn new() -> Self {
        Self::with_line_range(DEFAULT_LINE_RANGE)
    }

    pub fn with_line_range(line_range: LineRange) -> Self {
        Self {
            machine: CaptureHsm::new().state_machine(),
            lines: TraceTable::new(),
            line_range,
            trigger: TriggerMask::new(),
            sample_period_us: 0,
        }
    }

    /// Registers `line` at the next bit position and returns that position.
    /// Duplicates are accepted and get their own bit.
    pub fn add_trace(&mut self, line: u8) -> Result<u8, CaptureConfigError> {
        self.ensure_idle()?;
        if !self.line_range.contains(line) {
            log::debug!(
                "capture: trace rejected line={} range={}..={}",
                line,
                self.line_range.first(),
                self.line_range.last()
            );
            return Err(CaptureConfigError::LineOutOfRange);
        }
        let bit = self.lines.push(line).ok_or(CaptureConfigError::TableFull)?;
        log::debug!("capture: trace line={} bit={}", line, bit);
        Ok(bit)
    }

    /// Attaches `edge` to the first bit registered for `line`.
    pub fn add_trigger(&mut self, line: u8, edge: Edge) -> Result<u8, CaptureConfigError> {
        self.ensure_idle()?;
        let bit = self
            .lines
            .position(line)
            .ok_or(CaptureConfigError::LineNotTraced)?;
        self.trigger.arm(bit, edge);
        log::debug!(
            "capture: trigger line={} bit={} edge={}",
            line,
            bit,
            edge.label()
        );
        Ok(bit)
    }

    /// Same as [`Self::add_trigger`] with the edge given as a wire code.
    pub fn add_trigger_code(&mut self, line: u8, code: u8) -> Result<u8, CaptureConfigError> {
        let edge = Edge::from_code(code)?;
        self.add_trigger(line, edge)
    }

    /// Reported in the dump header only; the tick source owns the cadence.
    pub fn set_sample_period(&mut self, period_us: u32) {
        self.sample_period_us = period_us;
    }

    /// Hands `period_us` to the tick source through `apply` and records it only
    /// once `apply` succeeds. Idle only.
    pub fn change_sample_period<E>(
        &mut self,
        period_us: u32,
        apply: impl FnOnce(u32) -> Result<(), E>,
    ) -> Result<(), PeriodChangeError<E>> {
        self.ensure_idle().map_err(PeriodChangeError::Config)?;
        apply(period_us).map_err(PeriodChangeError::Apply)?;
        self.sample_period_us = period_us;
        Ok(())
    }

    pub fn sample_period_us(&self) -> u32 {
        self.sample_period_us
    }

    /// Forces `Done` and clears all configuration.
    pub fn reset(&mut self) {
        self.dispatch(CaptureEvent::Halt);
        self.sample_period_us = 0;
        self.lines.clear();
        self.trigger.clear();
    }

    /// Zeroes the store and waits for the trigger. Restarts a running capture.
    pub fn start(&mut self) {
        self.dispatch(CaptureEvent::Arm);
        log::debug!(
            "capture: armed traces={} free_run={}",
            self.lines.len(),
            self.trigger.is_free_run()
        );
    }

    /// Per-period entry point. Reads each traced line once unless idle.
    #[inline]
    pub fn tick<R: LineReader + ?Sized>(&mut self, reader: &mut R) -> TickOutcome {
        if self.is_done() {
            return TickOutcome::default();
        }
        let sample = self.lines.sample(reader);
        self.dispatch(CaptureEvent::Sample(sample))
    }

    pub fn phase(&self) -> CapturePhase {
        self.machine.inner().phase
    }

    pub fn is_active(&self) -> bool {
        self.phase() == CapturePhase::Tracing
    }

    pub fn is_done(&self) -> bool {
        self.phase() == CapturePhase::Done
    }

    pub fn traces(&self) -> &[u8] {
        self.lines.as_slice()
    }

    pub fn trigger(&self) -> TriggerMask {
        self.trigger
    }

    pub fn store(&self) -> &SampleStore {
        &self.machine.inner().store
    }

    pub fn status(&self) -> CaptureStatus {
        CaptureStatus {
            phase: self.phase(),
            traces: self.lines.len(),
            cursor: self.store().cursor(),
            trigger: self.trigger,
            sample_period_us: self.sample_period_us,
        }
    }

    pub fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot {
            sample_period_us: self.sample_period_us,
            phase: self.phase(),
            lines: self.lines.clone(),
            store: self.store().clone(),
        }
    }

    fn ensure_idle(&self) -> Result<(), CaptureConfigError> {
        if self.is_done() {
            Ok(())
        } else {
            Err(CaptureConfigError::CaptureBusy)
        }
    }

    fn dispatch(&mut self, event: CaptureEvent) -> TickOutcome {
        let mut context = DispatchContext {
            trigger: self.trigger,
            outcome: TickOutcome::default(),
        };
        self.machine.handle_with_context(&event, &mut context);
        context.outcome
    }
}

struct CaptureHsm {
    phase: CapturePhase,
    first_sample: bool,
    store: SampleStore,
}

impl CaptureHsm {
    fn new() -> Self {
        Self {
            phase: CapturePhase::Done,
            first_sample: false,
            store: SampleStore::new(),
        }
    }

    fn arm(&mut self) {
        self.store.rewind();
        self.first_sample = true;
        self.phase = CapturePhase::WaitingForTrigger;
    }

    fn halt(&mut self) {
        self.store.park();
        self.first_sample = false;
        self.phase = CapturePhase::Done;
    }
}

#[state_machine(initial = "State::done()")]
impl CaptureHsm {
    #[state(superstate = "session")]
    fn waiting_for_trigger(
        &mut self,
        context: &mut DispatchContext,
        event: &CaptureEvent,
    ) -> Outcome<State> {
        match event {
            CaptureEvent::Sample(sample) => {
                self.store.slide_window(*sample);
                // No previous sample exists on the first tick after arming.
                if self.first_sample {
                    self.first_sample = false;
                    return Handled;
                }
                let (prev, cur) = self.store.window();
                if context.trigger.matches(prev, cur) {
                    self.phase = CapturePhase::Tracing;
                    context.outcome.triggered = true;
                    return Transition(State::tracing());
                }
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "session")]
    fn tracing(&mut self, context: &mut DispatchContext, event: &CaptureEvent) -> Outcome<State> {
        match event {
            CaptureEvent::Sample(sample) => {
                if self.store.record(*sample) {
                    self.phase = CapturePhase::Done;
                    context.outcome.completed = true;
                    return Transition(State::done());
                }
                Handled
            }
            _ => Super,
        }
    }

    #[state]
    fn done(&mut self, context: &mut DispatchContext, event: &CaptureEvent) -> Outcome<State> {
        let _ = context;
        match event {
            CaptureEvent::Arm => {
                self.arm();
                Transition(State::waiting_for_trigger())
            }
            CaptureEvent::Halt => {
                self.halt();
                Handled
            }
            CaptureEvent::Sample(_) => Handled,
        }
    }

    #[superstate]
    fn session(&mut self, context: &mut DispatchContext, event: &CaptureEvent) -> Outcome<State> {
        let _ = context;
        match event {
            CaptureEvent::Arm => {
                self.arm();
                Transition(State::waiting_for_trigger())
            }
            CaptureEvent::Halt => {
                self.halt();
                Transition(State::done())
            }
            CaptureEvent::Sample(_) => Handled,
        }
    }
}
