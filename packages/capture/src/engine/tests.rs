use super::*;
use crate::{MAX_TRACES, TRACE_CAPACITY, TRIGGER_WINDOW};

/// Fake header: bit `n` of `levels` is the level of line `n`.
#[derive(Default)]
struct FakeLines {
    levels: u16,
    reads: usize,
}

impl FakeLines {
    fn set(&mut self, line: u8, high: bool) {
        if high {
            self.levels |= 1 << line;
        } else {
            self.levels &= !(1 << line);
        }
    }
}

impl LineReader for FakeLines {
    fn is_high(&mut self, line: u8) -> bool {
        self.reads += 1;
        self.levels & (1 << line) != 0
    }
}

fn tick_with(engine: &mut CaptureEngine, lines: &mut FakeLines, line: u8, high: bool) -> TickOutcome {
    lines.set(line, high);
    engine.tick(lines)
}

fn run_until_done(engine: &mut CaptureEngine, lines: &mut FakeLines) -> usize {
    let mut ticks = 0;
    while !engine.is_done() {
        engine.tick(lines);
        ticks += 1;
        assert!(ticks <= TRACE_CAPACITY * 2, "capture never completed");
    }
    ticks
}

#[test]
fn fresh_engine_is_idle_with_empty_configuration() {
    let engine = CaptureEngine::new();
    assert!(engine.is_done());
    assert!(!engine.is_active());
    assert!(engine.traces().is_empty());
    assert_eq!(engine.trigger(), TriggerMask::new());
    assert_eq!(engine.sample_period_us(), 0);
}

#[test]
fn add_trace_rejects_lines_outside_board_range() {
    let mut engine = CaptureEngine::new();
    for line in [14u8, 20, 127, 255] {
        assert_eq!(
            engine.add_trace(line),
            Err(CaptureConfigError::LineOutOfRange)
        );
        assert!(engine.traces().is_empty());
    }

    let mut narrow = CaptureEngine::with_line_range(LineRange::new(4, 6));
    assert_eq!(narrow.add_trace(3), Err(CaptureConfigError::LineOutOfRange));
    assert_eq!(narrow.add_trace(6), Ok(0));
}

#[test]
fn ninth_trace_fails_regardless_of_validity() {
    let mut engine = CaptureEngine::new();
    for line in 0..MAX_TRACES as u8 {
        assert_eq!(engine.add_trace(line), Ok(line));
    }
    assert_eq!(engine.add_trace(9), Err(CaptureConfigError::TableFull));
    assert_eq!(engine.add_trace(99), Err(CaptureConfigError::LineOutOfRange));
    assert_eq!(engine.traces().len(), MAX_TRACES);
}

#[test]
fn trigger_on_untraced_line_leaves_mask_untouched() {
    let mut engine = CaptureEngine::new();
    engine.add_trace(3).unwrap();
    engine.add_trigger(3, Edge::High).unwrap();
    let before = engine.trigger();

    assert_eq!(
        engine.add_trigger(5, Edge::Rising),
        Err(CaptureConfigError::LineNotTraced)
    );
    assert_eq!(engine.trigger(), before);
}

#[test]
fn unknown_edge_code_leaves_mask_untouched() {
    let mut engine = CaptureEngine::new();
    engine.add_trace(2).unwrap();
    engine.add_trigger(2, Edge::Falling).unwrap();
    let before = engine.trigger();

    assert_eq!(
        engine.add_trigger_code(2, 9),
        Err(CaptureConfigError::UnknownEdge)
    );
    assert_eq!(engine.trigger(), before);
    assert_eq!(engine.add_trigger_code(2, 3), Ok(0));
}

#[test]
fn trigger_targets_first_duplicate() {
    let mut engine = CaptureEngine::new();
    engine.add_trace(1).unwrap();
    engine.add_trace(4).unwrap();
    engine.add_trace(4).unwrap();
    assert_eq!(engine.add_trigger(4, Edge::Rising), Ok(1));
    assert_eq!(engine.trigger().enabled(), 0b010);
}

#[test]
fn rising_edge_fires_on_low_to_high() {
    let mut engine = CaptureEngine::new();
    engine.add_trace(7).unwrap();
    engine.add_trigger(7, Edge::Rising).unwrap();
    engine.start();
    let mut lines = FakeLines::default();

    tick_with(&mut engine, &mut lines, 7, false);
    assert_eq!(engine.phase(), CapturePhase::WaitingForTrigger);
    tick_with(&mut engine, &mut lines, 7, false);
    assert_eq!(engine.phase(), CapturePhase::WaitingForTrigger);
    let outcome = tick_with(&mut engine, &mut lines, 7, true);
    assert!(outcome.triggered);
    assert_eq!(engine.phase(), CapturePhase::Tracing);
    assert!(engine.is_active());
}

#[test]
fn first_tick_after_start_never_evaluates_trigger() {
    let mut engine = CaptureEngine::new();
    engine.add_trace(0).unwrap();
    engine.add_trigger(0, Edge::Rising).unwrap();
    engine.start();
    let mut lines = FakeLines::default();

    // Zeroed slot 0 followed by a high read would look like a rising edge.
    tick_with(&mut engine, &mut lines, 0, true);
    assert_eq!(engine.phase(), CapturePhase::WaitingForTrigger);
    tick_with(&mut engine, &mut lines, 0, true);
    assert_eq!(engine.phase(), CapturePhase::WaitingForTrigger);
}

#[test]
fn free_run_starts_tracing_on_second_tick() {
    let mut engine = CaptureEngine::new();
    engine.add_trace(2).unwrap();
    engine.start();
    let mut lines = FakeLines::default();

    assert!(!engine.tick(&mut lines).triggered);
    assert_eq!(engine.phase(), CapturePhase::WaitingForTrigger);
    assert!(engine.tick(&mut lines).triggered);
    assert_eq!(engine.phase(), CapturePhase::Tracing);
}

#[test]
fn multi_line_trigger_requires_every_condition() {
    let mut engine = CaptureEngine::new();
    engine.add_trace(0).unwrap();
    engine.add_trace(1).unwrap();
    engine.add_trigger(0, Edge::Falling).unwrap();
    engine.add_trigger(1, Edge::High).unwrap();
    engine.start();
    let mut lines = FakeLines::default();

    lines.set(0, true);
    engine.tick(&mut lines);
    // Falling edge on line 0 while line 1 is low.
    lines.set(0, false);
    engine.tick(&mut lines);
    assert_eq!(engine.phase(), CapturePhase::WaitingForTrigger);

    lines.set(0, true);
    lines.set(1, true);
    engine.tick(&mut lines);
    assert_eq!(engine.phase(), CapturePhase::WaitingForTrigger);
    lines.set(0, false);
    engine.tick(&mut lines);
    assert_eq!(engine.phase(), CapturePhase::Tracing);
}

#[test]
fn capture_completes_after_capacity_minus_window_ticks() {
    let mut engine = CaptureEngine::new();
    engine.add_trace(5).unwrap();
    engine.start();
    let mut lines = FakeLines::default();
    engine.tick(&mut lines);
    engine.tick(&mut lines);
    assert!(engine.is_active());

    let tracing_ticks = TRACE_CAPACITY - TRIGGER_WINDOW;
    for n in 0..tracing_ticks {
        assert!(engine.is_active(), "left tracing early at tick {n}");
        let high = n % 3 == 0;
        let outcome = tick_with(&mut engine, &mut lines, 5, high);
        assert_eq!(outcome.completed, n + 1 == tracing_ticks);
    }
    assert!(engine.is_done());
    assert_eq!(engine.store().cursor(), TRACE_CAPACITY);

    let frozen = engine.store().clone();
    let reads = lines.reads;
    for _ in 0..10 {
        let outcome = tick_with(&mut engine, &mut lines, 5, true);
        assert_eq!(outcome, TickOutcome::default());
    }
    assert_eq!(engine.store(), &frozen);
    assert_eq!(lines.reads, reads);

    let captured = engine.store().captured();
    assert_eq!(captured.len(), tracing_ticks);
    assert!(captured
        .iter()
        .enumerate()
        .all(|(n, &sample)| sample == u8::from(n % 3 == 0)));
}

#[test]
fn idle_ticks_read_no_lines() {
    let mut engine = CaptureEngine::new();
    engine.add_trace(0).unwrap();
    let mut lines = FakeLines::default();
    engine.tick(&mut lines);
    assert_eq!(lines.reads, 0);
}

#[test]
fn reset_mid_capture_idles_and_clears_configuration() {
    let mut engine = CaptureEngine::new();
    engine.set_sample_period(250);
    engine.add_trace(1).unwrap();
    engine.add_trace(2).unwrap();
    engine.add_trigger(2, Edge::Low).unwrap();
    engine.start();
    let mut lines = FakeLines::default();
    engine.tick(&mut lines);
    engine.tick(&mut lines);
    engine.tick(&mut lines);
    assert!(engine.is_active());

    engine.reset();
    assert!(engine.is_done());
    assert!(engine.traces().is_empty());
    assert_eq!(engine.trigger(), TriggerMask::new());
    assert_eq!(engine.sample_period_us(), 0);
    assert_eq!(engine.store().cursor(), 0);

    assert_eq!(engine.add_trace(13), Ok(0));
}

#[test]
fn reset_while_idle_is_harmless() {
    let mut engine = CaptureEngine::new();
    engine.reset();
    engine.reset();
    assert!(engine.is_done());
    assert_eq!(engine.add_trace(0), Ok(0));
}

#[test]
fn configuration_is_frozen_while_capturing() {
    let mut engine = CaptureEngine::new();
    engine.add_trace(3).unwrap();
    engine.start();

    assert_eq!(engine.add_trace(4), Err(CaptureConfigError::CaptureBusy));
    assert_eq!(
        engine.add_trigger(3, Edge::High),
        Err(CaptureConfigError::CaptureBusy)
    );
    assert_eq!(engine.traces(), &[3]);
    assert_eq!(engine.trigger(), TriggerMask::new());
}

#[test]
fn start_during_capture_rewinds_the_store() {
    let mut engine = CaptureEngine::new();
    engine.add_trace(0).unwrap();
    engine.start();
    let mut lines = FakeLines::default();
    lines.set(0, true);
    for _ in 0..6 {
        engine.tick(&mut lines);
    }
    assert!(engine.store().cursor() > TRIGGER_WINDOW);

    engine.start();
    assert_eq!(engine.phase(), CapturePhase::WaitingForTrigger);
    assert_eq!(engine.store().cursor(), TRIGGER_WINDOW);
    assert!(engine.store().as_slice().iter().all(|&slot| slot == 0));
}

#[test]
fn restart_after_completion_captures_again() {
    let mut engine = CaptureEngine::new();
    engine.add_trace(0).unwrap();
    let mut lines = FakeLines::default();
    engine.start();
    let first = run_until_done(&mut engine, &mut lines);
    engine.start();
    let second = run_until_done(&mut engine, &mut lines);
    assert_eq!(first, TRACE_CAPACITY);
    assert_eq!(second, first);
}

#[test]
fn duplicate_lines_capture_identical_bits() {
    let mut engine = CaptureEngine::new();
    engine.add_trace(6).unwrap();
    engine.add_trace(6).unwrap();
    engine.start();
    let mut lines = FakeLines::default();
    let mut high = false;
    while !engine.is_done() {
        high = !high;
        tick_with(&mut engine, &mut lines, 6, high);
    }
    for &sample in engine.store().captured() {
        assert!(sample == 0b00 || sample == 0b11, "sample {sample:#04b}");
    }
}

#[test]
fn status_reflects_progress() {
    let mut engine = CaptureEngine::new();
    engine.set_sample_period(100);
    engine.add_trace(8).unwrap();
    engine.add_trigger(8, Edge::High).unwrap();
    engine.start();
    let status = engine.status();
    assert_eq!(status.phase, CapturePhase::WaitingForTrigger);
    assert_eq!(status.traces, 1);
    assert_eq!(status.cursor, TRIGGER_WINDOW);
    assert_eq!(status.trigger.enabled(), 1);
    assert_eq!(status.sample_period_us, 100);
}

#[test]
fn period_is_kept_when_the_tick_source_refuses_it() {
    let mut engine = CaptureEngine::new();
    engine.set_sample_period(100);

    let mut offered = None;
    let result = engine.change_sample_period(250, |period_us| {
        offered = Some(period_us);
        Err("timer_start")
    });
    assert_eq!(result, Err(PeriodChangeError::Apply("timer_start")));
    assert_eq!(offered, Some(250));
    assert_eq!(engine.sample_period_us(), 100);

    assert_eq!(engine.change_sample_period(250, |_| Ok::<(), ()>(())), Ok(()));
    assert_eq!(engine.sample_period_us(), 250);
}

#[test]
fn period_change_while_capturing_never_reaches_the_tick_source() {
    let mut engine = CaptureEngine::new();
    engine.set_sample_period(100);
    engine.start();

    let mut called = false;
    let result = engine.change_sample_period(50, |_| {
        called = true;
        Ok::<(), ()>(())
    });
    assert_eq!(
        result,
        Err(PeriodChangeError::Config(CaptureConfigError::CaptureBusy))
    );
    assert!(!called);
    assert_eq!(engine.sample_period_us(), 100);
}
