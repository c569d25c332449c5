//! Fixed-memory logic capture engine.
//!
//! A periodic tick samples up to [`MAX_TRACES`] digital lines into one byte,
//! waits for a two-sample trigger, then records [`TRACE_CAPACITY`] -
//! [`TRIGGER_WINDOW`] post-trigger samples. The trigger is a conjunction: every
//! enabled line must match its previous/current expectation in the same pair of
//! consecutive samples. OR/NOT combinations and patterns longer than two
//! samples cannot be expressed.

#![no_std]

pub mod command;
pub mod engine;
pub mod error;
pub mod lines;
pub mod monitor;
pub mod report;
pub mod shared;
pub mod store;
pub mod trigger;

pub use engine::{CaptureEngine, CapturePhase, CaptureStatus, TickOutcome};
pub use error::{CaptureConfigError, PeriodChangeError};
pub use lines::{LineRange, LineReader, TraceTable, DEFAULT_LINE_RANGE};
pub use report::{CaptureSnapshot, ReportSink};
pub use shared::SharedCapture;
pub use store::SampleStore;
pub use trigger::{Edge, TriggerMask};

/// Traced lines are packed into one byte per sample.
pub const MAX_TRACES: usize = 8;
/// Sample store length, trigger window included.
pub const TRACE_CAPACITY: usize = 500;
/// Leading store slots used as the rolling previous/current trigger window.
pub const TRIGGER_WINDOW: usize = 2;
