use core::fmt::Write;

use heapless::String;

use crate::{engine::CapturePhase, lines::TraceTable, store::SampleStore, TRACE_CAPACITY};

/// Widest report line: the column header, up to three digits plus `", "` per
/// column, with headroom for the label and terminator.
pub const REPORT_LINE_CAP: usize = 32 + TRACE_CAPACITY * 5;

pub type ReportLine = String<REPORT_LINE_CAP>;

/// Byte output channel for the report. No flow control is negotiated.
pub trait ReportSink {
    type Error;

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Copy of everything the report needs, taken under the capture lock so the
/// text can be produced with ticks running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureSnapshot {
    pub sample_period_us: u32,
    pub phase: CapturePhase,
    pub lines: TraceTable,
    pub store: SampleStore,
}

impl CaptureSnapshot {
    /// Header line, column index row, then one row per traced line.
    ///
    /// Slots past the cursor read as zero while a capture is in progress.
    pub fn report_lines(&self) -> ReportLines<'_> {
        ReportLines {
            snapshot: self,
            next: 0,
        }
    }

    pub fn write_report<S: ReportSink>(&self, sink: &mut S) -> Result<(), S::Error> {
        for line in self.report_lines() {
            sink.write_bytes(line.as_bytes())?;
        }
        Ok(())
    }

    /// Number of lines `report_lines` yields.
    pub fn report_line_count(&self) -> usize {
        2 + self.lines.len()
    }
}

pub struct ReportLines<'a> {
    snapshot: &'a CaptureSnapshot,
    next: usize,
}

impl Iterator for ReportLines<'_> {
    type Item = ReportLine;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next;
        if index >= self.snapshot.report_line_count() {
            return None;
        }
        self.next += 1;

        let mut line = ReportLine::new();
        // Capacity covers the widest line, so formatting cannot fail.
        let _ = match index {
            0 => write_period_header(&mut line, self.snapshot.sample_period_us),
            1 => write_column_header(&mut line),
            _ => {
                let bit = (index - 2) as u8;
                let pin = self.snapshot.lines.as_slice()[index - 2];
                write_trace_row(&mut line, pin, bit, &self.snapshot.store)
            }
        };
        Some(line)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.snapshot.report_line_count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

fn write_period_header(out: &mut ReportLine, period_us: u32) -> core::fmt::Result {
    write!(out, "Sample Period:, {}, microseconds\r\n", period_us)
}

fn write_column_header(out: &mut ReportLine) -> core::fmt::Result {
    out.write_str(", ")?;
    for slot in 0..TRACE_CAPACITY - 1 {
        write!(out, "{}, ", slot)?;
    }
    write!(out, "{}\r\n", TRACE_CAPACITY - 1)
}

fn write_trace_row(
    out: &mut ReportLine,
    pin: u8,
    bit: u8,
    store: &SampleStore,
) -> core::fmt::Result {
    write!(out, "Pin {}, ", pin)?;
    for slot in 0..TRACE_CAPACITY {
        out.write_char(if store.level(slot, bit) { '1' } else { '0' })?;
        out.write_str(if slot + 1 == TRACE_CAPACITY { "\r\n" } else { ", " })?;
    }
    Ok(())
}
