use heapless::Vec;

use crate::MAX_TRACES;

/// Line ids accepted by a stock 14-pin digital header.
pub const DEFAULT_LINE_RANGE: LineRange = LineRange::new(0, 13);

/// Inclusive range of line ids the board can sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineRange {
    first: u8,
    last: u8,
}

impl LineRange {
    pub const fn new(first: u8, last: u8) -> Self {
        Self { first, last }
    }

    pub const fn first(self) -> u8 {
        self.first
    }

    pub const fn last(self) -> u8 {
        self.last
    }

    pub const fn contains(self, line: u8) -> bool {
        line >= self.first && line <= self.last
    }
}

/// Instantaneous level read of a single line.
///
/// Called from the tick interrupt once per traced line, so implementations
/// must not block.
pub trait LineReader {
    fn is_high(&mut self, line: u8) -> bool;
}

/// Ordered traced lines; the insertion index is the bit position in every
/// packed sample. The same line may appear more than once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceTable {
    lines: Vec<u8, MAX_TRACES>,
}

impl TraceTable {
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Appends `line` and returns its bit position, or `None` when full.
    pub fn push(&mut self, line: u8) -> Option<u8> {
        let bit = self.lines.len() as u8;
        self.lines.push(line).ok()?;
        Some(bit)
    }

    /// First bit position registered for `line`.
    pub fn position(&self, line: u8) -> Option<u8> {
        self.lines
            .iter()
            .position(|&traced| traced == line)
            .map(|idx| idx as u8)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.lines.is_full()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.lines
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Reads every traced line once and packs bit `i` from line `i`.
    #[inline]
    pub fn sample<R: LineReader + ?Sized>(&self, reader: &mut R) -> u8 {
        let mut packed = 0u8;
        for (bit, &line) in self.lines.iter().enumerate() {
            if reader.is_high(line) {
                packed |= 1 << bit;
            }
        }
        packed
    }
}
