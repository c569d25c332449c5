use crate::{TRACE_CAPACITY, TRIGGER_WINDOW};

/// Bit-packed sample buffer. Slots `0` and `1` hold the previous/current
/// trigger window; the capture is written from [`TRIGGER_WINDOW`] upward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleStore {
    slots: [u8; TRACE_CAPACITY],
    cursor: usize,
}

impl Default for SampleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleStore {
    pub const fn new() -> Self {
        Self {
            slots: [0; TRACE_CAPACITY],
            cursor: 0,
        }
    }

    /// Zeroes every slot and points the cursor past the trigger window.
    pub fn rewind(&mut self) {
        self.slots.fill(0);
        self.cursor = TRIGGER_WINDOW;
    }

    /// Drops the cursor without touching sample data.
    pub fn park(&mut self) {
        self.cursor = 0;
    }

    #[inline]
    pub fn slide_window(&mut self, sample: u8) {
        self.slots[0] = self.slots[1];
        self.slots[1] = sample;
    }

    #[inline]
    pub fn window(&self) -> (u8, u8) {
        (self.slots[0], self.slots[1])
    }

    /// Writes `sample` at the cursor. Returns `true` once the store is full.
    #[inline]
    pub fn record(&mut self, sample: u8) -> bool {
        let Some(slot) = self.slots.get_mut(self.cursor) else {
            return true;
        };
        *slot = sample;
        self.cursor += 1;
        self.cursor >= TRACE_CAPACITY
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_full(&self) -> bool {
        self.cursor >= TRACE_CAPACITY
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.slots
    }

    /// Post-trigger samples written so far.
    pub fn captured(&self) -> &[u8] {
        let end = self.cursor.clamp(TRIGGER_WINDOW, TRACE_CAPACITY);
        &self.slots[TRIGGER_WINDOW..end]
    }

    pub fn level(&self, slot: usize, bit: u8) -> bool {
        self.slots
            .get(slot)
            .is_some_and(|sample| sample & (1 << bit) != 0)
    }
}
