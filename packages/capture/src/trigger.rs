use core::str::FromStr;

use crate::error::CaptureConfigError;

/// Per-line trigger condition over two consecutive samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
    High,
    Low,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Rising, Edge::Falling, Edge::High, Edge::Low];

    /// Required (previous, current) levels.
    pub const fn expectations(self) -> (bool, bool) {
        match self {
            Self::Rising => (false, true),
            Self::Falling => (true, false),
            Self::High => (true, true),
            Self::Low => (false, false),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::High => "high",
            Self::Low => "low",
        }
    }

    /// Wire codes follow [`Self::ALL`]: `0` rising, `1` falling, `2` high, `3` low.
    pub fn from_code(code: u8) -> Result<Self, CaptureConfigError> {
        match code {
            0 => Ok(Self::Rising),
            1 => Ok(Self::Falling),
            2 => Ok(Self::High),
            3 => Ok(Self::Low),
            _ => Err(CaptureConfigError::UnknownEdge),
        }
    }

    /// Case-insensitive ASCII name lookup.
    pub fn parse(token: &[u8]) -> Result<Self, CaptureConfigError> {
        Self::ALL
            .into_iter()
            .find(|edge| token.eq_ignore_ascii_case(edge.label().as_bytes()))
            .ok_or(CaptureConfigError::UnknownEdge)
    }
}

impl FromStr for Edge {
    type Err = CaptureConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.trim().as_bytes())
    }
}

/// Three-byte trigger comparator. A bit is only set in the expectation bytes
/// when it is also set in `enabled`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TriggerMask {
    enabled: u8,
    expected_prev: u8,
    expected_cur: u8,
}

impl TriggerMask {
    pub const fn new() -> Self {
        Self {
            enabled: 0,
            expected_prev: 0,
            expected_cur: 0,
        }
    }

    pub const fn enabled(&self) -> u8 {
        self.enabled
    }

    pub const fn expected_prev(&self) -> u8 {
        self.expected_prev
    }

    pub const fn expected_cur(&self) -> u8 {
        self.expected_cur
    }

    /// No lines participate; the comparator matches any sample pair.
    pub const fn is_free_run(&self) -> bool {
        self.enabled == 0
    }

    /// Enables `bit` and replaces its expectations with `edge`.
    pub fn arm(&mut self, bit: u8, edge: Edge) {
        let mask = 1u8 << bit;
        let (prev, cur) = edge.expectations();
        self.enabled |= mask;
        self.expected_prev = with_bit(self.expected_prev, mask, prev);
        self.expected_cur = with_bit(self.expected_cur, mask, cur);
    }

    #[inline]
    pub fn matches(&self, prev: u8, cur: u8) -> bool {
        self.expected_prev == self.enabled & prev && self.expected_cur == self.enabled & cur
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

fn with_bit(value: u8, mask: u8, set: bool) -> u8 {
    if set {
        value | mask
    } else {
        value & !mask
    }
}
