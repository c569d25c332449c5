#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureConfigError {
    LineOutOfRange,
    TableFull,
    LineNotTraced,
    UnknownEdge,
    CaptureBusy,
}

impl CaptureConfigError {
    pub fn label(self) -> &'static str {
        match self {
            Self::LineOutOfRange => "line_out_of_range",
            Self::TableFull => "table_full",
            Self::LineNotTraced => "line_not_traced",
            Self::UnknownEdge => "unknown_edge",
            Self::CaptureBusy => "capture_busy",
        }
    }
}

impl core::fmt::Display for CaptureConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Why [`crate::CaptureEngine::change_sample_period`] left the period alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodChangeError<E> {
    Config(CaptureConfigError),
    Apply(E),
}
