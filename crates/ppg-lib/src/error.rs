use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid pipeline configuration. Reported before any stage runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("sampling rate must be a positive number of Hz, got {0}")]
    InvalidSamplingRate(f64),
    #[error("recording duration must be a positive number of seconds, got {0}")]
    InvalidDuration(f64),
    #[error("moving-average window must hold at least one sample")]
    InvalidWindow,
    #[error("peak threshold factor must be finite, got {0}")]
    InvalidThresholdFactor(f64),
    #[error("minimum distance for {which} must be finite and non-negative, got {value}")]
    InvalidMinDistance { which: &'static str, value: f64 },
    #[error("noise bias `{which}` must be finite, got {value}")]
    InvalidBias { which: &'static str, value: f64 },
    #[error("buffer holds {len} samples but the recording window fits at most {capacity}")]
    BufferTooLong { len: usize, capacity: usize },
}

/// Why a recording produced no (or only partial) metrics.
///
/// These are expected outcomes for short or noisy recordings, not failures of
/// the pipeline itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insufficient {
    #[error("found {found} valleys, at least 2 are needed to delimit a cardiac cycle")]
    TooFewValleys { found: usize },
    #[error("no segments to derive thresholds from")]
    NoSegments,
    #[error("every segment was rejected as noise")]
    NoSegmentsSurvived,
    #[error("found {found} peaks, at least 2 are needed for an RR interval")]
    TooFewPeaks { found: usize },
    #[error("no RR interval inside the physiological range")]
    NoRrIntervals,
    #[error("RMSSD needs at least 2 RR intervals, only 1 is available")]
    SingleRrInterval,
}

impl Insufficient {
    /// Stable snake_case tag, matching the serialized `kind`.
    pub fn code(&self) -> &'static str {
        match self {
            Insufficient::TooFewValleys { .. } => "too_few_valleys",
            Insufficient::NoSegments => "no_segments",
            Insufficient::NoSegmentsSurvived => "no_segments_survived",
            Insufficient::TooFewPeaks { .. } => "too_few_peaks",
            Insufficient::NoRrIntervals => "no_rr_intervals",
            Insufficient::SingleRrInterval => "single_rr_interval",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_matches_serialized_kind() {
        for reason in [
            Insufficient::TooFewValleys { found: 1 },
            Insufficient::NoSegments,
            Insufficient::NoSegmentsSurvived,
            Insufficient::TooFewPeaks { found: 0 },
            Insufficient::NoRrIntervals,
            Insufficient::SingleRrInterval,
        ] {
            let json = serde_json::to_value(reason).unwrap();
            assert_eq!(json["kind"], reason.code());
        }
    }
}
