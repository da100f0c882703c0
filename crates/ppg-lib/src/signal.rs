use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Sampling rate and recording length for one batch of samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingContext {
    /// Uniform sampling frequency in Hz
    fs: f64,
    /// Recording window length in seconds
    duration_s: f64,
}

impl SamplingContext {
    pub fn new(fs: f64, duration_s: f64) -> Result<Self, ConfigError> {
        if !fs.is_finite() || fs <= 0.0 {
            return Err(ConfigError::InvalidSamplingRate(fs));
        }
        if !duration_s.is_finite() || duration_s <= 0.0 {
            return Err(ConfigError::InvalidDuration(duration_s));
        }
        Ok(Self { fs, duration_s })
    }

    /// Context whose duration is exactly what `len` samples cover at `fs`.
    pub fn for_samples(fs: f64, len: usize) -> Result<Self, ConfigError> {
        if !fs.is_finite() || fs <= 0.0 {
            return Err(ConfigError::InvalidSamplingRate(fs));
        }
        Self::new(fs, len as f64 / fs)
    }

    pub fn fs(&self) -> f64 {
        self.fs
    }

    pub fn duration_s(&self) -> f64 {
        self.duration_s
    }

    /// Largest number of samples a window of this context can hold.
    pub fn capacity(&self) -> usize {
        (self.fs * self.duration_s).ceil() as usize
    }

    /// Refractory distance in samples: `ceil(seconds * fs)`.
    pub fn refractory_samples(&self, seconds: f64) -> usize {
        refractory_samples(seconds, self.fs)
    }
}

pub(crate) fn refractory_samples(seconds: f64, fs: f64) -> usize {
    (seconds * fs).ceil().max(0.0) as usize
}

/// Basic typed time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Point events on a timeline (valley or peak indices).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Events {
    pub indices: Vec<usize>,
}

impl Events {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }
    pub fn len(&self) -> usize {
        self.indices.len()
    }
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// One candidate cardiac cycle, the inclusive sample range `[start, end]`
/// between two consecutive valleys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

#[allow(clippy::len_without_is_empty)]
impl Segment {
    /// Number of samples covered, both endpoints included.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn range(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// Physiologically plausible RR interval bounds in milliseconds, inclusive.
pub const RR_MIN_MS: u32 = 300;
pub const RR_MAX_MS: u32 = 1500;

/// RR intervals (milliseconds)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<u32>,
}

impl RRSeries {
    /// Converts consecutive event distances to milliseconds, keeping only
    /// intervals inside `[RR_MIN_MS, RR_MAX_MS]`. A pair that runs backwards
    /// is skipped.
    pub fn from_events(events: &Events, fs: f64) -> Self {
        let mut rr = Vec::new();
        for w in events.indices.windows(2) {
            let Some(gap) = w[1].checked_sub(w[0]) else {
                continue;
            };
            let dt = (gap as f64 * 1000.0 / fs).floor();
            if dt >= RR_MIN_MS as f64 && dt <= RR_MAX_MS as f64 {
                rr.push(dt as u32);
            }
        }
        Self { rr }
    }

    /// Keeps externally measured intervals that fall inside the valid range.
    pub fn from_ms(values: impl IntoIterator<Item = u32>) -> Self {
        let rr = values
            .into_iter()
            .filter(|v| (RR_MIN_MS..=RR_MAX_MS).contains(v))
            .collect();
        Self { rr }
    }

    pub fn len(&self) -> usize {
        self.rr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rr.is_empty()
    }

    pub(crate) fn as_f64(&self) -> impl Iterator<Item = f64> + '_ {
        self.rr.iter().map(|&v| v as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsorted_events_skip_backward_pairs() {
        let events = Events::from_indices(vec![100, 80, 120]);
        let rr = RRSeries::from_events(&events, 100.0);
        assert_eq!(rr.rr, vec![400]);
    }

    #[test]
    fn from_ms_discards_out_of_range_values() {
        let rr = RRSeries::from_ms([299, 300, 812, 1500, 1501, 0]);
        assert_eq!(rr.rr, vec![300, 812, 1500]);
    }

    #[test]
    fn sampling_context_rejects_non_positive_values() {
        assert!(matches!(
            SamplingContext::new(0.0, 60.0),
            Err(ConfigError::InvalidSamplingRate(_))
        ));
        assert!(matches!(
            SamplingContext::new(25.0, -1.0),
            Err(ConfigError::InvalidDuration(_))
        ));
        assert!(SamplingContext::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn capacity_and_refractory_round_up() {
        let ctx = SamplingContext::new(25.0, 30.0).unwrap();
        assert_eq!(ctx.capacity(), 750);
        assert_eq!(ctx.refractory_samples(0.4), 10);
        assert_eq!(ctx.refractory_samples(0.41), 11);
    }

    #[test]
    fn rr_from_events_discards_out_of_range() {
        // 50 samples = 250 ms, 100 = 500 ms, 400 = 2000 ms at 200 Hz
        let events = Events::from_indices(vec![0, 50, 150, 550]);
        let rr = RRSeries::from_events(&events, 200.0);
        assert_eq!(rr.rr, vec![500]);
    }

    #[test]
    fn segment_len_includes_both_ends() {
        let seg = Segment { start: 3, end: 7 };
        assert_eq!(seg.len(), 5);
        assert_eq!(seg.range().count(), 5);
    }
}
