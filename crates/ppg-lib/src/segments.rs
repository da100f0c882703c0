//! Cardiac-cycle segmentation and the per-segment shape statistics used to
//! reject noisy cycles.

use crate::error::{ConfigError, Insufficient};
use crate::signal::{Events, Segment};
use log::debug;
use serde::{Deserialize, Serialize};

/// Pairs each valley with the next one: `N` valleys give `N - 1` segments.
pub fn pair_valleys(valleys: &Events) -> Vec<Segment> {
    valleys
        .indices
        .windows(2)
        .map(|w| Segment {
            start: w[0],
            end: w[1],
        })
        .collect()
}

/// Shape statistics of one segment.
///
/// A segment whose samples are all equal (a single sample included) or that
/// reaches outside the buffer has no defined skewness or kurtosis. It is
/// reported with every statistic at zero and `degenerate` set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentStats {
    pub std_dev: f64,
    /// Excess kurtosis (normal distribution = 0).
    pub kurtosis: f64,
    pub skewness: f64,
    pub degenerate: bool,
}

impl SegmentStats {
    const DEGENERATE: Self = Self {
        std_dev: 0.0,
        kurtosis: 0.0,
        skewness: 0.0,
        degenerate: true,
    };
}

pub fn segment_statistics(data: &[f64], segments: &[Segment]) -> Vec<SegmentStats> {
    segments
        .iter()
        .map(|seg| match data.get(seg.range()) {
            Some(window) => window_statistics(window),
            None => SegmentStats::DEGENERATE,
        })
        .collect()
}

fn window_statistics(window: &[f64]) -> SegmentStats {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let m2 = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    if m2 == 0.0 || !m2.is_finite() {
        return SegmentStats::DEGENERATE;
    }
    let m3 = window.iter().map(|x| (x - mean).powi(3)).sum::<f64>() / n;
    let m4 = window.iter().map(|x| (x - mean).powi(4)).sum::<f64>() / n;
    let std_dev = m2.sqrt();
    SegmentStats {
        std_dev,
        kurtosis: m4 / (m2 * m2) - 3.0,
        skewness: m3 / std_dev.powi(3),
        degenerate: false,
    }
}

/// Caller-tuned offsets applied to the across-segment means.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoiseBias {
    /// Added to the mean standard deviation, in filtered sensor counts.
    pub std: f64,
    /// Added to the mean kurtosis.
    pub kurtosis: f64,
    /// Subtracted from the mean skewness for the lower bound.
    pub skew_low: f64,
    /// Added to the mean skewness for the upper bound.
    pub skew_high: f64,
}

impl NoiseBias {
    pub fn new(std: f64, kurtosis: f64, skew_low: f64, skew_high: f64) -> Self {
        Self {
            std,
            kurtosis,
            skew_low,
            skew_high,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("std", self.std),
            ("kurtosis", self.kurtosis),
            ("skew_low", self.skew_low),
            ("skew_high", self.skew_high),
        ];
        for (which, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::InvalidBias { which, value });
            }
        }
        Ok(())
    }
}

/// Clean pulses spread their segment std by a few counts around the mean, so
/// the std offset sits well above that while a motion burst still clears it.
impl Default for NoiseBias {
    fn default() -> Self {
        Self::new(50.0, 1.0, 1.0, 1.0)
    }
}

impl From<[f64; 4]> for NoiseBias {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// Acceptance window for a segment's statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub std_upper: f64,
    pub kurtosis_upper: f64,
    pub skew_lower: f64,
    pub skew_upper: f64,
}

impl ThresholdSet {
    /// Strict comparison on every bound; degenerate segments never pass.
    pub fn accepts(&self, stats: &SegmentStats) -> bool {
        !stats.degenerate
            && stats.std_dev < self.std_upper
            && stats.kurtosis < self.kurtosis_upper
            && stats.skewness > self.skew_lower
            && stats.skewness < self.skew_upper
    }
}

/// Thresholds from the population mean of each statistic across all segments.
pub fn adaptive_thresholds(
    stats: &[SegmentStats],
    bias: &NoiseBias,
) -> Result<ThresholdSet, Insufficient> {
    if stats.is_empty() {
        return Err(Insufficient::NoSegments);
    }
    let n = stats.len() as f64;
    let mean_std = stats.iter().map(|s| s.std_dev).sum::<f64>() / n;
    let mean_kurt = stats.iter().map(|s| s.kurtosis).sum::<f64>() / n;
    let mean_skew = stats.iter().map(|s| s.skewness).sum::<f64>() / n;
    let thresholds = ThresholdSet {
        std_upper: mean_std + bias.std,
        kurtosis_upper: mean_kurt + bias.kurtosis,
        skew_lower: mean_skew - bias.skew_low,
        skew_upper: mean_skew + bias.skew_high,
    };
    debug!("adaptive thresholds over {} segments: {:?}", stats.len(), thresholds);
    Ok(thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn pairs_consecutive_valleys() {
        let valleys = Events::from_indices(vec![3, 10, 18, 30]);
        let segments = pair_valleys(&valleys);
        assert_eq!(
            segments,
            vec![
                Segment { start: 3, end: 10 },
                Segment { start: 10, end: 18 },
                Segment { start: 18, end: 30 },
            ]
        );
    }

    #[test]
    fn pair_count_is_n_minus_one_or_zero() {
        for n in 0..6usize {
            let valleys = Events::from_indices((0..n).map(|i| i * 10).collect());
            assert_eq!(pair_valleys(&valleys).len(), n.saturating_sub(1));
        }
    }

    #[test]
    fn statistics_match_closed_form() {
        // [1, 2, 3, 4]: mean 2.5, var 1.25, symmetric, m4 = 2.5625
        let data = [0.0, 1.0, 2.0, 3.0, 4.0, 0.0];
        let stats = segment_statistics(&data, &[Segment { start: 1, end: 4 }]);
        assert_eq!(stats.len(), 1);
        let s = stats[0];
        assert!(!s.degenerate);
        assert_close(s.std_dev, 1.25f64.sqrt(), 1e-12);
        assert_close(s.skewness, 0.0, 1e-12);
        assert_close(s.kurtosis, 2.5625 / (1.25 * 1.25) - 3.0, 1e-12);
    }

    #[test]
    fn skewness_sign_follows_tail() {
        let data = [0.0, 0.0, 0.0, 0.0, 10.0];
        let stats = segment_statistics(&data, &[Segment { start: 0, end: 4 }]);
        assert!(stats[0].skewness > 0.0);
    }

    #[test]
    fn flat_and_single_sample_segments_are_degenerate() {
        let data = [2.0, 2.0, 2.0, 5.0];
        let stats = segment_statistics(
            &data,
            &[Segment { start: 0, end: 2 }, Segment { start: 3, end: 3 }],
        );
        for s in stats {
            assert!(s.degenerate);
            assert_eq!(s.std_dev, 0.0);
            assert_eq!(s.kurtosis, 0.0);
            assert_eq!(s.skewness, 0.0);
        }
    }

    #[test]
    fn out_of_range_segment_is_degenerate() {
        let stats = segment_statistics(&[1.0, 2.0], &[Segment { start: 0, end: 5 }]);
        assert!(stats[0].degenerate);
    }

    #[test]
    fn thresholds_are_offset_means() {
        let stats = [
            SegmentStats {
                std_dev: 1.0,
                kurtosis: -1.0,
                skewness: 0.5,
                degenerate: false,
            },
            SegmentStats {
                std_dev: 3.0,
                kurtosis: 1.0,
                skewness: -0.5,
                degenerate: false,
            },
        ];
        let th = adaptive_thresholds(&stats, &NoiseBias::new(0.5, 0.25, 1.0, 2.0)).unwrap();
        assert_close(th.std_upper, 2.5, 1e-12);
        assert_close(th.kurtosis_upper, 0.25, 1e-12);
        assert_close(th.skew_lower, -1.0, 1e-12);
        assert_close(th.skew_upper, 2.0, 1e-12);
    }

    #[test]
    fn thresholds_need_segments() {
        assert_eq!(
            adaptive_thresholds(&[], &NoiseBias::default()),
            Err(Insufficient::NoSegments)
        );
    }

    #[test]
    fn acceptance_bounds_are_strict() {
        let th = ThresholdSet {
            std_upper: 2.0,
            kurtosis_upper: 1.0,
            skew_lower: -1.0,
            skew_upper: 1.0,
        };
        let mut s = SegmentStats {
            std_dev: 1.0,
            kurtosis: 0.0,
            skewness: 0.0,
            degenerate: false,
        };
        assert!(th.accepts(&s));
        s.std_dev = 2.0;
        assert!(!th.accepts(&s));
        s.std_dev = 1.0;
        s.skewness = -1.0;
        assert!(!th.accepts(&s));
        s.skewness = 0.0;
        s.degenerate = true;
        assert!(!th.accepts(&s));
    }

    #[test]
    fn bias_rejects_non_finite_values() {
        let bias = NoiseBias::new(1.0, f64::NAN, 1.0, 1.0);
        assert!(matches!(
            bias.validate(),
            Err(ConfigError::InvalidBias {
                which: "kurtosis",
                ..
            })
        ));
    }
}
