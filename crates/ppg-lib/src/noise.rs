use crate::segments::{SegmentStats, ThresholdSet};
use crate::signal::Segment;
use log::debug;
use serde::{Deserialize, Serialize};

/// Samples of the segments that passed the statistical screen, concatenated
/// in their original order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanedSignal {
    pub data: Vec<f64>,
    /// Positions (into the segment list) of the kept segments.
    pub kept: Vec<usize>,
    /// Positions of the rejected segments.
    pub rejected: Vec<usize>,
}

impl CleanedSignal {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Drop every segment whose statistics fall outside `thresholds` and join the
/// rest. Each kept segment contributes its full inclusive range, so two
/// adjacent kept segments both carry their shared valley sample.
///
/// `segments` and `stats` are matched by position; a segment without
/// statistics is rejected.
pub fn eliminate_noise(
    data: &[f64],
    segments: &[Segment],
    stats: &[SegmentStats],
    thresholds: &ThresholdSet,
) -> CleanedSignal {
    let mut cleaned = CleanedSignal::default();
    for (pos, seg) in segments.iter().enumerate() {
        let accepted = stats.get(pos).is_some_and(|s| thresholds.accepts(s));
        match data.get(seg.range()) {
            Some(window) if accepted => {
                cleaned.data.extend_from_slice(window);
                cleaned.kept.push(pos);
            }
            _ => cleaned.rejected.push(pos),
        }
    }
    debug!(
        "noise elimination kept {}/{} segments ({} samples)",
        cleaned.kept.len(),
        segments.len(),
        cleaned.data.len()
    );
    cleaned
}
