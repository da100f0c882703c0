use super::{enforce_refractory, mean};
use crate::signal::{refractory_samples, Events};
use log::debug;

/// Adaptive-threshold systolic peak picker.
///
/// A sample is a candidate when it is a strict local maximum and reaches
/// `mean * threshold_factor`. Candidates are accepted left to right, skipping
/// any within `ceil(min_distance_s * fs)` samples of the last accepted peak.
/// With the usual 0.4 s distance this caps detection at about 150 bpm.
pub fn peak_detection(data: &[f64], fs: f64, threshold_factor: f64, min_distance_s: f64) -> Events {
    if data.len() < 3 {
        return Events::default();
    }
    let threshold = mean(data) * threshold_factor;
    let candidates: Vec<usize> = (1..data.len() - 1)
        .filter(|&i| data[i] >= threshold && data[i] > data[i - 1] && data[i] > data[i + 1])
        .collect();

    let min_gap = refractory_samples(min_distance_s, fs);
    let peaks = enforce_refractory(&candidates, min_gap);
    debug!(
        "peak detection: threshold {:.3}, {} candidates, {} accepted",
        threshold,
        candidates.len(),
        peaks.len()
    );
    Events::from_indices(peaks)
}
