use super::{enforce_refractory, mean};
use crate::signal::{refractory_samples, Events};
use log::debug;

/// Locate diastolic valleys: the lowest sample of every run that dips to or
/// below the signal mean.
///
/// A run is closed when the signal climbs back above the mean; a run still
/// open when the signal ends is not reported. Valleys closer than
/// `ceil(min_distance_s * fs)` samples to the previously accepted valley are
/// dropped.
pub fn valley_detection(data: &[f64], fs: f64, min_distance_s: f64) -> Events {
    if data.is_empty() {
        return Events::default();
    }
    let threshold = mean(data);
    let mut candidates = Vec::new();
    let mut run_min: Option<usize> = None;
    for (i, &x) in data.iter().enumerate() {
        if x <= threshold {
            run_min = match run_min {
                Some(m) if data[m] <= x => Some(m),
                _ => Some(i),
            };
        } else if let Some(m) = run_min.take() {
            candidates.push(m);
        }
    }

    let min_gap = refractory_samples(min_distance_s, fs);
    let valleys = enforce_refractory(&candidates, min_gap);
    debug!(
        "valley detection: {} candidates, {} accepted (min gap {} samples)",
        candidates.len(),
        valleys.len(),
        min_gap
    );
    Events::from_indices(valleys)
}
