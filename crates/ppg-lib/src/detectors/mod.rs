pub mod peak;
pub mod valley;

pub use peak::peak_detection;
pub use valley::valley_detection;

pub(crate) fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

/// Keeps candidates that lie more than `min_gap` samples after the last
/// accepted one. Candidates must be sorted.
pub(crate) fn enforce_refractory(candidates: &[usize], min_gap: usize) -> Vec<usize> {
    let mut accepted: Vec<usize> = Vec::with_capacity(candidates.len());
    for &idx in candidates {
        match accepted.last() {
            Some(&last) if idx - last <= min_gap => {}
            _ => accepted.push(idx),
        }
    }
    accepted
}
