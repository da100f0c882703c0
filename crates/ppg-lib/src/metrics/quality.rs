use crate::signal::RRSeries;

/// Spread of the RR intervals (population standard deviation, ms), used as a
/// rough signal-quality gate: a clean recording has a steady rhythm.
///
/// `None` when fewer than two intervals are available. Computed independently
/// of [`crate::metrics::hrv::hrv_metrics`].
pub fn rr_consistency(rr: &RRSeries) -> Option<f64> {
    if rr.len() < 2 {
        return None;
    }
    let n = rr.len() as f64;
    let mean = rr.as_f64().sum::<f64>() / n;
    let var = rr.as_f64().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Some(var.sqrt())
}
