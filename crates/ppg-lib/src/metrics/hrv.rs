use crate::error::Insufficient;
use crate::signal::{Events, RRSeries};
use serde::{Deserialize, Serialize};

/// Time-domain HRV summary.
///
/// Heart rate and SDNN exist as soon as one RR interval does; RMSSD needs two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrvMetrics {
    /// Number of RR intervals the metrics were computed from.
    pub n: usize,
    pub heart_rate_bpm: f64,
    pub sdnn_ms: f64,
    pub rmssd_ms: Option<f64>,
}

impl HrvMetrics {
    pub fn rmssd(&self) -> Result<f64, Insufficient> {
        self.rmssd_ms.ok_or(Insufficient::SingleRrInterval)
    }

    /// All three metrics are available.
    pub fn is_complete(&self) -> bool {
        self.rmssd_ms.is_some()
    }
}

/// RR intervals in milliseconds between consecutive peaks, limited to the
/// physiological 300–1500 ms range.
pub fn rr_intervals(peaks: &Events, fs: f64) -> RRSeries {
    RRSeries::from_events(peaks, fs)
}

pub fn hrv_metrics(rr: &RRSeries) -> Result<HrvMetrics, Insufficient> {
    let n = rr.len();
    if n == 0 {
        return Err(Insufficient::NoRrIntervals);
    }
    let mean = rr.as_f64().sum::<f64>() / n as f64;
    let heart_rate_bpm = 60_000.0 / mean;
    let sdnn_ms = (rr.as_f64().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64).sqrt();
    let rmssd_ms = if n > 1 {
        let diffs = rr.rr.windows(2).map(|w| (w[1] as f64 - w[0] as f64).powi(2));
        Some((diffs.sum::<f64>() / (n as f64 - 1.0)).sqrt())
    } else {
        None
    };
    Ok(HrvMetrics {
        n,
        heart_rate_bpm,
        sdnn_ms,
        rmssd_ms,
    })
}
