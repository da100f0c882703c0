//! Synthetic PPG recordings for tests and demos.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Parameters of a synthetic optical recording: a systolic pulse plus a
/// smaller dicrotic wave per beat, riding on a constant sensor baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticPpg {
    pub fs: f64,
    pub duration_s: f64,
    pub heart_rate_bpm: f64,
    /// Uniform beat-to-beat jitter, +/- milliseconds.
    pub rr_jitter_ms: f64,
    pub baseline: f64,
    pub amplitude: f64,
    /// Uniform additive noise, +/- sensor counts.
    pub noise: f64,
    pub seed: u64,
}

impl Default for SyntheticPpg {
    fn default() -> Self {
        Self {
            fs: 25.0,
            duration_s: 60.0,
            heart_rate_bpm: 72.0,
            rr_jitter_ms: 0.0,
            baseline: 50_000.0,
            amplitude: 1_000.0,
            noise: 0.0,
            seed: 7,
        }
    }
}

impl SyntheticPpg {
    /// Beat onsets in seconds, covering the recording plus one second.
    pub fn beat_times(&self, rng: &mut StdRng) -> Vec<f64> {
        let base = 60.0 / self.heart_rate_bpm.max(1.0);
        let mut beats = Vec::new();
        let mut t = 0.3;
        while t < self.duration_s + 1.0 {
            beats.push(t);
            let jitter = if self.rr_jitter_ms > 0.0 {
                rng.gen_range(-self.rr_jitter_ms..=self.rr_jitter_ms) / 1000.0
            } else {
                0.0
            };
            t += (base + jitter).max(0.05);
        }
        beats
    }

    pub fn generate(&self) -> Vec<u32> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let beats = self.beat_times(&mut rng);
        let n = (self.fs * self.duration_s).ceil() as usize;
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let time = i as f64 / self.fs;
            let mut v = 0.0;
            for &bt in &beats {
                let d = time - bt;
                if d > -1.0 && d < 1.5 {
                    v += (-0.5 * (d / 0.09).powi(2)).exp()
                        + 0.35 * (-0.5 * ((d - 0.32) / 0.1).powi(2)).exp();
                }
            }
            let mut x = self.baseline + self.amplitude * v;
            if self.noise > 0.0 {
                x += rng.gen_range(-self.noise..=self.noise);
            }
            out.push(x.round().max(0.0) as u32);
        }
        out
    }
}
