//! End-to-end PPG → HRV processing of one recording window.
//!
//! bandpass → edge trim → smoothing → valleys → segments → statistical noise
//! elimination → peaks → RR intervals → HR / SDNN / RMSSD.
//!
//! Configuration problems are rejected before any stage runs. Everything that
//! depends on the data itself (too few beats, every cycle rejected as noise)
//! ends in a report whose [`Outcome`] says which metrics are missing and why.

use crate::detectors::{peak_detection, valley_detection};
use crate::error::{ConfigError, Insufficient};
use crate::filters::{bandpass_filter, moving_average_filter, remove_zero, trim_edges};
use crate::metrics::hrv::{hrv_metrics, rr_intervals, HrvMetrics};
use crate::metrics::quality::rr_consistency;
use crate::noise::eliminate_noise;
use crate::segments::{adaptive_thresholds, pair_valleys, segment_statistics, NoiseBias};
use crate::signal::{Events, RRSeries, SamplingContext, TimeSeries};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for [`run_pipeline`]. Every field has a default, so a TOML file
/// only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Drop zero readings (lost skin contact) before filtering.
    pub drop_zero_samples: bool,
    /// Samples discarded at each end after the bandpass filter.
    pub edge_trim: usize,
    /// Moving-average window in samples.
    pub smoothing_window: usize,
    /// Minimum valley spacing in seconds.
    pub valley_min_distance_s: f64,
    /// Run the segment statistics screen. When off, peaks are searched on the
    /// smoothed signal directly.
    pub noise_elimination: bool,
    pub noise_bias: NoiseBias,
    /// Peaks must reach `mean * peak_threshold_factor`.
    pub peak_threshold_factor: f64,
    /// Minimum peak spacing in seconds.
    pub peak_min_distance_s: f64,
    /// Samples at the start of the cleaned signal left out of the peak
    /// search. Reported peak indices still count from the cleaned start.
    pub peak_skip: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            drop_zero_samples: false,
            edge_trim: 25,
            smoothing_window: 6,
            valley_min_distance_s: 0.4,
            noise_elimination: true,
            noise_bias: NoiseBias::default(),
            peak_threshold_factor: 0.9,
            peak_min_distance_s: 0.4,
            peak_skip: 0,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.smoothing_window == 0 {
            return Err(ConfigError::InvalidWindow);
        }
        if !self.peak_threshold_factor.is_finite() {
            return Err(ConfigError::InvalidThresholdFactor(
                self.peak_threshold_factor,
            ));
        }
        for (which, value) in [
            ("valleys", self.valley_min_distance_s),
            ("peaks", self.peak_min_distance_s),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidMinDistance { which, value });
            }
        }
        self.noise_bias.validate()
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: PipelineConfig = toml::from_str(text).context("parsing pipeline config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }
}

/// Which metrics a recording produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Heart rate, SDNN and RMSSD are all available.
    Complete { metrics: HrvMetrics },
    /// Heart rate and SDNN are available, RMSSD is not.
    Partial {
        metrics: HrvMetrics,
        missing: Insufficient,
    },
    Unavailable { reason: Insufficient },
}

impl Outcome {
    pub fn metrics(&self) -> Option<&HrvMetrics> {
        match self {
            Outcome::Complete { metrics } | Outcome::Partial { metrics, .. } => Some(metrics),
            Outcome::Unavailable { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<Insufficient> {
        match self {
            Outcome::Complete { .. } => None,
            Outcome::Partial { missing, .. } => Some(*missing),
            Outcome::Unavailable { reason } => Some(*reason),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Outcome::Complete { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Complete { .. } => "complete",
            Outcome::Partial { .. } => "partial",
            Outcome::Unavailable { .. } => "unavailable",
        }
    }
}

impl From<Result<HrvMetrics, Insufficient>> for Outcome {
    fn from(result: Result<HrvMetrics, Insufficient>) -> Self {
        match result {
            Ok(metrics) => match metrics.rmssd() {
                Ok(_) => Outcome::Complete { metrics },
                Err(missing) => Outcome::Partial { metrics, missing },
            },
            Err(reason) => Outcome::Unavailable { reason },
        }
    }
}

/// Summary of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub fs: f64,
    /// Raw samples handed in.
    pub sample_count: usize,
    /// Samples left after zero removal and edge trimming.
    pub processed_count: usize,
    pub valleys: Events,
    pub segments_total: usize,
    pub segments_kept: usize,
    /// Length of the signal peaks were searched on.
    pub cleaned_count: usize,
    /// Peak indices into the cleaned signal.
    pub peaks: Events,
    pub rr: RRSeries,
    pub outcome: Outcome,
    /// Population standard deviation of `rr`, when at least two intervals exist.
    pub rr_consistency: Option<f64>,
}

/// Report plus the signal the peaks were detected on.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub report: PipelineReport,
    pub cleaned: TimeSeries,
}

/// A validated configuration bound to a sampling context.
#[derive(Debug, Clone)]
pub struct Pipeline {
    ctx: SamplingContext,
    cfg: PipelineConfig,
}

impl Pipeline {
    pub fn new(ctx: SamplingContext, cfg: PipelineConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { ctx, cfg })
    }

    pub fn context(&self) -> &SamplingContext {
        &self.ctx
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Zero removal (if enabled), bandpass, edge trim and smoothing.
    pub fn preprocess(&self, samples: &[u32]) -> Result<TimeSeries, ConfigError> {
        let filtered = if self.cfg.drop_zero_samples {
            let kept = remove_zero(samples);
            debug!("dropped {} zero samples", samples.len() - kept.len());
            bandpass_filter(&kept)
        } else {
            bandpass_filter(samples)
        };
        let trimmed = trim_edges(&filtered, self.cfg.edge_trim);
        let data = moving_average_filter(trimmed, self.cfg.smoothing_window)?;
        Ok(TimeSeries {
            fs: self.ctx.fs(),
            data,
        })
    }

    pub fn run(&self, samples: &[u32]) -> Result<PipelineReport, ConfigError> {
        self.run_with_signal(samples).map(|run| run.report)
    }

    pub fn run_with_signal(&self, samples: &[u32]) -> Result<PipelineRun, ConfigError> {
        let capacity = self.ctx.capacity();
        if samples.len() > capacity {
            return Err(ConfigError::BufferTooLong {
                len: samples.len(),
                capacity,
            });
        }
        let fs = self.ctx.fs();
        let smoothed = self.preprocess(samples)?;
        let valleys = valley_detection(&smoothed.data, fs, self.cfg.valley_min_distance_s);
        let segments = pair_valleys(&valleys);

        let mut report = PipelineReport {
            fs,
            sample_count: samples.len(),
            processed_count: smoothed.len(),
            valleys,
            segments_total: segments.len(),
            segments_kept: 0,
            cleaned_count: 0,
            peaks: Events::default(),
            rr: RRSeries::default(),
            outcome: Outcome::Unavailable {
                reason: Insufficient::NoRrIntervals,
            },
            rr_consistency: None,
        };

        let cleaned = if self.cfg.noise_elimination {
            if report.valleys.len() < 2 {
                let found = report.valleys.len();
                return Ok(unavailable(
                    report,
                    smoothed,
                    Insufficient::TooFewValleys { found },
                ));
            }
            let stats = segment_statistics(&smoothed.data, &segments);
            let thresholds = match adaptive_thresholds(&stats, &self.cfg.noise_bias) {
                Ok(t) => t,
                Err(reason) => return Ok(unavailable(report, smoothed, reason)),
            };
            let cleaned = eliminate_noise(&smoothed.data, &segments, &stats, &thresholds);
            report.segments_kept = cleaned.kept.len();
            if cleaned.is_empty() {
                return Ok(unavailable(
                    report,
                    smoothed,
                    Insufficient::NoSegmentsSurvived,
                ));
            }
            TimeSeries {
                fs,
                data: cleaned.data,
            }
        } else {
            report.segments_kept = segments.len();
            smoothed
        };
        report.cleaned_count = cleaned.len();

        let skip = self.cfg.peak_skip.min(cleaned.len());
        let mut peaks = peak_detection(
            &cleaned.data[skip..],
            fs,
            self.cfg.peak_threshold_factor,
            self.cfg.peak_min_distance_s,
        );
        peaks.indices.iter_mut().for_each(|i| *i += skip);
        if peaks.len() < 2 {
            let found = peaks.len();
            report.peaks = peaks;
            return Ok(unavailable(
                report,
                cleaned,
                Insufficient::TooFewPeaks { found },
            ));
        }

        let rr = rr_intervals(&peaks, fs);
        report.outcome = Outcome::from(hrv_metrics(&rr));
        report.rr_consistency = rr_consistency(&rr);
        report.peaks = peaks;
        report.rr = rr;

        match report.outcome.metrics() {
            Some(m) => info!(
                "pipeline: {} peaks, {} RR intervals, HR {:.1} bpm, SDNN {:.1} ms, RMSSD {}",
                report.peaks.len(),
                m.n,
                m.heart_rate_bpm,
                m.sdnn_ms,
                m.rmssd_ms
                    .map(|v| format!("{v:.1} ms"))
                    .unwrap_or_else(|| "unavailable".into())
            ),
            None => warn!(
                "pipeline: {} peaks but no usable RR interval",
                report.peaks.len()
            ),
        }
        Ok(PipelineRun { report, cleaned })
    }
}

fn unavailable(mut report: PipelineReport, signal: TimeSeries, reason: Insufficient) -> PipelineRun {
    warn!("pipeline stopped early: {}", reason);
    report.outcome = Outcome::Unavailable { reason };
    PipelineRun {
        report,
        cleaned: signal,
    }
}

/// Validate, then run the whole pipeline over one recording window.
pub fn run_pipeline(
    samples: &[u32],
    ctx: &SamplingContext,
    cfg: &PipelineConfig,
) -> Result<PipelineReport, ConfigError> {
    Pipeline::new(*ctx, cfg.clone())?.run(samples)
}
