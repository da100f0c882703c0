//! Photoplethysmography (PPG) to heart-rate-variability processing.
//!
//! Raw optical sensor counts go through a fixed chain of batch stages:
//! bandpass and smoothing ([`filters`]), valley detection and cycle
//! segmentation ([`detectors`], [`segments`]), statistical noise elimination
//! ([`noise`]), peak detection, and finally RR intervals and time-domain HRV
//! ([`metrics`]). [`pipeline`] wires the stages together.

pub mod detectors;
pub mod error;
pub mod filters;
pub mod io;
pub mod metrics;
pub mod noise;
pub mod pipeline;
pub mod plot;
pub mod segments;
pub mod signal;
pub mod synthetic;
pub mod window;

pub use detectors::*;
pub use error::{ConfigError, Insufficient};
pub use metrics::*;
pub use pipeline::{run_pipeline, Outcome, Pipeline, PipelineConfig, PipelineReport};
pub use signal::*;
