//! Three-stage BOLD estimation pipeline: downsample, then convolve with the HRF kernel.
//!
//! # Example
//!
//! ```rust
//! use rusty_bold::pipeline::{BoldPipeline, PipelineConfig};
//!
//! // A 60 time-unit recording at 1000 samples per time unit
//! let signal: Vec<f64> = (0..60_000).map(|i| if (i / 6000) % 2 == 0 { 1.0 } else { 0.0 }).collect();
//!
//! let pipeline = BoldPipeline::build(PipelineConfig { kernel_duration: 30.0, ..PipelineConfig::default() }).unwrap();
//! let response = pipeline.estimate(&signal).unwrap();
//!
//! assert_eq!(response.num_volumes(), 30);
//! assert_eq!(response.bold.len(), response.neural.len());
//! assert_eq!(response.times()[1], 2.0);
//! ```
use log::debug;
use serde::{Deserialize, Serialize};

use crate::convolve::convolve_crop;
use crate::downsample::{downsample, stride};
use crate::error::BoldError;
use crate::hrf::{hrf, kernel_times, HrfShape};
use crate::utils::arange;
use crate::DEFAULT_SAMPLE_RATE;

/// Parameters of the pipeline.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// The repetition interval, in time units.
    pub tr: f64,
    /// The number of raw samples per time unit.
    pub sample_rate: f64,
    /// The duration covered by the kernel, in time units.
    pub kernel_duration: f64,
    /// The kernel shape.
    pub hrf: HrfShape,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            tr: 2.0,
            sample_rate: DEFAULT_SAMPLE_RATE,
            kernel_duration: 32.0,
            hrf: HrfShape::default(),
        }
    }
}

/// The estimated BOLD response of a single channel.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BoldResponse {
    /// The repetition interval.
    pub tr: f64,
    /// The neural signal, one sample per volume.
    pub neural: Vec<f64>,
    /// The estimated BOLD signal, aligned with the neural signal.
    pub bold: Vec<f64>,
}

impl BoldResponse {
    /// Returns the number of volumes.
    pub fn num_volumes(&self) -> usize {
        self.neural.len()
    }

    /// Returns the acquisition time of every volume, starting at zero.
    pub fn times(&self) -> Vec<f64> {
        (0..self.num_volumes()).map(|n| n as f64 * self.tr).collect()
    }
}

/// A pipeline with a precomputed stride and kernel.
#[derive(Debug, PartialEq, Clone)]
pub struct BoldPipeline {
    config: PipelineConfig,
    stride: usize,
    kernel: Vec<f64>,
}

impl BoldPipeline {
    /// Create a new pipeline from the provided parameters.
    /// Returns an error if the parameters are invalid or the kernel support is degenerate.
    pub fn build(config: PipelineConfig) -> Result<Self, BoldError> {
        let stride = stride(config.tr, config.sample_rate)?;
        if !(config.kernel_duration > 0.0 && config.kernel_duration.is_finite()) {
            return Err(BoldError::InvalidParameter(format!(
                "The kernel duration must be positive and finite, got {}",
                config.kernel_duration
            )));
        }
        let kernel = hrf(&kernel_times(config.kernel_duration, config.tr), &config.hrf)?;
        debug!(
            "New pipeline: TR {} ({} samples), kernel of {} taps",
            config.tr,
            stride,
            kernel.len()
        );
        Ok(BoldPipeline {
            config,
            stride,
            kernel,
        })
    }

    /// Returns the pipeline parameters.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the number of raw samples per volume.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the kernel, sampled once per TR.
    pub fn kernel(&self) -> &[f64] {
        &self.kernel
    }

    /// Returns the kernel sample times.
    pub fn kernel_times(&self) -> Vec<f64> {
        arange(0.0, self.kernel.len() as f64 * self.config.tr, self.config.tr)
    }

    /// Returns the minimum number of raw samples the pipeline accepts.
    pub fn min_signal_len(&self) -> usize {
        self.stride * self.kernel.len()
    }

    /// Estimate the BOLD response of a raw signal sampled at the configured rate.
    /// Returns an error if the signal holds fewer volumes than the kernel has taps.
    pub fn estimate(&self, signal: &[f64]) -> Result<BoldResponse, BoldError> {
        if signal.len() < self.min_signal_len() {
            return Err(BoldError::InsufficientSignalLength {
                required: self.min_signal_len(),
                available: signal.len(),
            });
        }
        let neural = downsample(signal, self.stride)?;
        let bold = convolve_crop(&neural, &self.kernel)?;
        Ok(BoldResponse {
            tr: self.config.tr,
            neural,
            bold,
        })
    }
}
