//! This crate provides tools for turning simulated neural activity into synthetic BOLD responses in Rust.
//!
//! # Estimating BOLD Responses
//!
//! A raw signal sampled at a fixed rate is decimated to one sample per repetition interval (TR), then convolved with
//! a hemodynamic response function (HRF) kernel.
//!
//! ```rust
//! use rusty_bold::pipeline::{BoldPipeline, PipelineConfig};
//!
//! // A 64 time-unit recording at 1000 samples per time unit
//! let signal: Vec<f64> = (0..64_000).map(|i| ((i as f64) * 1e-3).sin().max(0.0)).collect();
//!
//! // Default pipeline: TR of 2, kernel over 32 time units
//! let pipeline = BoldPipeline::build(PipelineConfig::default()).unwrap();
//! let response = pipeline.estimate(&signal).unwrap();
//!
//! assert_eq!(response.num_volumes(), 32);
//! ```
//!
//! # Running Experiments
//!
//! The circuit itself is simulated by an external engine implementing [`engine::SimulationEngine`].
//! An experiment drives the engine with a stimulus schedule and projects the recording onto channels.
//!
//! ```rust
//! use rusty_bold::engine::ProbedInputEngine;
//! use rusty_bold::experiment::{Experiment, ExperimentConfig};
//!
//! let experiment = Experiment::build(ExperimentConfig::action_cycle()).unwrap();
//! let result = experiment.run(&mut ProbedInputEngine::default()).unwrap();
//!
//! assert_eq!(result.channels.len(), 4);
//! ```

pub mod convolve;
pub mod downsample;
pub mod engine;
pub mod error;
pub mod experiment;
pub mod hrf;
pub mod pipeline;
pub mod stimulus;
pub mod trace;
pub mod utils;
pub mod vocab;

/// The default simulation time step.
pub const DEFAULT_DT: f64 = 1e-3;
/// The default number of samples per time unit.
pub const DEFAULT_SAMPLE_RATE: f64 = 1000.0;
