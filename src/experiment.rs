//! Experiments: a stimulus schedule, a recording, and a set of channels turned into BOLD responses.
//!
//! # Example
//!
//! ```rust
//! use rusty_bold::engine::ProbedInputEngine;
//! use rusty_bold::experiment::{Experiment, ExperimentConfig};
//!
//! let experiment = Experiment::build(ExperimentConfig::cortex_on_off()).unwrap();
//! let result = experiment.run(&mut ProbedInputEngine::default()).unwrap();
//!
//! // A 6 minute scan with a TR of 2 yields 180 volumes per channel
//! assert_eq!(result.channels.len(), 2);
//! assert_eq!(result.channels[0].response.num_volumes(), 180);
//! ```
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::engine::{Lowpass, ProbedInputEngine, SimulationEngine};
use crate::error::BoldError;
use crate::pipeline::{BoldPipeline, BoldResponse, PipelineConfig};
use crate::stimulus::{Stimulus, StimulusSchedule};
use crate::trace::Trace;
use crate::vocab::{Vocabulary, VocabularyConfig};
use crate::DEFAULT_DT;

/// Relative tolerance for two sample rates to be considered equal.
const REL_TOL: f64 = 1e-9;

/// How a channel is derived from the recorded trace.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    /// A single dimension of the trace.
    Dimension { index: usize },
    /// The mean over all dimensions.
    Mean,
    /// The similarity with a semantic pointer of the vocabulary.
    Similarity { key: String },
}

/// A named channel of the experiment.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// The channel name, used as the CSV row label.
    pub label: String,
    /// How the recorded trace is reduced to a single neural signal.
    pub projection: Projection,
}

/// Parameters of an experiment.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// The experiment name.
    pub name: String,
    /// The simulated duration.
    pub duration: f64,
    /// The BOLD pipeline parameters.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// The semantic pointers, if the stimulus or the channels refer to any.
    #[serde(default)]
    pub vocabulary: Option<VocabularyConfig>,
    /// The stimulus schedule.
    pub stimulus: StimulusSchedule,
    /// The time constant of the probe synapse of the reference engine, if any.
    #[serde(default)]
    pub synapse: Option<f64>,
    /// The channels turned into BOLD responses.
    pub channels: Vec<ChannelConfig>,
}

impl ExperimentConfig {
    /// Cortex buffer alternating between ON and OFF every 6 time units during a 6 minute scan.
    pub fn cortex_on_off() -> Self {
        ExperimentConfig {
            name: "cortex_on_off".to_string(),
            duration: 360.0,
            pipeline: PipelineConfig::default(),
            vocabulary: Some(VocabularyConfig {
                dimensions: 16,
                keys: vec!["ON".to_string(), "OFF".to_string()],
                seed: 0,
            }),
            stimulus: StimulusSchedule::Blocks {
                keys: vec!["ON".to_string(), "OFF".to_string()],
                block_duration: 6.0,
            },
            synapse: Some(0.01),
            channels: vec![
                ChannelConfig {
                    label: "cortex_on".to_string(),
                    projection: Projection::Similarity {
                        key: "ON".to_string(),
                    },
                },
                ChannelConfig {
                    label: "cortex_off".to_string(),
                    projection: Projection::Similarity {
                        key: "OFF".to_string(),
                    },
                },
            ],
        }
    }

    /// Three competing actions, one dominant at a time, cycling every time unit.
    pub fn action_cycle() -> Self {
        ExperimentConfig {
            name: "action_cycle".to_string(),
            duration: 60.0,
            pipeline: PipelineConfig {
                tr: 1.0,
                kernel_duration: 30.0,
                ..PipelineConfig::default()
            },
            vocabulary: None,
            stimulus: StimulusSchedule::ActionCycle {
                dimensions: 3,
                baseline: 0.1,
                dominant: 0.8,
                period: 1.0,
            },
            synapse: Some(0.01),
            channels: (0..3)
                .map(|i| ChannelConfig {
                    label: format!("action_{}", i),
                    projection: Projection::Dimension { index: i },
                })
                .chain(std::iter::once(ChannelConfig {
                    label: "actions_mean".to_string(),
                    projection: Projection::Mean,
                }))
                .collect(),
        }
    }

    /// Load an experiment configuration from a JSON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, BoldError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Save the experiment configuration to a JSON file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), BoldError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

/// The BOLD response of a named channel.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ChannelResponse {
    /// The channel name.
    pub label: String,
    /// The downsampled neural signal and its BOLD estimate.
    pub response: BoldResponse,
}

/// The outcome of an experiment.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    /// The experiment name.
    pub name: String,
    /// The repetition interval.
    pub tr: f64,
    /// The channel responses, in configuration order.
    pub channels: Vec<ChannelResponse>,
}

impl ExperimentResult {
    /// Returns the response of the channel with the given label, if any.
    pub fn channel(&self, label: &str) -> Option<&BoldResponse> {
        self.channels
            .iter()
            .find(|channel| channel.label == label)
            .map(|channel| &channel.response)
    }

    /// Write the BOLD responses to a CSV file, one row per channel and one column per volume, without header.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), BoldError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        for channel in self.channels.iter() {
            writeln!(writer, "{}", channel.response.bold.iter().join(","))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Save the full result (neural and BOLD signals of every channel) to a JSON file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), BoldError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

/// An experiment with its vocabulary sampled and its stimulus resolved.
#[derive(Debug, Clone)]
pub struct Experiment {
    config: ExperimentConfig,
    vocabulary: Option<Vocabulary>,
    stimulus: Stimulus,
}

impl Experiment {
    /// Create a new experiment from its configuration.
    /// Returns an error if the configuration is inconsistent, e.g., a channel refers to an unknown semantic pointer.
    pub fn build(config: ExperimentConfig) -> Result<Self, BoldError> {
        if !(config.duration > 0.0 && config.duration.is_finite()) {
            return Err(BoldError::InvalidParameter(format!(
                "The experiment duration must be positive and finite, got {}",
                config.duration
            )));
        }
        if config.channels.is_empty() {
            return Err(BoldError::InvalidParameter(
                "An experiment requires at least one channel".to_string(),
            ));
        }
        if let Some(label) = config
            .channels
            .iter()
            .map(|channel| channel.label.as_str())
            .duplicates()
            .next()
        {
            return Err(BoldError::InvalidParameter(format!(
                "Duplicate channel label {}",
                label
            )));
        }

        let vocabulary = config
            .vocabulary
            .as_ref()
            .map(Vocabulary::from_config)
            .transpose()?;
        let stimulus = Stimulus::build(&config.stimulus, vocabulary.as_ref())?;

        for channel in config.channels.iter() {
            if let Projection::Similarity { key } = &channel.projection {
                let known = vocabulary
                    .as_ref()
                    .map_or(false, |vocabulary| vocabulary.index_of(key).is_some());
                if !known {
                    return Err(BoldError::InvalidParameter(format!(
                        "Channel {} refers to unknown semantic pointer {}",
                        channel.label, key
                    )));
                }
            }
        }

        // Fail early on a degenerate kernel
        BoldPipeline::build(config.pipeline.clone())?;

        Ok(Experiment {
            config,
            vocabulary,
            stimulus,
        })
    }

    /// Returns the experiment configuration.
    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Returns the stimulus.
    pub fn stimulus(&self) -> &Stimulus {
        &self.stimulus
    }

    /// Returns the reference engine matching the configured pipeline rate and probe synapse.
    pub fn reference_engine(&self) -> Result<ProbedInputEngine, BoldError> {
        let synapse = self.config.synapse.map(Lowpass::build).transpose()?;
        let dt = match self.config.pipeline.sample_rate {
            rate if rate > 0.0 => 1.0 / rate,
            _ => DEFAULT_DT,
        };
        ProbedInputEngine::build(dt, synapse)
    }

    /// Run the engine for the experiment duration, then estimate the BOLD response of every channel.
    pub fn run<E: SimulationEngine>(&self, engine: &mut E) -> Result<ExperimentResult, BoldError> {
        info!(
            "Running experiment {} for {} time units",
            self.config.name, self.config.duration
        );
        let trace = engine.run(&self.stimulus, self.config.duration)?;
        self.estimate(&trace)
    }

    /// Estimate the BOLD response of every channel of a recorded trace.
    pub fn estimate(&self, trace: &Trace) -> Result<ExperimentResult, BoldError> {
        let mut config = self.config.pipeline.clone();
        if ((trace.sample_rate() - config.sample_rate) / config.sample_rate).abs() > REL_TOL {
            warn!(
                "The trace sample rate {} overrides the configured sample rate {}",
                trace.sample_rate(),
                config.sample_rate
            );
            config.sample_rate = trace.sample_rate();
        }
        let pipeline = BoldPipeline::build(config)?;

        let similarity = match &self.vocabulary {
            Some(vocabulary)
                if self
                    .config
                    .channels
                    .iter()
                    .any(|c| matches!(c.projection, Projection::Similarity { .. })) =>
            {
                Some(trace.similarity(vocabulary)?)
            }
            _ => None,
        };

        let mut channels = Vec::with_capacity(self.config.channels.len());
        for channel in self.config.channels.iter() {
            let signal = match &channel.projection {
                Projection::Dimension { index } => trace.dimension(*index)?,
                Projection::Mean => trace.mean()?,
                Projection::Similarity { key } => {
                    match (&self.vocabulary, &similarity) {
                        (Some(vocabulary), Some(similarity)) => {
                            let index = vocabulary.index_of(key).ok_or_else(|| {
                                BoldError::InvalidChannel(format!(
                                    "Unknown semantic pointer {}",
                                    key
                                ))
                            })?;
                            similarity.dimension(index)?
                        }
                        _ => {
                            return Err(BoldError::InvalidChannel(format!(
                                "Channel {} requires a vocabulary",
                                channel.label
                            )))
                        }
                    }
                }
            };
            let response = pipeline.estimate(&signal)?;
            info!(
                "Channel {}: {} volumes estimated",
                channel.label,
                response.num_volumes()
            );
            channels.push(ChannelResponse {
                label: channel.label.clone(),
                response,
            });
        }

        Ok(ExperimentResult {
            name: self.config.name.clone(),
            tr: pipeline.config().tr,
            channels,
        })
    }
}
