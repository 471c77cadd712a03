//! Time-varying stimuli with an explicit schedule state.
//!
//! A stimulus is a pure function of a [`StimulusState`] and the current time: every call returns the stimulus
//! vector together with the updated state, which the caller passes back on the next call.
//!
//! # Example
//!
//! ```rust
//! use rusty_bold::stimulus::{Stimulus, StimulusSchedule, StimulusState};
//!
//! let schedule = StimulusSchedule::ActionCycle { dimensions: 3, baseline: 0.1, dominant: 0.8, period: 1.0 };
//! let stimulus = Stimulus::build(&schedule, None).unwrap();
//!
//! let (value, state) = stimulus.step(StimulusState::default(), 1.5);
//! assert_eq!(value.as_slice(), &[0.1, 0.8, 0.1]);
//! assert_eq!(state.trial, 1);
//! ```
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::BoldError;
use crate::vocab::Vocabulary;

/// A single trial of a trial list.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Trial {
    /// The semantic pointer presented during the trial.
    pub key: String,
    /// The trial duration.
    pub duration: f64,
}

/// The stimulus schedules.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StimulusSchedule {
    /// Cycle through the semantic pointers, presenting each for a fixed block duration.
    Blocks { keys: Vec<String>, block_duration: f64 },
    /// A vector of baseline values where a single dominant component cycles through the dimensions.
    ActionCycle {
        dimensions: usize,
        #[serde(default = "default_baseline")]
        baseline: f64,
        #[serde(default = "default_dominant")]
        dominant: f64,
        #[serde(default = "default_period")]
        period: f64,
    },
    /// Present the trials in order, then nothing.
    Trials { trials: Vec<Trial> },
}

fn default_baseline() -> f64 {
    0.1
}

fn default_dominant() -> f64 {
    0.8
}

fn default_period() -> f64 {
    1.0
}

/// The schedule state threaded through successive stimulus evaluations.
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StimulusState {
    /// The index of the current trial (or block, or action phase).
    pub trial: usize,
    /// The time at which the current trial started.
    pub trial_start: f64,
    /// The time elapsed since the start of the current trial.
    pub elapsed: f64,
}

#[derive(Debug, PartialEq, Clone)]
enum Program {
    Blocks {
        vectors: Vec<DVector<f64>>,
        block_duration: f64,
    },
    ActionCycle {
        dimensions: usize,
        baseline: f64,
        dominant: f64,
        period: f64,
    },
    Trials {
        vectors: Vec<DVector<f64>>,
        durations: Vec<f64>,
    },
}

/// A stimulus with its semantic pointers resolved.
#[derive(Debug, PartialEq, Clone)]
pub struct Stimulus {
    program: Program,
    dimensions: usize,
}

fn check_duration(duration: f64, what: &str) -> Result<(), BoldError> {
    if !(duration > 0.0 && duration.is_finite()) {
        return Err(BoldError::InvalidParameter(format!(
            "The {} must be positive and finite, got {}",
            what, duration
        )));
    }
    Ok(())
}

fn resolve(keys: &[&str], vocabulary: Option<&Vocabulary>) -> Result<Vec<DVector<f64>>, BoldError> {
    let vocabulary = vocabulary.ok_or_else(|| {
        BoldError::InvalidParameter(
            "A vocabulary is required to present semantic pointers".to_string(),
        )
    })?;
    keys.iter()
        .map(|key| {
            vocabulary.get(key).cloned().ok_or_else(|| {
                BoldError::InvalidParameter(format!("Unknown semantic pointer {}", key))
            })
        })
        .collect()
}

impl Stimulus {
    /// Create a new stimulus from its schedule, resolving the semantic pointers in the vocabulary.
    /// Returns an error if the schedule is invalid or refers to pointers missing from the vocabulary.
    pub fn build(
        schedule: &StimulusSchedule,
        vocabulary: Option<&Vocabulary>,
    ) -> Result<Self, BoldError> {
        match schedule {
            StimulusSchedule::Blocks {
                keys,
                block_duration,
            } => {
                if keys.is_empty() {
                    return Err(BoldError::InvalidParameter(
                        "A block schedule requires at least one key".to_string(),
                    ));
                }
                check_duration(*block_duration, "block duration")?;
                let keys: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
                let vectors = resolve(&keys, vocabulary)?;
                Ok(Stimulus {
                    dimensions: vectors[0].len(),
                    program: Program::Blocks {
                        vectors,
                        block_duration: *block_duration,
                    },
                })
            }
            StimulusSchedule::ActionCycle {
                dimensions,
                baseline,
                dominant,
                period,
            } => {
                if *dimensions == 0 {
                    return Err(BoldError::InvalidParameter(
                        "An action cycle requires at least one action".to_string(),
                    ));
                }
                check_duration(*period, "action period")?;
                Ok(Stimulus {
                    dimensions: *dimensions,
                    program: Program::ActionCycle {
                        dimensions: *dimensions,
                        baseline: *baseline,
                        dominant: *dominant,
                        period: *period,
                    },
                })
            }
            StimulusSchedule::Trials { trials } => {
                if trials.is_empty() {
                    return Err(BoldError::InvalidParameter(
                        "A trial list requires at least one trial".to_string(),
                    ));
                }
                for trial in trials.iter() {
                    check_duration(trial.duration, "trial duration")?;
                }
                let keys: Vec<&str> = trials.iter().map(|t| t.key.as_str()).collect();
                let vectors = resolve(&keys, vocabulary)?;
                Ok(Stimulus {
                    dimensions: vectors[0].len(),
                    program: Program::Trials {
                        vectors,
                        durations: trials.iter().map(|t| t.duration).collect(),
                    },
                })
            }
        }
    }

    /// Returns the dimension of the stimulus vectors.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Returns the number of trials, or None if the schedule repeats forever.
    pub fn num_trials(&self) -> Option<usize> {
        match &self.program {
            Program::Trials { durations, .. } => Some(durations.len()),
            _ => None,
        }
    }

    /// Returns the total duration of the schedule, or None if it repeats forever.
    pub fn total_duration(&self) -> Option<f64> {
        match &self.program {
            Program::Trials { durations, .. } => Some(durations.iter().sum()),
            _ => None,
        }
    }

    /// Returns the stimulus at the given time, together with the updated schedule state.
    /// For trial lists, times must be non-decreasing across successive calls.
    pub fn step(&self, state: StimulusState, time: f64) -> (DVector<f64>, StimulusState) {
        match &self.program {
            Program::Blocks {
                vectors,
                block_duration,
            } => {
                let block = (time / block_duration).floor().max(0.0) as usize;
                let trial_start = block as f64 * block_duration;
                let next = StimulusState {
                    trial: block,
                    trial_start,
                    elapsed: time - trial_start,
                };
                (vectors[block % vectors.len()].clone(), next)
            }
            Program::ActionCycle {
                dimensions,
                baseline,
                dominant,
                period,
            } => {
                let phase = (time / period).floor().max(0.0) as usize;
                let trial_start = phase as f64 * period;
                let mut value = DVector::from_element(*dimensions, *baseline);
                value[phase % dimensions] = *dominant;
                let next = StimulusState {
                    trial: phase,
                    trial_start,
                    elapsed: time - trial_start,
                };
                (value, next)
            }
            Program::Trials { vectors, durations } => {
                let mut next = state;
                while next.trial < durations.len()
                    && time >= next.trial_start + durations[next.trial]
                {
                    next.trial_start += durations[next.trial];
                    next.trial += 1;
                }
                next.elapsed = time - next.trial_start;
                let value = match vectors.get(next.trial) {
                    Some(vector) => vector.clone(),
                    None => DVector::zeros(self.dimensions),
                };
                (value, next)
            }
        }
    }
}
