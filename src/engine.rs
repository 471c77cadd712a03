//! Simulation engines producing recorded traces from stimuli.
//!
//! The spiking dynamics of a circuit are provided by an external engine implementing [`SimulationEngine`].
//! The crate ships [`ProbedInputEngine`], which records the stimulus itself through a probe synapse.
use log::info;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::BoldError;
use crate::stimulus::{Stimulus, StimulusState};
use crate::trace::Trace;
use crate::DEFAULT_DT;

/// An engine advancing a circuit driven by a stimulus, and recording its output.
pub trait SimulationEngine {
    /// Returns the simulation time step.
    fn dt(&self) -> f64;

    /// Run the simulation for the provided duration and return the full recorded trace.
    fn run(&mut self, stimulus: &Stimulus, duration: f64) -> Result<Trace, BoldError>;
}

/// First-order lowpass synapse.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Lowpass {
    /// The time constant.
    pub tau: f64,
}

impl Lowpass {
    /// Create a new lowpass synapse with the provided time constant.
    /// Returns an error if the time constant is negative.
    pub fn build(tau: f64) -> Result<Self, BoldError> {
        if !(tau >= 0.0 && tau.is_finite()) {
            return Err(BoldError::InvalidParameter(format!(
                "The synaptic time constant must be non-negative and finite, got {}",
                tau
            )));
        }
        Ok(Lowpass { tau })
    }

    /// Returns the fraction of the gap between input and state closed in one step (zero-order hold).
    pub fn gain(&self, dt: f64) -> f64 {
        if self.tau == 0.0 {
            return 1.0;
        }
        1.0 - (-dt / self.tau).exp()
    }
}

/// An engine recording the stimulus, optionally filtered by a probe synapse.
#[derive(Debug, PartialEq, Clone)]
pub struct ProbedInputEngine {
    dt: f64,
    synapse: Option<Lowpass>,
}

impl Default for ProbedInputEngine {
    fn default() -> Self {
        ProbedInputEngine {
            dt: DEFAULT_DT,
            synapse: Some(Lowpass { tau: 0.01 }),
        }
    }
}

impl ProbedInputEngine {
    /// Create a new engine with the provided time step and probe synapse.
    pub fn build(dt: f64, synapse: Option<Lowpass>) -> Result<Self, BoldError> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(BoldError::InvalidParameter(format!(
                "The time step must be positive and finite, got {}",
                dt
            )));
        }
        Ok(ProbedInputEngine { dt, synapse })
    }

    /// Returns the probe synapse, if any.
    pub fn synapse(&self) -> Option<Lowpass> {
        self.synapse
    }
}

impl SimulationEngine for ProbedInputEngine {
    fn dt(&self) -> f64 {
        self.dt
    }

    fn run(&mut self, stimulus: &Stimulus, duration: f64) -> Result<Trace, BoldError> {
        if !(duration > 0.0 && duration.is_finite()) {
            return Err(BoldError::InvalidParameter(format!(
                "The simulation duration must be positive and finite, got {}",
                duration
            )));
        }
        let num_steps = (duration / self.dt).round() as usize;
        if num_steps == 0 {
            return Err(BoldError::InvalidParameter(format!(
                "A duration of {} is shorter than one time step",
                duration
            )));
        }

        let gain = self.synapse.map_or(1.0, |synapse| synapse.gain(self.dt));
        let mut data = DMatrix::zeros(num_steps, stimulus.dimensions());
        let mut state = StimulusState::default();
        let mut filtered = DVector::zeros(stimulus.dimensions());

        for n in 0..num_steps {
            let time = (n + 1) as f64 * self.dt;
            let (value, next) = stimulus.step(state, time);
            state = next;
            filtered = &filtered * (1.0 - gain) + value * gain;
            data.set_row(n, &filtered.transpose());
        }

        info!(
            "Simulation done: {} steps of {} ({} trials started)",
            num_steps,
            self.dt,
            state.trial + 1
        );
        Trace::new(data, self.dt)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::stimulus::{StimulusSchedule, Trial};
    use crate::vocab::Vocabulary;

    fn action_cycle() -> Stimulus {
        Stimulus::build(
            &StimulusSchedule::ActionCycle {
                dimensions: 3,
                baseline: 0.1,
                dominant: 0.8,
                period: 1.0,
            },
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_lowpass() {
        assert!(matches!(Lowpass::build(-0.1), Err(BoldError::InvalidParameter(_))));
        assert_eq!(Lowpass::build(0.0).unwrap().gain(0.001), 1.0);
        assert_relative_eq!(
            Lowpass::build(0.01).unwrap().gain(0.001),
            1.0 - (-0.1_f64).exp()
        );
    }

    #[test]
    fn test_run_unfiltered() {
        let mut engine = ProbedInputEngine::build(0.001, None).unwrap();
        let trace = engine.run(&action_cycle(), 6.0).unwrap();

        assert_eq!(trace.num_steps(), 6000);
        assert_eq!(trace.dimensions(), 3);
        assert_eq!(trace.dt(), 0.001);

        // Sample n is evaluated at (n + 1) dt
        assert_eq!(trace.data()[(0, 0)], 0.8);
        assert_eq!(trace.data()[(1500, 1)], 0.8);
        assert_eq!(trace.data()[(1500, 0)], 0.1);
        assert_eq!(trace.data()[(2500, 2)], 0.8);
    }

    #[test]
    fn test_run_trials() {
        let vocab = Vocabulary::build(4, &["ON", "OFF"], 0).unwrap();
        let stimulus = Stimulus::build(
            &StimulusSchedule::Trials {
                trials: vec![
                    Trial {
                        key: "ON".to_string(),
                        duration: 1.0,
                    },
                    Trial {
                        key: "OFF".to_string(),
                        duration: 0.5,
                    },
                ],
            },
            Some(&vocab),
        )
        .unwrap();

        let mut engine = ProbedInputEngine::build(0.001, None).unwrap();
        let trace = engine.run(&stimulus, 2.0).unwrap();
        assert_eq!(trace.num_steps(), 2000);

        let on = vocab.get("ON").unwrap();
        let off = vocab.get("OFF").unwrap();
        assert_eq!(&trace.data().row(0).transpose(), on);
        assert_eq!(&trace.data().row(998).transpose(), on);
        assert_eq!(&trace.data().row(1200).transpose(), off);
        assert_eq!(&trace.data().row(1498).transpose(), off);

        // Nothing is presented once every trial has been played
        let end = (stimulus.total_duration().unwrap() / engine.dt()).round() as usize;
        assert_eq!(end, 1500);
        assert!((end..trace.num_steps()).all(|n| trace.data().row(n).iter().all(|v| *v == 0.0)));
    }

    #[test]
    fn test_run_filtered() {
        let mut engine = ProbedInputEngine::default();
        let trace = engine.run(&action_cycle(), 2.0).unwrap();

        // The filtered dominant component rises from zero toward its target
        let first = trace.dimension(0).unwrap();
        assert!(first[0] > 0.0 && first[0] < 0.8);
        assert!(first.windows(2).take(300).all(|w| w[1] >= w[0]));
        assert_relative_eq!(first[998], 0.8, epsilon = 1e-4);

        // After the switch, the former dominant action decays toward the baseline
        assert!(first[1500] < 0.11 && first[1500] > 0.09);
    }

    #[test]
    fn test_run_invalid() {
        let mut engine = ProbedInputEngine::default();
        assert!(matches!(
            engine.run(&action_cycle(), 0.0),
            Err(BoldError::InvalidParameter(_))
        ));
        assert!(matches!(
            engine.run(&action_cycle(), 1e-6),
            Err(BoldError::InvalidParameter(_))
        ));
        assert!(matches!(
            ProbedInputEngine::build(0.0, None),
            Err(BoldError::InvalidParameter(_))
        ));
    }
}
