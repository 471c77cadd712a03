use approx::assert_relative_eq;
use nalgebra::DVector;
use tempfile::tempdir;

use rusty_bold::convolve::convolve_crop;
use rusty_bold::downsample::downsample;
use rusty_bold::engine::{ProbedInputEngine, SimulationEngine};
use rusty_bold::experiment::{Experiment, ExperimentConfig};
use rusty_bold::hrf::{hrf, HrfShape};
use rusty_bold::stimulus::{Stimulus, StimulusSchedule, StimulusState};
use rusty_bold::trace::Trace;
use rusty_bold::utils::arange;
use rusty_bold::vocab::Vocabulary;

#[test]
fn test_constant_signal_single_volume() {
    let signal = vec![1.0; 1000];
    let neural = downsample(&signal, 1000).unwrap();
    assert_eq!(neural, vec![1.0]);

    let kernel = hrf(&arange(0.0, 30.0, 1.0), &HrfShape::default()).unwrap();
    let bold = convolve_crop(&neural, &kernel).unwrap();
    assert_eq!(bold, vec![kernel[0] * 1.0]);
}

#[test]
fn test_kernel_scale_over_offsets() {
    for (stop, step) in [(30.0, 1.0), (32.0, 2.0), (360.0, 2.0), (20.0, 0.25)] {
        let kernel = hrf(&arange(0.0, stop, step), &HrfShape::default()).unwrap();
        let max_abs = kernel.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        assert_relative_eq!(max_abs, 0.6, epsilon = 1e-12);
    }
}

#[test]
fn test_block_design_response_follows_blocks() {
    // 20 time-unit blocks, long enough for the response to settle within each block
    let vocab = Vocabulary::build(16, &["ON", "OFF"], 1).unwrap();
    let stimulus = Stimulus::build(
        &StimulusSchedule::Blocks {
            keys: vec!["ON".to_string(), "OFF".to_string()],
            block_duration: 20.0,
        },
        Some(&vocab),
    )
    .unwrap();

    let mut config = ExperimentConfig::cortex_on_off();
    config.duration = 160.0;
    config.vocabulary = Some(rusty_bold::vocab::VocabularyConfig {
        dimensions: 16,
        keys: vec!["ON".to_string(), "OFF".to_string()],
        seed: 1,
    });
    config.stimulus = StimulusSchedule::Blocks {
        keys: vec!["ON".to_string(), "OFF".to_string()],
        block_duration: 20.0,
    };
    let experiment = Experiment::build(config).unwrap();
    assert_eq!(experiment.stimulus(), &stimulus);

    let result = experiment
        .run(&mut ProbedInputEngine::default())
        .unwrap();
    let on = result.channel("cortex_on").unwrap();
    assert_eq!(on.num_volumes(), 80);

    // Neural similarity is close to one during ON blocks
    assert_relative_eq!(on.neural[5], 1.0, epsilon = 1e-6);

    // The BOLD response lags the neural signal: late in an ON block it exceeds its value early in the block
    assert!(on.bold[49] > on.bold[41]);
    // and late in the following OFF block it has decayed
    assert!(on.bold[79] < on.bold[49]);
}

#[test]
fn test_external_trace_round_trip() {
    let dir = tempdir().unwrap();
    let trace_path = dir.path().join("trace.csv");
    let output_path = dir.path().join("bold.csv");

    // Record the reference engine, then reload it as if it came from an external engine
    let experiment = Experiment::build(ExperimentConfig::action_cycle()).unwrap();
    let mut engine = experiment.reference_engine().unwrap();
    let trace = engine
        .run(experiment.stimulus(), experiment.config().duration)
        .unwrap();
    trace.save_csv(&trace_path).unwrap();

    let loaded = Trace::load_csv(&trace_path, engine.dt()).unwrap();
    assert_eq!(loaded.num_steps(), trace.num_steps());

    let direct = experiment.estimate(&trace).unwrap();
    let reloaded = experiment.estimate(&loaded).unwrap();
    assert_eq!(direct, reloaded);

    reloaded.write_csv(&output_path).unwrap();
    let content = std::fs::read_to_string(&output_path).unwrap();
    let rows: Vec<&str> = content.lines().collect();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| row.split(',').count() == 60));
}

#[test]
fn test_stimulus_state_threading() {
    let stimulus = Stimulus::build(
        &StimulusSchedule::ActionCycle {
            dimensions: 3,
            baseline: 0.1,
            dominant: 0.8,
            period: 1.0,
        },
        None,
    )
    .unwrap();

    let mut state = StimulusState::default();
    let mut dominant = vec![];
    for n in 0..6 {
        let (value, next) = stimulus.step(state, n as f64 + 0.5);
        state = next;
        dominant.push(value.imax());
    }
    assert_eq!(dominant, vec![0, 1, 2, 0, 1, 2]);
    assert_eq!(state.trial, 5);
    assert_relative_eq!(state.elapsed, 0.5);

    let total: DVector<f64> = stimulus.step(state, 0.5).0;
    assert_relative_eq!(total.sum(), 1.0, epsilon = 1e-12);
}
