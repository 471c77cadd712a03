use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log;
use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use sha2::{Digest, Sha256};

use rusty_bold::error::BoldError;
use rusty_bold::experiment::{Experiment, ExperimentConfig};
use rusty_bold::trace::Trace;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Preset {
    /// Cortex buffer alternating between ON and OFF during a 6 minute scan
    CortexOnOff,
    /// Three competing actions with a cycling dominant one
    ActionCycle,
}

#[derive(Parser, Debug)]
struct Args {
    /// The experiment configuration (JSON)
    #[arg(long, conflicts_with = "preset", required_unless_present = "preset")]
    config: Option<PathBuf>,
    /// A predefined experiment
    #[arg(long, value_enum)]
    preset: Option<Preset>,
    /// A trace recorded by an external engine (CSV, one row per timestep); the reference engine runs otherwise
    #[arg(long)]
    trace: Option<PathBuf>,
    /// The time step of the recorded trace
    #[arg(long, default_value = "0.001")]
    dt: f64,
    /// The BOLD responses (CSV, one row per channel)
    #[arg(short, long, default_value = "bold.csv")]
    output: PathBuf,
    /// The full report with neural and BOLD signals (JSON)
    #[arg(long)]
    report: Option<PathBuf>,
    /// The directory of the log files
    #[arg(long, default_value = "log")]
    log_dir: PathBuf,
}

fn main() -> Result<(), BoldError> {
    let args = Args::parse();

    let mut hasher = Sha256::new();
    hasher.update(format!("{:?}", args));
    let hash = hasher.finalize();
    let log_path = args.log_dir.join(format!("{:x}.log", hash));

    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{l} - {m}\n")))
        .build(log_path)
        .map_err(|e| BoldError::IOError(e.to_string()))?;

    let config = Config::builder()
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .build(Root::builder().appender("logfile").build(LevelFilter::Info))
        .map_err(|e| BoldError::IOError(e.to_string()))?;

    log4rs::init_config(config).map_err(|e| BoldError::IOError(e.to_string()))?;

    log::info!("{:?}", args);

    let config = match (&args.config, args.preset) {
        (Some(path), _) => ExperimentConfig::load_from(path)?,
        (None, Some(Preset::CortexOnOff)) => ExperimentConfig::cortex_on_off(),
        (None, Some(Preset::ActionCycle)) => ExperimentConfig::action_cycle(),
        (None, None) => {
            return Err(BoldError::InvalidParameter(
                "Either a configuration or a preset is required".to_string(),
            ))
        }
    };
    let experiment = Experiment::build(config)?;
    log::info!("Experiment setup: done!");

    let result = match &args.trace {
        Some(path) => {
            let trace = Trace::load_csv(path, args.dt)?;
            log::info!(
                "Trace loading: done! {} steps of dimension {}",
                trace.num_steps(),
                trace.dimensions()
            );
            experiment.estimate(&trace)?
        }
        None => {
            let mut engine = experiment.reference_engine()?;
            experiment.run(&mut engine)?
        }
    };
    log::info!("BOLD estimation: done!");

    result.write_csv(&args.output)?;
    log::info!("BOLD saving: done! Saved to {}", args.output.display());

    if let Some(path) = &args.report {
        result.save_to(path)?;
        log::info!("Report saving: done! Saved to {}", path.display());
    }
    Ok(())
}
