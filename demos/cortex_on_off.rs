use rusty_bold::engine::ProbedInputEngine;
use rusty_bold::error::BoldError;
use rusty_bold::experiment::{Experiment, ExperimentConfig};

fn main() -> Result<(), BoldError> {
    // Cortex buffer alternating between ON and OFF every 6 time units, 6 minute scan, TR of 2
    let experiment = Experiment::build(ExperimentConfig::cortex_on_off())?;

    // The reference engine records the cortex input through a 10ms probe synapse
    let mut engine = ProbedInputEngine::default();
    let result = experiment.run(&mut engine)?;

    for channel in result.channels.iter() {
        let response = &channel.response;
        let peak = response
            .bold
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        println!(
            "{}: {} volumes, BOLD peak {:.3}",
            channel.label,
            response.num_volumes(),
            peak
        );
        for (time, (neural, bold)) in response
            .times()
            .iter()
            .zip(response.neural.iter().zip(response.bold.iter()))
            .take(12)
        {
            println!("  t = {:>5.1}  neural = {:>6.3}  bold = {:>6.3}", time, neural, bold);
        }
    }

    result.write_csv("cortex_on_off.csv")?;
    println!("BOLD responses saved to cortex_on_off.csv");
    Ok(())
}
