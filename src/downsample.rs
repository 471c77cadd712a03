//! Decimation of high-rate signals to one sample per repetition interval (TR).
use log::debug;

use crate::error::BoldError;

/// Returns the number of samples per TR, i.e., the TR expressed in samples at the given sample rate.
pub fn stride(tr: f64, sample_rate: f64) -> Result<usize, BoldError> {
    if !(tr > 0.0 && tr.is_finite()) {
        return Err(BoldError::InvalidParameter(format!(
            "The TR must be positive and finite, got {}",
            tr
        )));
    }
    if !(sample_rate > 0.0 && sample_rate.is_finite()) {
        return Err(BoldError::InvalidParameter(format!(
            "The sample rate must be positive and finite, got {}",
            sample_rate
        )));
    }

    let stride = (tr * sample_rate).round();
    if stride < 1.0 {
        return Err(BoldError::InvalidParameter(format!(
            "A TR of {} is shorter than one sample at {} samples per time unit",
            tr, sample_rate
        )));
    }
    Ok(stride as usize)
}

/// Keeps every `stride`-th sample of the signal, i.e., the last sample of each complete TR.
/// The output has `floor(signal.len() / stride)` samples; a trailing incomplete TR is dropped.
pub fn downsample(signal: &[f64], stride: usize) -> Result<Vec<f64>, BoldError> {
    if stride == 0 {
        return Err(BoldError::InvalidParameter(
            "The stride must be at least one sample".to_string(),
        ));
    }
    if signal.len() < stride {
        return Err(BoldError::InsufficientSignalLength {
            required: stride,
            available: signal.len(),
        });
    }

    let output: Vec<f64> = signal
        .iter()
        .skip(stride - 1)
        .step_by(stride)
        .cloned()
        .collect();
    debug!(
        "Downsampled {} samples to {} volumes (stride {})",
        signal.len(),
        output.len(),
        stride
    );
    Ok(output)
}
