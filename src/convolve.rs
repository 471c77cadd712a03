//! Linear convolution of a downsampled signal with a kernel.
use crate::error::BoldError;

fn check_inputs(signal: &[f64], kernel: &[f64]) -> Result<(), BoldError> {
    if signal.is_empty() {
        return Err(BoldError::EmptyInput(
            "Cannot convolve an empty signal".to_string(),
        ));
    }
    if kernel.is_empty() {
        return Err(BoldError::EmptyInput(
            "Cannot convolve with an empty kernel".to_string(),
        ));
    }
    Ok(())
}

/// Returns the full linear convolution of the signal and the kernel, with `n + m - 1` samples.
pub fn convolve_full(signal: &[f64], kernel: &[f64]) -> Result<Vec<f64>, BoldError> {
    check_inputs(signal, kernel)?;

    let mut output = vec![0.0; signal.len() + kernel.len() - 1];
    for (i, s) in signal.iter().enumerate() {
        for (j, k) in kernel.iter().enumerate() {
            output[i + j] += s * k;
        }
    }
    Ok(output)
}

/// Returns the full convolution with its trailing `m - 1` samples removed.
/// The output is aligned sample-for-sample with the signal and has exactly its length.
pub fn convolve_crop(signal: &[f64], kernel: &[f64]) -> Result<Vec<f64>, BoldError> {
    let mut output = convolve_full(signal, kernel)?;
    output.truncate(signal.len());
    Ok(output)
}
