//! Utility functions.

/// Evenly spaced values in the half-open interval [start, stop), with the given step.
/// Returns an empty vector if the step is not strictly positive or the interval is empty.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if !(step > 0.0) || !(stop > start) {
        return vec![];
    }
    let num = ((stop - start) / step).ceil() as usize;
    (0..num).map(|n| start + n as f64 * step).collect()
}
