//! Recorded simulation output, indexed by `[timestep, dimension]`, and its projections onto channels.
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use itertools::Itertools;
use nalgebra::{DMatrix, DVector};

use crate::error::BoldError;
use crate::vocab::Vocabulary;

/// A real-valued time series of vectors sampled at a fixed step.
#[derive(Debug, PartialEq, Clone)]
pub struct Trace {
    /// One row per timestep, one column per dimension.
    data: DMatrix<f64>,
    /// The simulation time step.
    dt: f64,
}

impl Trace {
    /// Create a new trace from its data matrix and time step.
    /// Returns an error if the time step is not positive.
    pub fn new(data: DMatrix<f64>, dt: f64) -> Result<Self, BoldError> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(BoldError::InvalidParameter(format!(
                "The time step must be positive and finite, got {}",
                dt
            )));
        }
        Ok(Trace { data, dt })
    }

    /// Create a new trace from a sequence of (equally sized) samples.
    pub fn from_rows(rows: &[DVector<f64>], dt: f64) -> Result<Self, BoldError> {
        let dimensions = rows.first().map_or(0, |row| row.len());
        if let Some(row) = rows.iter().find(|row| row.len() != dimensions) {
            return Err(BoldError::InvalidParameter(format!(
                "All samples must have dimension {}, got {}",
                dimensions,
                row.len()
            )));
        }
        let data = DMatrix::from_fn(rows.len(), dimensions, |i, j| rows[i][j]);
        Trace::new(data, dt)
    }

    /// Returns the number of recorded timesteps.
    pub fn num_steps(&self) -> usize {
        self.data.nrows()
    }

    /// Returns the dimension of the recorded samples.
    pub fn dimensions(&self) -> usize {
        self.data.ncols()
    }

    /// Returns the simulation time step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Returns the number of samples per time unit.
    pub fn sample_rate(&self) -> f64 {
        1.0 / self.dt
    }

    /// Returns the recorded duration.
    pub fn duration(&self) -> f64 {
        self.num_steps() as f64 * self.dt
    }

    /// Returns the time of every sample, i.e., dt, 2 dt, ...
    pub fn times(&self) -> Vec<f64> {
        (1..=self.num_steps()).map(|n| n as f64 * self.dt).collect()
    }

    /// Returns the data matrix.
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Returns the time series of a single dimension.
    pub fn dimension(&self, index: usize) -> Result<Vec<f64>, BoldError> {
        if index >= self.dimensions() {
            return Err(BoldError::InvalidChannel(format!(
                "Dimension {} is out of range for a trace of dimension {}",
                index,
                self.dimensions()
            )));
        }
        Ok(self.data.column(index).iter().cloned().collect())
    }

    /// Returns the mean over all dimensions at every timestep.
    pub fn mean(&self) -> Result<Vec<f64>, BoldError> {
        if self.dimensions() == 0 {
            return Err(BoldError::EmptyInput(
                "Cannot average a trace without dimensions".to_string(),
            ));
        }
        Ok(self.data.row_iter().map(|row| row.mean()).collect())
    }

    /// Returns the similarity of every sample with every semantic pointer of the vocabulary.
    /// The resulting trace has one dimension per semantic pointer, in vocabulary order.
    pub fn similarity(&self, vocabulary: &Vocabulary) -> Result<Trace, BoldError> {
        if vocabulary.dimensions() != self.dimensions() {
            return Err(BoldError::InvalidParameter(format!(
                "Vocabulary of dimension {} does not match a trace of dimension {}",
                vocabulary.dimensions(),
                self.dimensions()
            )));
        }
        let pointers = DMatrix::from_fn(vocabulary.dimensions(), vocabulary.len(), |i, j| {
            vocabulary.pointers()[j][i]
        });
        Trace::new(&self.data * pointers, self.dt)
    }

    /// Load a trace from a CSV file with one row per timestep and no header.
    pub fn load_csv<P: AsRef<Path>>(path: P, dt: f64) -> Result<Trace, BoldError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut rows: Vec<DVector<f64>> = vec![];
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let row = line
                .split(',')
                .map(|field| field.trim().parse::<f64>())
                .collect::<Result<Vec<f64>, _>>()
                .map_err(|e| BoldError::IOError(format!("Line {}: {}", n + 1, e)))?;
            rows.push(DVector::from_vec(row));
        }
        if rows.is_empty() {
            return Err(BoldError::EmptyInput("The trace file has no samples".to_string()));
        }
        Trace::from_rows(&rows, dt)
    }

    /// Save the trace to a CSV file with one row per timestep and no header.
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), BoldError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        for row in self.data.row_iter() {
            writeln!(writer, "{}", row.iter().join(","))?;
        }
        writer.flush()?;
        Ok(())
    }
}
