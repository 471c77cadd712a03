//! Vocabularies of semantic pointers, i.e., named random unit vectors.
//!
//! # Example
//!
//! ```rust
//! use approx::assert_relative_eq;
//! use rusty_bold::vocab::Vocabulary;
//!
//! let vocab = Vocabulary::build(16, &["ON", "OFF"], 42).unwrap();
//!
//! let on = vocab.get("ON").unwrap();
//! let similarity = vocab.similarity(on).unwrap();
//! assert_relative_eq!(similarity[0], 1.0, epsilon = 1e-12);
//! ```
use itertools::Itertools;
use nalgebra::DVector;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::error::BoldError;

/// Parameters of a vocabulary.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// The dimension of the semantic pointers.
    pub dimensions: usize,
    /// The names of the semantic pointers.
    pub keys: Vec<String>,
    /// The seed used to sample the pointers.
    #[serde(default)]
    pub seed: u64,
}

/// A collection of named unit vectors.
#[derive(Debug, PartialEq, Clone)]
pub struct Vocabulary {
    keys: Vec<String>,
    pointers: Vec<DVector<f64>>,
}

impl Vocabulary {
    /// Sample a new vocabulary with one unit vector per key.
    /// Returns an error if there are no keys, if a key is empty or duplicated, or if the dimension is zero.
    pub fn build<S: AsRef<str>>(
        dimensions: usize,
        keys: &[S],
        seed: u64,
    ) -> Result<Self, BoldError> {
        if dimensions == 0 {
            return Err(BoldError::InvalidParameter(
                "Semantic pointers must have at least one dimension".to_string(),
            ));
        }
        if keys.is_empty() {
            return Err(BoldError::InvalidParameter(
                "A vocabulary requires at least one key".to_string(),
            ));
        }
        if keys.iter().any(|key| key.as_ref().is_empty()) {
            return Err(BoldError::InvalidParameter(
                "Vocabulary keys must be non-empty".to_string(),
            ));
        }
        if let Some(key) = keys.iter().map(|key| key.as_ref()).duplicates().next() {
            return Err(BoldError::InvalidParameter(format!(
                "Duplicate vocabulary key {}",
                key
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut pointers = Vec::with_capacity(keys.len());
        for key in keys.iter() {
            // Resample the (measure zero) null vector
            let pointer = loop {
                let v: DVector<f64> =
                    DVector::from_fn(dimensions, |_, _| StandardNormal.sample(&mut rng));
                let norm = v.norm();
                if norm > 0.0 {
                    break v / norm;
                }
            };
            log::trace!("New semantic pointer {}", key.as_ref());
            pointers.push(pointer);
        }

        Ok(Vocabulary {
            keys: keys.iter().map(|key| key.as_ref().to_string()).collect(),
            pointers,
        })
    }

    /// Sample a new vocabulary from its parameters.
    pub fn from_config(config: &VocabularyConfig) -> Result<Self, BoldError> {
        Vocabulary::build(config.dimensions, &config.keys, config.seed)
    }

    /// Returns the dimension of the semantic pointers.
    pub fn dimensions(&self) -> usize {
        self.pointers[0].len()
    }

    /// Returns the number of semantic pointers.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns the names of the semantic pointers, in order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Returns the position of the semantic pointer with the given name, if any.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    /// Returns the semantic pointer with the given name, if any.
    pub fn get(&self, key: &str) -> Option<&DVector<f64>> {
        self.index_of(key).map(|i| &self.pointers[i])
    }

    /// Returns the semantic pointers, in order.
    pub fn pointers(&self) -> &[DVector<f64>] {
        &self.pointers
    }

    /// Returns the dot product of the vector with every semantic pointer, in order.
    pub fn similarity(&self, vector: &DVector<f64>) -> Result<Vec<f64>, BoldError> {
        if vector.len() != self.dimensions() {
            return Err(BoldError::InvalidParameter(format!(
                "Expected a vector of dimension {}, got {}",
                self.dimensions(),
                vector.len()
            )));
        }
        Ok(self.pointers.iter().map(|p| p.dot(vector)).collect())
    }
}
