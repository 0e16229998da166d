//! Settings shared by the model selection sweep and the partition engine
//!
//! `AnalysisParams` is checked into `AnalysisValidParams`, which also builds the seeded k-means
//! parameters for every fit.
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use segmenta::ParamGuard;
use segmenta_clustering::{KMeans, KMeansParams};
use thiserror::Error;

use crate::error::AnalysisError;

/// Largest number of clusters a sweep may evaluate
pub const MAX_K_LIMIT: usize = 15;

/// An error when an analysis hyperparameter is out of range
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisParamsError {
    #[error("max_k must lie in 2..={}, got {0}", MAX_K_LIMIT)]
    MaxK(usize),
    #[error("at least 10 k-means re-initialisations are required, got {0}")]
    NRuns(usize),
    #[error("max_n_iterations cannot be 0")]
    MaxIterations,
    #[error("tolerance must be greater than 0")]
    Tolerance,
}

impl From<AnalysisParamsError> for AnalysisError {
    fn from(err: AnalysisParamsError) -> Self {
        AnalysisError::InvalidConfiguration(err.to_string())
    }
}

/// Checked settings of the model selector and the partition engine
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisValidParams {
    max_k: usize,
    seed: u64,
    n_runs: usize,
    max_n_iterations: u64,
    tolerance: f64,
}

/// Builder for [`AnalysisValidParams`]
///
/// Defaults: `max_k = 10`, `seed = 42`, `n_runs = 10`, `max_n_iterations = 300` and
/// `tolerance = 1e-4`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParams(AnalysisValidParams);

impl Default for AnalysisParams {
    fn default() -> Self {
        AnalysisParams(AnalysisValidParams {
            max_k: 10,
            seed: 42,
            n_runs: 10,
            max_n_iterations: 300,
            tolerance: 1e-4,
        })
    }
}

impl AnalysisParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest number of clusters evaluated by the sweep and accepted for a partition
    pub fn max_k(mut self, max_k: usize) -> Self {
        self.0.max_k = max_k;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }

    /// Number of k-means re-initialisations per fit
    pub fn n_runs(mut self, n_runs: usize) -> Self {
        self.0.n_runs = n_runs;
        self
    }

    pub fn max_n_iterations(mut self, max_n_iterations: u64) -> Self {
        self.0.max_n_iterations = max_n_iterations;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.0.tolerance = tolerance;
        self
    }
}

impl ParamGuard for AnalysisParams {
    type Checked = AnalysisValidParams;
    type Error = AnalysisParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        let params = &self.0;
        if !(2..=MAX_K_LIMIT).contains(&params.max_k) {
            Err(AnalysisParamsError::MaxK(params.max_k))
        } else if params.n_runs < 10 {
            Err(AnalysisParamsError::NRuns(params.n_runs))
        } else if params.max_n_iterations == 0 {
            Err(AnalysisParamsError::MaxIterations)
        } else if !(params.tolerance > 0.) {
            Err(AnalysisParamsError::Tolerance)
        } else {
            Ok(params)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl AnalysisValidParams {
    pub fn max_k(&self) -> usize {
        self.max_k
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn n_runs(&self) -> usize {
        self.n_runs
    }

    pub fn max_n_iterations(&self) -> u64 {
        self.max_n_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// K-means hyperparameters for `n_clusters`, seeded the same way for every fit
    pub fn kmeans(&self, n_clusters: usize) -> KMeansParams<f64, Xoshiro256Plus> {
        KMeans::params_with_rng(n_clusters, Xoshiro256Plus::seed_from_u64(self.seed))
            .n_runs(self.n_runs)
            .max_n_iterations(self.max_n_iterations)
            .tolerance(self.tolerance)
    }
}
