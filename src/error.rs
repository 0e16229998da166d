//! Error types in Segmenta
//!

use thiserror::Error;

use ndarray::ShapeError;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("invalid parameter {0}")]
    Parameters(String),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error("Not enough samples to compute the mean")]
    NotEnoughSamples,
    #[error("at least two clusters are needed, found {0}")]
    NotEnoughClusters(usize),
    #[error("number of labels ({labels}) does not match number of samples ({samples})")]
    MismatchedLabels { samples: usize, labels: usize },
}
