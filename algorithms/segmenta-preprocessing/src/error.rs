//! Error definitions for preprocessing
use thiserror::Error;
pub type Result<T> = std::result::Result<T, PreprocessingError>;

#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum PreprocessingError {
    #[error("not enough samples")]
    NotEnoughSamples,
    #[error("minimum value for MinMax scaler cannot be greater than the maximum")]
    FlippedMinMaxRange,
    #[error("expected {expected} features, found {found}")]
    FeatureMismatch { expected: usize, found: usize },
    #[error(transparent)]
    SegmentaError(#[from] segmenta::error::Error),
}
