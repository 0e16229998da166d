use thiserror::Error;

/// An error when fitting with an invalid hyperparameter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KMeansParamsError {
    #[error("n_clusters cannot be 0")]
    NClusters,
    #[error("n_runs cannot be 0")]
    NRuns,
    #[error("tolerance must be greater than 0")]
    Tolerance,
    #[error("max_n_iterations cannot be 0")]
    MaxIterations,
    #[error("precomputed centroids have {found} rows, expected n_clusters = {expected}")]
    PrecomputedClusters { expected: usize, found: usize },
}

/// An error when modeling a KMeans algorithm
#[derive(Error, Debug, Clone)]
pub enum KMeansError {
    /// When any of the hyperparameters are set the wrong value
    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(#[from] KMeansParamsError),
    /// When the dataset has fewer distinct observations than requested clusters
    #[error("{n_clusters} clusters requested but only {n_distinct} distinct observations available")]
    NotEnoughDistinctSamples { n_clusters: usize, n_distinct: usize },
    /// When precomputed centroids do not live in the feature space of the dataset
    #[error("precomputed centroids have {found} features, the dataset has {expected}")]
    CentroidDimension { expected: usize, found: usize },
    /// When inertia computation fails
    #[error("Fitting failed: No inertia improvement (-inf)")]
    InertiaError,
    #[error(transparent)]
    SegmentaError(#[from] segmenta::error::Error),
}
