//! Errors and warnings of the billing analysis pipeline
use std::fmt;

use segmenta_clustering::KMeansError;
use segmenta_preprocessing::PreprocessingError;
use segmenta_reduction::ReductionError;
use thiserror::Error;

use crate::aggregate::GroupKey;
use crate::feature::Feature;

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Stages of an analysis session, in the order they have to be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Unconfigured,
    Configured,
    Explored,
    Partitioned,
    Profiled,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Unconfigured => "unconfigured",
            Stage::Configured => "configured",
            Stage::Explored => "explored",
            Stage::Partitioned => "partitioned",
            Stage::Profiled => "profiled",
        };
        f.write_str(name)
    }
}

/// Hard failures of the pipeline
///
/// Configuration and sequencing problems are never recovered, data-quality problems are
/// reported as [`Warning`]s instead.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("cannot enter the {stage} stage before the session is {missing}")]
    PrerequisiteMissing { stage: Stage, missing: Stage },
    #[error("model selection was cancelled")]
    Cancelled,
    #[error("model selection worker panicked")]
    WorkerPanicked,
    #[error(transparent)]
    Clustering(KMeansError),
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),
    #[error(transparent)]
    Reduction(#[from] ReductionError),
    #[error(transparent)]
    Segmenta(#[from] segmenta::error::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<KMeansError> for AnalysisError {
    fn from(err: KMeansError) -> Self {
        match err {
            KMeansError::NotEnoughDistinctSamples {
                n_clusters,
                n_distinct,
            } => AnalysisError::InsufficientData(format!(
                "{} clusters requested but the feature table has only {} distinct rows",
                n_clusters, n_distinct
            )),
            KMeansError::SegmentaError(segmenta::error::Error::NotEnoughSamples) => {
                AnalysisError::InsufficientData("the feature table is empty".to_string())
            }
            err => AnalysisError::Clustering(err),
        }
    }
}

/// Data-quality conditions recovered locally and reported next to a successful result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The feature has zero variance, its scaled column is all zeros
    NumericDegenerate { feature: Feature },
    /// An aggregated feature was not finite and has been replaced by 0
    NonFiniteFeature { key: GroupKey, feature: Feature },
    /// The sweep stopped at the number of distinct rows instead of the configured maximum
    RangeTruncated { requested: usize, evaluated: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::NumericDegenerate { feature } => write!(
                f,
                "{} has zero variance and does not separate clusters",
                feature
            ),
            Warning::NonFiniteFeature { key, feature } => {
                write!(f, "{} of {} was not finite, replaced by 0", feature, key)
            }
            Warning::RangeTruncated {
                requested,
                evaluated,
            } => write!(
                f,
                "only k up to {} evaluated, {} requested but not enough distinct rows",
                evaluated, requested
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered() {
        assert!(Stage::Unconfigured < Stage::Configured);
        assert!(Stage::Explored < Stage::Partitioned);
        assert!(Stage::Partitioned < Stage::Profiled);
    }

    #[test]
    fn distinct_samples_become_insufficient_data() {
        let err = AnalysisError::from(KMeansError::NotEnoughDistinctSamples {
            n_clusters: 5,
            n_distinct: 3,
        });
        assert!(matches!(err, AnalysisError::InsufficientData(_)));

        let err = AnalysisError::from(KMeansError::InertiaError);
        assert!(matches!(err, AnalysisError::Clustering(_)));
    }

    #[test]
    fn prerequisite_message() {
        let err = AnalysisError::PrerequisiteMissing {
            stage: Stage::Partitioned,
            missing: Stage::Configured,
        };
        assert_eq!(
            err.to_string(),
            "cannot enter the partitioned stage before the session is configured"
        );
    }
}
