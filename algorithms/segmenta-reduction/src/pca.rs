//! Principal Component Analysis
//!
//! Principal Component Analysis is a common technique for data and dimensionality reduction. It
//! reduces the dimensionality of the data while retaining most of the variance. This is
//! done by projecting the data to a lower dimensional space with the eigenvectors of the sample
//! covariance matrix, ordered by decreasing eigenvalue.
//!
//! # Example
//!
//! ```
//! use segmenta::traits::{Fit, Transformer};
//! use segmenta::DatasetBase;
//! use segmenta_reduction::Pca;
//! use ndarray::array;
//!
//! let dataset = DatasetBase::from(array![[1.0f64, 2.], [2., 4.], [3., 6.], [4., 8.]]);
//!
//! // apply PCA projection along a line which maximizes the spread of the data
//! let embedding = Pca::params(1).fit(&dataset).unwrap();
//! assert!((embedding.explained_variance_ratio()[0] - 1.).abs() < 1e-9);
//!
//! // reduce dimensionality of the dataset
//! let projected = embedding.transform(dataset.records());
//! assert_eq!(projected.dim(), (4, 1));
//! ```
use crate::error::{ReductionError, Result};
use linfa_linalg::eigh::{EigSort, Eigh};
use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, Ix2};
use segmenta::{dataset::DatasetBase, traits::Fit, traits::Transformer, Float, ParamGuard};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Pincipal Component Analysis parameters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcaValidParams {
    embedding_size: usize,
}

impl PcaValidParams {
    /// Number of principal components kept by the projection
    pub fn embedding_size(&self) -> usize {
        self.embedding_size
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcaParams(PcaValidParams);

impl PcaParams {
    pub fn new(embedding_size: usize) -> PcaParams {
        PcaParams(PcaValidParams { embedding_size })
    }

    /// Change the number of principal components
    pub fn embedding_size(mut self, embedding_size: usize) -> Self {
        self.0.embedding_size = embedding_size;
        self
    }
}

impl ParamGuard for PcaParams {
    type Checked = PcaValidParams;
    type Error = ReductionError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.embedding_size == 0 {
            Err(ReductionError::NonPositiveEmbeddingSize)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float, D: Data<Elem = F>, T> Fit<ArrayBase<D, Ix2>, T, ReductionError> for PcaValidParams {
    type Object = Pca<F>;

    /// Fit a PCA model on the records of a dataset
    ///
    /// The covariance uses `n - 1` degrees of freedom. Requires at least two samples and no more
    /// components than features.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Pca<F>> {
        let x = dataset.records();
        let (n_samples, n_features) = x.dim();
        if n_samples < 2 {
            return Err(ReductionError::NotEnoughSamples);
        }
        if self.embedding_size > n_features {
            return Err(ReductionError::DimensionIncrease(
                self.embedding_size,
                n_features,
            ));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or(ReductionError::NotEnoughSamples)?;
        let centered = x - &mean;
        let covariance = centered.t().dot(&centered) / F::cast(n_samples - 1);

        let (eigvals, eigvecs) = covariance.eigh()?.sort_eig_desc();
        // round-off can push the eigenvalues of a singular covariance below zero
        let eigvals = eigvals.mapv(|v| if v > F::zero() { v } else { F::zero() });
        let total_variance = eigvals.sum();

        // (embedding_size, n_features), one principal direction per row
        let mut components = eigvecs.slice(s![.., ..self.embedding_size]).t().to_owned();
        for mut component in components.rows_mut() {
            // deterministic sign: the largest loading is positive
            let pivot = component.iter().fold(F::zero(), |pivot, &v| {
                if num_traits::Float::abs(v) > num_traits::Float::abs(pivot) {
                    v
                } else {
                    pivot
                }
            });
            if pivot < F::zero() {
                component.mapv_inplace(|v| -v);
            }
        }

        let explained_variance = eigvals.slice(s![..self.embedding_size]).to_owned();
        let explained_variance_ratio = if total_variance > F::zero() {
            &explained_variance / total_variance
        } else {
            Array1::zeros(self.embedding_size)
        };
        tracing::debug!(
            n_components = self.embedding_size,
            total_variance = %total_variance,
            "pca fitted"
        );

        Ok(Pca {
            embedding: components,
            explained_variance,
            explained_variance_ratio,
            mean,
        })
    }
}

/// Fitted Principal Component Analysis model
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Pca<F> {
    embedding: Array2<F>,
    explained_variance: Array1<F>,
    explained_variance_ratio: Array1<F>,
    mean: Array1<F>,
}

impl Pca<f32> {
    pub fn params(size: usize) -> PcaParams {
        PcaParams::new(size)
    }
}

impl<F: Float> Pca<F> {
    /// Principal directions with shape `(n_components, n_features)`
    pub fn components(&self) -> &Array2<F> {
        &self.embedding
    }

    /// Variance of the data along each principal direction
    pub fn explained_variance(&self) -> &Array1<F> {
        &self.explained_variance
    }

    /// Share of the total variance captured by each component
    ///
    /// All zero when the data has no variance at all.
    pub fn explained_variance_ratio(&self) -> &Array1<F> {
        &self.explained_variance_ratio
    }

    /// Feature means subtracted before projecting
    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }
}

impl<F: Float, D: Data<Elem = F>> Transformer<&ArrayBase<D, Ix2>, Array2<F>> for Pca<F> {
    /// Project records with shape `(n_samples, n_features)` onto the principal components
    fn transform(&self, x: &ArrayBase<D, Ix2>) -> Array2<F> {
        (x - &self.mean).dot(&self.embedding.t())
    }
}
