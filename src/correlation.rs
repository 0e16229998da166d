//! Correlation analysis for dataset features
//!
use ndarray::{Array2, ArrayBase, Axis, Data, Ix2};

use crate::dataset::{DatasetBase, Records};
use crate::error::{Error, Result};
use crate::Float;

/// Calculate the Pearson Correlation Coefficients from a dataset
///
/// The coefficients describe the linear dependency between every pair of features. They are
/// arranged in a symmetric `(nfeatures, nfeatures)` matrix with ones on the diagonal. A feature
/// without any variance is not correlated with anything and gets a coefficient of zero.
///
/// ```
/// use segmenta::prelude::*;
/// use ndarray::array;
///
/// let dataset = DatasetBase::from(array![[1., 2.], [2., 4.], [3., 6.]]);
/// let corr = PearsonCorrelation::from_dataset(&dataset).unwrap();
/// let coeff: f64 = corr.get_coeffs()[(0, 1)];
/// assert!((coeff - 1.).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PearsonCorrelation<F> {
    pearson_coeffs: Array2<F>,
    feature_names: Vec<String>,
}

fn pearson_correlation<F: Float, D: Data<Elem = F>>(data: &ArrayBase<D, Ix2>) -> Result<Array2<F>> {
    let nobservations = data.nsamples();
    if nobservations < 2 {
        return Err(Error::NotEnoughSamples);
    }
    let nfeatures = data.nfeatures();

    // subtract mean
    let mean = data.mean_axis(Axis(0)).ok_or(Error::NotEnoughSamples)?;
    let denoised = data - &mean;
    let covariance = denoised.t().dot(&denoised) / F::cast(nobservations - 1);
    let std_devs = denoised.std_axis(Axis(0), F::one());

    let mut coeffs = Array2::zeros((nfeatures, nfeatures));
    for i in 0..nfeatures {
        coeffs[(i, i)] = F::one();
        for j in (i + 1)..nfeatures {
            let denominator = std_devs[i] * std_devs[j];
            let coeff = if denominator == F::zero() {
                F::zero()
            } else {
                covariance[(i, j)] / denominator
            };
            coeffs[(i, j)] = coeff;
            coeffs[(j, i)] = coeff;
        }
    }

    Ok(coeffs)
}

impl<F: Float> PearsonCorrelation<F> {
    /// Calculate the Pearson Correlation Coefficients from a dataset
    ///
    /// Fails when the dataset contains fewer than two samples.
    pub fn from_dataset<D: Data<Elem = F>, T>(
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<Self> {
        let pearson_coeffs = pearson_correlation(dataset.records())?;

        Ok(PearsonCorrelation {
            pearson_coeffs,
            feature_names: dataset.feature_names(),
        })
    }

    /// Return the Pearson's Correlation Coefficients
    ///
    /// The entry `(i, j)` is the coefficient between the features `i` and `j`.
    pub fn get_coeffs(&self) -> &Array2<F> {
        &self.pearson_coeffs
    }

    /// Return the feature names in the order of the coefficient matrix
    pub fn get_feature_names(&self) -> &[String] {
        &self.feature_names
    }
}
