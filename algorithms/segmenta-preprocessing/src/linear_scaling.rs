//! Linear Scaling methods

use crate::error::{PreprocessingError, Result};
use approx::abs_diff_eq;
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Axis, Data, Ix2, Zip};
use segmenta::dataset::DatasetBase;
use segmenta::traits::{Fit, Transformer};
use segmenta::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// Possible scaling methods for [LinearScaler](struct.LinearScaler.html)
///
/// * Standard: subtracts the mean of each feature and scales it by the inverse of its population
///   standard deviation
/// * MinMax (min, max): scales each feature to fit in the range [min,max], default values are [0,1]
pub enum ScalingMethod<F: Float> {
    Standard,
    MinMax(F, F),
}

impl<F: Float> std::fmt::Display for ScalingMethod<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalingMethod::Standard => write!(f, "Standard scaler"),
            ScalingMethod::MinMax(min, max) => {
                write!(f, "Min-Max scaler (min = {}, max = {})", min, max)
            }
        }
    }
}

/// Linear Scaler: learns scaling parameters, according to the specified
/// [method](enum.ScalingMethod.html), from a dataset, producing a
/// [fitted linear scaler](struct.FittedLinearScaler.html) that can be used to scale different
/// datasets using the same parameters.
///
/// Constant features are never divided by a zero spread. They are shifted onto the lower end of
/// the target range (zero for standard scaling) and reported by
/// [`FittedLinearScaler::constant_features`].
///
/// ### Example
///
/// ```rust
/// use segmenta::traits::{Fit, Transformer};
/// use segmenta::DatasetBase;
/// use segmenta_preprocessing::linear_scaling::LinearScaler;
/// use ndarray::array;
///
/// let dataset = DatasetBase::from(array![[1., 10.], [2., 10.], [3., 10.]]);
/// // Learn scaling parameters
/// let scaler = LinearScaler::standard().fit(&dataset).unwrap();
/// assert_eq!(scaler.constant_features(), &[1]);
/// // scale dataset according to parameters
/// let dataset = scaler.transform(dataset);
/// assert_eq!(dataset.records().column(1).to_vec(), vec![0., 0., 0.]);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct LinearScaler<F: Float> {
    method: ScalingMethod<F>,
}

impl<F: Float> LinearScaler<F> {
    /// Initializes the scaler with the specified method.
    pub fn new(method: ScalingMethod<F>) -> Self {
        Self { method }
    }

    /// Setter for the scaler method
    pub fn method(mut self, method: ScalingMethod<F>) -> Self {
        self.method = method;
        self
    }

    /// Initializes a Standard scaler
    pub fn standard() -> Self {
        Self {
            method: ScalingMethod::Standard,
        }
    }

    /// Initializes a MinMax scaler with range [0,1]
    pub fn min_max() -> Self {
        Self {
            method: ScalingMethod::MinMax(F::zero(), F::one()),
        }
    }

    /// Initializes a MinMax scaler with the specified minimum and maximum values for the range.
    ///
    /// If `min` is bigger than `max` then fitting will return an error on any input.
    pub fn min_max_range(min: F, max: F) -> Self {
        Self {
            method: ScalingMethod::MinMax(min, max),
        }
    }
}

impl<F: Float, D: Data<Elem = F>, T> Fit<ArrayBase<D, Ix2>, T, PreprocessingError>
    for LinearScaler<F>
{
    type Object = FittedLinearScaler<F>;

    /// Fits the input dataset according to the scaler [method](enum.ScalingMethod.html). Will
    /// return an error if the dataset does not contain any samples or (in the case of MinMax
    /// scaling) if the specified range is not valid.
    fn fit(&self, x: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        match &self.method {
            ScalingMethod::Standard => FittedLinearScaler::standard(x.records()),
            ScalingMethod::MinMax(min, max) => FittedLinearScaler::min_max(x.records(), *min, *max),
        }
    }
}

/// The result of fitting a [linear scaler](struct.LinearScaler.html).
/// Scales datasets with the parameters learned during fitting.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct FittedLinearScaler<F: Float> {
    offsets: Array1<F>,
    scales: Array1<F>,
    spreads: Array1<F>,
    constant_features: Vec<usize>,
    method: ScalingMethod<F>,
}

/// A column counts as constant when all values are identical or its spread is numerically zero.
fn is_constant<F: Float>(column: &ArrayView1<F>, spread: F) -> bool {
    let first = column[0];
    column.iter().all(|&v| v == first) || abs_diff_eq!(spread, F::zero())
}

impl<F: Float> FittedLinearScaler<F> {
    pub(crate) fn standard<D: Data<Elem = F>>(records: &ArrayBase<D, Ix2>) -> Result<Self> {
        if records.nrows() == 0 {
            return Err(PreprocessingError::NotEnoughSamples);
        }
        let mut offsets = records
            .mean_axis(Axis(0))
            .ok_or(PreprocessingError::NotEnoughSamples)?;
        let mut spreads = records.std_axis(Axis(0), F::zero());
        let mut scales = Array1::ones(records.ncols());
        let mut constant_features = Vec::new();

        for (idx, column) in records.columns().into_iter().enumerate() {
            if is_constant(&column, spreads[idx]) {
                // shift by an actual value so the training column becomes exactly zero
                offsets[idx] = column[0];
                spreads[idx] = F::zero();
                constant_features.push(idx);
            } else {
                scales[idx] = F::one() / spreads[idx];
            }
        }

        Ok(Self {
            offsets,
            scales,
            spreads,
            constant_features,
            method: ScalingMethod::Standard,
        })
    }

    pub(crate) fn min_max<D: Data<Elem = F>>(
        records: &ArrayBase<D, Ix2>,
        min: F,
        max: F,
    ) -> Result<Self> {
        if records.nrows() == 0 {
            return Err(PreprocessingError::NotEnoughSamples);
        }
        if min > max {
            return Err(PreprocessingError::FlippedMinMaxRange);
        }
        let mins = records.fold_axis(
            Axis(0),
            F::infinity(),
            |&prev, &x| if x < prev { x } else { prev },
        );
        let maxs = records.fold_axis(
            Axis(0),
            F::neg_infinity(),
            |&prev, &x| if x > prev { x } else { prev },
        );
        let mut spreads = &maxs - &mins;
        let mut scales = Array1::ones(records.ncols());
        let mut constant_features = Vec::new();

        for (idx, column) in records.columns().into_iter().enumerate() {
            if is_constant(&column, spreads[idx]) {
                spreads[idx] = F::zero();
                constant_features.push(idx);
            } else {
                scales[idx] = F::one() / spreads[idx];
            }
        }

        Ok(Self {
            offsets: mins,
            scales,
            spreads,
            constant_features,
            method: ScalingMethod::MinMax(min, max),
        })
    }

    /// Array of size `n_features` that contains the offset that will be subtracted to each feature
    pub fn offsets(&self) -> &Array1<F> {
        &self.offsets
    }

    /// Array of size `n_features` that contains the scale that will be applied to each feature
    pub fn scales(&self) -> &Array1<F> {
        &self.scales
    }

    /// Spread of every feature in the fitted data
    ///
    /// This is the population standard deviation for standard scaling and the range `max - min`
    /// for min-max scaling.
    pub fn spreads(&self) -> &Array1<F> {
        &self.spreads
    }

    /// Indices of the features without any variation in the fitted data
    pub fn constant_features(&self) -> &[usize] {
        &self.constant_features
    }

    /// Number of features the scaler was fitted on
    pub fn nfeatures(&self) -> usize {
        self.offsets.len()
    }

    /// Returns the method used for fitting. Useful for printing, since
    /// [ScalingMethod](enum.ScalingMethod.html) implements `Display`
    pub fn method(&self) -> &ScalingMethod<F> {
        &self.method
    }

    /// Scales a single observation with the fitted parameters
    pub fn transform_row(&self, row: ArrayView1<F>) -> Result<Array1<F>> {
        if row.len() != self.nfeatures() {
            return Err(PreprocessingError::FeatureMismatch {
                expected: self.nfeatures(),
                found: row.len(),
            });
        }
        let row = row.insert_axis(Axis(0)).to_owned();
        Ok(self.transform(row).row(0).to_owned())
    }
}

impl<F: Float> Transformer<Array2<F>, Array2<F>> for FittedLinearScaler<F> {
    /// Scales an array of size (nsamples, nfeatures) according to the scaler's `offsets` and `scales`.
    /// Panics if the shape of the input array is not compatible with the shape of the dataset used for fitting.
    fn transform(&self, x: Array2<F>) -> Array2<F> {
        if x.is_empty() {
            return x;
        }
        let mut x = x;
        Zip::from(x.columns_mut())
            .and(self.offsets())
            .and(self.scales())
            .for_each(|mut col, &offset, &scale| {
                col.mapv_inplace(|el| (el - offset) * scale);
            });
        match &self.method {
            ScalingMethod::MinMax(min, max) => x * (*max - *min) + *min,
            ScalingMethod::Standard => x,
        }
    }
}

impl<F: Float, D: Data<Elem = F>, T>
    Transformer<DatasetBase<ArrayBase<D, Ix2>, T>, DatasetBase<Array2<F>, T>>
    for FittedLinearScaler<F>
{
    /// Substitutes the records of the dataset with their scaled version.
    /// Panics if the shape of the records is not compatible with the shape of the dataset used for fitting.
    fn transform(&self, x: DatasetBase<ArrayBase<D, Ix2>, T>) -> DatasetBase<Array2<F>, T> {
        let transformed_records = self.transform(x.records.to_owned());
        x.with_records(transformed_records)
    }
}
