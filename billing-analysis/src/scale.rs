//! Standardisation of the selected features
use ndarray::{Array1, Array2};
use segmenta::traits::{Fit, Transformer};
use segmenta::DatasetBase;
use segmenta_preprocessing::{FittedLinearScaler, LinearScaler};

use crate::aggregate::{FeatureRow, FeatureTable};
use crate::error::{AnalysisError, Result, Warning};
use crate::feature::FeatureSelection;

/// Selected features scaled to zero mean and unit population variance
///
/// Rows are aligned with the rows of the [`FeatureTable`] the matrix was built from. Columns
/// without variance are all zeros and reported as [`Warning::NumericDegenerate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledFeatures {
    selection: FeatureSelection,
    matrix: Array2<f64>,
    scaler: FittedLinearScaler<f64>,
    warnings: Vec<Warning>,
}

/// Scale the selected columns of a feature table
///
/// Fails with `InsufficientData` on an empty table.
pub fn scale_features(table: &FeatureTable, selection: &FeatureSelection) -> Result<ScaledFeatures> {
    if table.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "the feature table is empty".to_string(),
        ));
    }
    let raw = DatasetBase::from(table.matrix(selection));
    let scaler = LinearScaler::standard().fit(&raw)?;

    let warnings: Vec<Warning> = scaler
        .constant_features()
        .iter()
        .map(|&idx| {
            let feature = selection.features()[idx];
            tracing::warn!(feature = %feature, "feature has zero variance, scaled to 0");
            Warning::NumericDegenerate { feature }
        })
        .collect();
    let matrix = scaler.transform(raw.records().to_owned());

    Ok(ScaledFeatures {
        selection: selection.clone(),
        matrix,
        scaler,
        warnings,
    })
}

impl ScaledFeatures {
    pub fn selection(&self) -> &FeatureSelection {
        &self.selection
    }

    /// Scaled matrix with shape `(n_rows, n_selected_features)`
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Per column means used as offsets
    pub fn means(&self) -> &Array1<f64> {
        self.scaler.offsets()
    }

    /// Per column population standard deviations, 0 for degenerate columns
    pub fn std_devs(&self) -> &Array1<f64> {
        self.scaler.spreads()
    }

    pub fn scaler(&self) -> &FittedLinearScaler<f64> {
        &self.scaler
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Scale a feature row that was not part of the fitted table
    pub fn transform_row(&self, row: &FeatureRow) -> Result<Array1<f64>> {
        let raw: Array1<f64> = self.selection.iter().map(|f| f.extract(row)).collect();
        Ok(self.scaler.transform_row(raw.view())?)
    }
}
