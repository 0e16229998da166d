//! Descriptive statistics and correlations of the selected features
use ndarray::{Array1, ArrayView1, Axis};
use ndarray_stats::{interpolate::Linear, QuantileExt};
use noisy_float::types::{n64, N64};
use segmenta::correlation::PearsonCorrelation;
use segmenta::DatasetBase;

use crate::aggregate::FeatureTable;
use crate::error::Result;
use crate::feature::{Feature, FeatureSelection};

/// Summary of one feature column
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStatistics {
    pub feature: Feature,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation, 0 for fewer than two rows
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
    /// `std / mean * 100`, 0 when the mean is 0
    pub coefficient_of_variation: f64,
}

impl FeatureStatistics {
    pub fn from_values(feature: Feature, values: &[f64]) -> Self {
        let column = ArrayView1::from(values);
        let count = column.len();
        let mean = column.mean().unwrap_or(0.);
        let std = if count < 2 { 0. } else { column.std(1.) };
        let coefficient_of_variation = if mean == 0. { 0. } else { std / mean * 100. };

        let mut ranked: Array1<N64> = column.iter().filter_map(|&v| N64::try_new(v)).collect();
        // linear interpolation between the closest ranks, 0 for an empty column
        let mut quantile = |q: f64| {
            ranked
                .quantile_axis_mut(Axis(0), n64(q), &Linear)
                .map(|value| value.into_scalar().raw())
                .unwrap_or(0.)
        };

        FeatureStatistics {
            feature,
            count,
            mean,
            std,
            min: quantile(0.),
            q25: quantile(0.25),
            median: quantile(0.5),
            q75: quantile(0.75),
            max: quantile(1.),
            coefficient_of_variation,
        }
    }
}

/// Statistics of every selected feature, in selection order
pub fn describe(table: &FeatureTable, selection: &FeatureSelection) -> Vec<FeatureStatistics> {
    selection
        .iter()
        .map(|feature| FeatureStatistics::from_values(feature, &table.column(feature).to_vec()))
        .collect()
}

/// Pearson correlation matrix of the selected features
///
/// Needs at least two rows.
pub fn correlation(
    table: &FeatureTable,
    selection: &FeatureSelection,
) -> Result<PearsonCorrelation<f64>> {
    let dataset =
        DatasetBase::from(table.matrix(selection)).with_feature_names(selection.column_names());
    Ok(PearsonCorrelation::from_dataset(&dataset)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::error::AnalysisError;
    use crate::record::RawRecord;
    use approx::assert_abs_diff_eq;

    #[test]
    fn quartiles_interpolate() {
        let stats = FeatureStatistics::from_values(Feature::Value, &[4., 1., 3., 2.]);
        assert_eq!(stats.count, 4);
        assert_abs_diff_eq!(stats.mean, 2.5);
        assert_abs_diff_eq!(stats.min, 1.);
        assert_abs_diff_eq!(stats.q25, 1.75);
        assert_abs_diff_eq!(stats.median, 2.5);
        assert_abs_diff_eq!(stats.q75, 3.25);
        assert_abs_diff_eq!(stats.max, 4.);
        assert_abs_diff_eq!(stats.std, (5f64 / 3.).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(
            stats.coefficient_of_variation,
            (5f64 / 3.).sqrt() / 2.5 * 100.,
            epsilon = 1e-10
        );
    }

    #[test]
    fn degenerate_columns() {
        let single = FeatureStatistics::from_values(Feature::Lines, &[7.]);
        assert_eq!(single.std, 0.);
        assert_eq!(single.median, 7.);
        let zeros = FeatureStatistics::from_values(Feature::Lines, &[0., 0.]);
        assert_eq!(zeros.coefficient_of_variation, 0.);
        let empty = FeatureStatistics::from_values(Feature::Lines, &[]);
        assert_eq!((empty.count, empty.mean, empty.median, empty.max), (0, 0., 0., 0.));
    }

    fn table() -> FeatureTable {
        aggregate(&[
            RawRecord::new("A", "Cobre", "Telefonia").lines(1).value(2.),
            RawRecord::new("B", "Cobre", "Telefonia").lines(2).value(4.),
            RawRecord::new("C", "Cobre", "Telefonia").lines(3).value(6.),
        ])
    }

    #[test]
    fn describe_follows_selection() {
        let selection = FeatureSelection::new([Feature::Value, Feature::Lines]).unwrap();
        let stats = describe(&table(), &selection);
        assert_eq!(stats[0].feature, Feature::Value);
        assert_abs_diff_eq!(stats[0].mean, 4.);
        assert_abs_diff_eq!(stats[1].max, 3.);
    }

    #[test]
    fn correlation_matrix() {
        let selection =
            FeatureSelection::new([Feature::Lines, Feature::Value, Feature::Departments]).unwrap();
        let corr = correlation(&table(), &selection).unwrap();
        let coeffs = corr.get_coeffs();
        assert_abs_diff_eq!(coeffs[(0, 1)], 1., epsilon = 1e-12);
        // constant department count
        assert_eq!(coeffs[(0, 2)], 0.);
        assert_eq!(coeffs[(2, 2)], 1.);
        assert_eq!(corr.get_feature_names()[1], "VALOR_FACTURADO_O_COBRADO");
    }

    #[test]
    fn correlation_needs_two_rows() {
        let table = aggregate(&[RawRecord::new("A", "Cobre", "Telefonia").lines(1)]);
        let res = correlation(&table, &FeatureSelection::default());
        assert!(matches!(res, Err(AnalysisError::Segmenta(_))));
    }
}
