//! Planar and spatial PCA embeddings of the scaled features, for display only
use ndarray::{s, Array1, Array2, ArrayView2};
use segmenta::traits::{Fit, Transformer};
use segmenta::DatasetBase;
use segmenta_reduction::Pca;

use crate::error::Result;
use crate::scale::ScaledFeatures;

/// Coordinates of every row on the leading principal components
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    coordinates: Array2<f64>,
    explained_variance_ratio: Array1<f64>,
}

impl Embedding {
    /// Shape `(n_rows, n_components)`, row aligned with the feature table
    pub fn coordinates(&self) -> &Array2<f64> {
        &self.coordinates
    }

    /// Share of the total variance captured by each component
    pub fn explained_variance_ratio(&self) -> &Array1<f64> {
        &self.explained_variance_ratio
    }

    pub fn n_components(&self) -> usize {
        self.coordinates.ncols()
    }
}

/// Independently fitted 2D and 3D embeddings
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    planar: Embedding,
    spatial: Embedding,
}

impl Projection {
    pub fn planar(&self) -> &Embedding {
        &self.planar
    }

    pub fn spatial(&self) -> &Embedding {
        &self.spatial
    }
}

/// Project the scaled features onto 2 and 3 principal components
pub fn project(scaled: &ScaledFeatures) -> Result<Projection> {
    let observations = scaled.matrix().view();
    Ok(Projection {
        planar: embed(observations, 2)?,
        spatial: embed(observations, 3)?,
    })
}

/// Components that the data cannot provide, because there are fewer features or fewer than two
/// rows, are zero columns with a zero variance ratio.
fn embed(observations: ArrayView2<f64>, n_components: usize) -> Result<Embedding> {
    let (n_rows, n_features) = observations.dim();
    let mut coordinates = Array2::zeros((n_rows, n_components));
    let mut explained_variance_ratio = Array1::zeros(n_components);

    let fitted = n_components.min(n_features);
    if n_rows >= 2 && fitted > 0 {
        let pca = Pca::params(fitted).fit(&DatasetBase::from(observations))?;
        coordinates
            .slice_mut(s![.., ..fitted])
            .assign(&pca.transform(&observations));
        explained_variance_ratio
            .slice_mut(s![..fitted])
            .assign(pca.explained_variance_ratio());
    }
    tracing::debug!(n_components, fitted, "embedding computed");

    Ok(Embedding {
        coordinates,
        explained_variance_ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::feature::{Feature, FeatureSelection};
    use crate::record::RawRecord;
    use crate::scale::scale_features;
    use approx::assert_abs_diff_eq;
    use ndarray::Axis;

    fn scaled(selection: &[Feature]) -> ScaledFeatures {
        let table = aggregate(&[
            RawRecord::new("A", "Cobre", "Telefonia")
                .lines(10)
                .value(50.)
                .speeds(1., 1.),
            RawRecord::new("B", "Cobre", "Telefonia")
                .lines(30)
                .value(20.)
                .speeds(3., 1.),
            RawRecord::new("C", "Fibra", "Internet")
                .lines(400)
                .value(9000.)
                .speeds(300., 100.),
            RawRecord::new("D", "Fibra", "Internet")
                .lines(20)
                .value(9100.)
                .speeds(500., 250.),
            RawRecord::new("E", "HFC", "Internet")
                .lines(410)
                .value(700.)
                .speeds(100., 10.),
        ]);
        let selection = FeatureSelection::new(selection.iter().copied()).unwrap();
        scale_features(&table, &selection).unwrap()
    }

    #[test]
    fn planar_and_spatial_shapes() {
        let scaled = scaled(&[
            Feature::Lines,
            Feature::Value,
            Feature::Downstream,
            Feature::Upstream,
        ]);
        let projection = project(&scaled).unwrap();
        assert_eq!(projection.planar().coordinates().dim(), (5, 2));
        assert_eq!(projection.spatial().coordinates().dim(), (5, 3));

        let planar = projection.planar().explained_variance_ratio();
        let spatial = projection.spatial().explained_variance_ratio();
        assert!(planar[0] >= planar[1]);
        assert!(spatial.sum() <= 1. + 1e-12);
        // the first two spatial components are the planar ones
        assert_abs_diff_eq!(*planar, spatial.slice(s![..2]).to_owned(), epsilon = 1e-9);
    }

    #[test]
    fn coordinates_are_centered() {
        let scaled = scaled(&[Feature::Lines, Feature::Value, Feature::Downstream]);
        let projection = project(&scaled).unwrap();
        assert_abs_diff_eq!(
            projection.spatial().coordinates().mean_axis(Axis(0)).unwrap(),
            Array1::<f64>::zeros(3),
            epsilon = 1e-9
        );
        // three standardised features keep all of the variance in three components
        assert_abs_diff_eq!(
            projection.spatial().explained_variance_ratio().sum(),
            1.,
            epsilon = 1e-9
        );
    }

    #[test]
    fn missing_components_are_zero() {
        let scaled = scaled(&[Feature::Lines, Feature::Value]);
        let spatial = project(&scaled).unwrap().spatial().clone();
        assert_eq!(spatial.n_components(), 3);
        assert_abs_diff_eq!(spatial.coordinates().column(2).to_owned(), Array1::<f64>::zeros(5));
        assert_eq!(spatial.explained_variance_ratio()[2], 0.);
    }

    #[test]
    fn single_row_projects_to_origin() {
        let table = aggregate(&[RawRecord::new("A", "Cobre", "Telefonia").lines(3).value(1.)]);
        let scaled = scale_features(&table, &FeatureSelection::default()).unwrap();
        let projection = project(&scaled).unwrap();
        assert_abs_diff_eq!(*projection.planar().coordinates(), Array2::<f64>::zeros((1, 2)));
        assert_abs_diff_eq!(
            *projection.planar().explained_variance_ratio(),
            Array1::<f64>::zeros(2)
        );
    }
}
