//! Final k-means partition of the scaled feature rows
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use segmenta::metrics::{CalinskiHarabaszScore, DaviesBouldinScore, SilhouetteScore};
use segmenta::traits::Predict;
use segmenta::DatasetBase;
use segmenta_clustering::KMeans;

use crate::aggregate::FeatureRow;
use crate::error::{AnalysisError, Result};
use crate::params::AnalysisValidParams;
use crate::scale::ScaledFeatures;
use crate::selection::ModelChain;

/// Assignment of every feature row to one of `k` clusters, with the fitted model
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    k: usize,
    labels: Array1<usize>,
    model: KMeans<f64>,
    silhouette: f64,
    calinski_harabasz: f64,
    davies_bouldin: f64,
}

/// Fit the final model for `k` clusters
///
/// `k` has to lie in `2..=max_k`. Asking for more clusters than distinct rows fails with
/// `InsufficientData`. The model is the one the model selection sweep scores for `k`, so the
/// same data, `k` and seed always give the same labels and the same scores as the sweep.
pub fn partition(
    scaled: &ScaledFeatures,
    k: usize,
    params: &AnalysisValidParams,
) -> Result<Partition> {
    if k < 2 || k > params.max_k() {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "the number of clusters must lie in 2..={}, got {}",
            params.max_k(),
            k
        )));
    }
    let observations = scaled.matrix().view();
    let model = ModelChain::new(observations, params).fit_up_to(k)?;
    let partition = Partition::from_model(observations, model)?;
    tracing::info!(
        k,
        inertia = partition.inertia(),
        silhouette = partition.silhouette(),
        calinski_harabasz = partition.calinski_harabasz(),
        davies_bouldin = partition.davies_bouldin(),
        "partition fitted"
    );
    Ok(partition)
}

impl Partition {
    /// Label the observations a model was fitted on and score the labels
    pub(crate) fn from_model(observations: ArrayView2<f64>, model: KMeans<f64>) -> Result<Self> {
        let labels: Array1<usize> = model.predict(&observations);
        let labeled = DatasetBase::new(observations, labels.view());
        let silhouette = labeled.silhouette_score()?;
        let calinski_harabasz = labeled.calinski_harabasz_score()?;
        let davies_bouldin = labeled.davies_bouldin_score()?;
        Ok(Partition {
            k: model.centroids().nrows(),
            labels,
            model,
            silhouette,
            calinski_harabasz,
            davies_bouldin,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Cluster of every feature row, in table order
    pub fn labels(&self) -> &Array1<usize> {
        &self.labels
    }

    pub fn model(&self) -> &KMeans<f64> {
        &self.model
    }

    /// Centroids in scaled units with shape `(k, n_selected_features)`
    pub fn centroids(&self) -> &Array2<f64> {
        self.model.centroids()
    }

    pub fn inertia(&self) -> f64 {
        self.model.inertia()
    }

    pub fn silhouette(&self) -> f64 {
        self.silhouette
    }

    pub fn calinski_harabasz(&self) -> f64 {
        self.calinski_harabasz
    }

    pub fn davies_bouldin(&self) -> f64 {
        self.davies_bouldin
    }

    /// Number of rows per cluster
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }

    /// Nearest centroid of an already scaled point
    pub fn classify_scaled(&self, point: ArrayView1<f64>) -> Result<usize> {
        let expected = self.centroids().ncols();
        if point.len() != expected {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "point has {} features, the partition was fitted on {}",
                point.len(),
                expected
            )));
        }
        Ok(self.model.predict(&point))
    }

    /// Scale a new feature row with the fitted parameters and return its nearest centroid
    pub fn classify(&self, scaled: &ScaledFeatures, row: &FeatureRow) -> Result<usize> {
        let point = scaled.transform_row(row)?;
        self.classify_scaled(point.view())
    }
}
