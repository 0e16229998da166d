//! Sweep over the number of clusters with internal validity metrics
//!
//! Every candidate `k` is fitted with the seeded k-means of the session parameters and scored
//! with the silhouette coefficient, the Calinski-Harabasz index and the Davies-Bouldin index on
//! the same labels. Inertia is reported for elbow inspection only.
//!
//! The models come from a [`ModelChain`]. The Partition Engine walks the same chain, so the
//! partition returned for a `k` is the model that was scored for it.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use ndarray::{concatenate, Array1, ArrayView2, Axis};
use ndarray_stats::QuantileExt;
use segmenta::traits::{Fit, Transformer};
use segmenta::DatasetBase;
use segmenta_clustering::{count_distinct_rows, KMeans, KMeansInit};

use crate::error::{AnalysisError, Result, Warning};
use crate::params::AnalysisValidParams;
use crate::partition::Partition;
use crate::scale::ScaledFeatures;

/// Validity scores of the model fitted for one `k`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateMetrics {
    pub k: usize,
    /// Sum of squared distances to the closest centroid
    pub inertia: f64,
    /// In `[-1, 1]`, higher is better
    pub silhouette: f64,
    /// Higher is better
    pub calinski_harabasz: f64,
    /// Lower is better
    pub davies_bouldin: f64,
}

impl From<&Partition> for CandidateMetrics {
    fn from(partition: &Partition) -> Self {
        CandidateMetrics {
            k: partition.k(),
            inertia: partition.inertia(),
            silhouette: partition.silhouette(),
            calinski_harabasz: partition.calinski_harabasz(),
            davies_bouldin: partition.davies_bouldin(),
        }
    }
}

/// Result of a sweep: one [`CandidateMetrics`] per evaluated `k` and the best `k` per metric
///
/// The three recommendations are independent and may disagree. Ties go to the smallest `k`.
/// The fitted partition of every candidate is kept for [`ModelSelection::partition`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSelection {
    candidates: Vec<CandidateMetrics>,
    partitions: Vec<Partition>,
    best_silhouette_k: usize,
    best_calinski_harabasz_k: usize,
    best_davies_bouldin_k: usize,
    warnings: Vec<Warning>,
}

/// Best `k` for silhouette, Calinski-Harabasz and Davies-Bouldin, first one on ties
fn best_ks(candidates: &[CandidateMetrics]) -> Option<(usize, usize, usize)> {
    let first = candidates.first()?;
    let (mut silhouette, mut calinski_harabasz, mut davies_bouldin) = (first, first, first);
    for candidate in &candidates[1..] {
        if candidate.silhouette > silhouette.silhouette {
            silhouette = candidate;
        }
        if candidate.calinski_harabasz > calinski_harabasz.calinski_harabasz {
            calinski_harabasz = candidate;
        }
        if candidate.davies_bouldin < davies_bouldin.davies_bouldin {
            davies_bouldin = candidate;
        }
    }
    Some((silhouette.k, calinski_harabasz.k, davies_bouldin.k))
}

impl ModelSelection {
    fn from_partitions(partitions: Vec<Partition>, warnings: Vec<Warning>) -> Result<Self> {
        let candidates: Vec<CandidateMetrics> =
            partitions.iter().map(CandidateMetrics::from).collect();
        let (best_silhouette_k, best_calinski_harabasz_k, best_davies_bouldin_k) =
            best_ks(&candidates).ok_or_else(|| {
                AnalysisError::InsufficientData("no cluster count could be evaluated".to_string())
            })?;
        Ok(ModelSelection {
            candidates,
            partitions,
            best_silhouette_k,
            best_calinski_harabasz_k,
            best_davies_bouldin_k,
            warnings,
        })
    }

    pub fn candidates(&self) -> &[CandidateMetrics] {
        &self.candidates
    }

    pub fn candidate(&self, k: usize) -> Option<&CandidateMetrics> {
        self.candidates.iter().find(|c| c.k == k)
    }

    /// Partition fitted for `k` during the sweep
    pub fn partition(&self, k: usize) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.k() == k)
    }

    /// Evaluated cluster counts, `2..=max_k` unless truncated
    pub fn ks(&self) -> Vec<usize> {
        self.candidates.iter().map(|c| c.k).collect()
    }

    pub fn inertias(&self) -> Array1<f64> {
        self.candidates.iter().map(|c| c.inertia).collect()
    }

    /// Largest evaluated `k`
    pub fn max_k(&self) -> usize {
        self.candidates.last().map_or(0, |c| c.k)
    }

    /// `k` with the highest silhouette coefficient
    pub fn best_silhouette_k(&self) -> usize {
        self.best_silhouette_k
    }

    /// `k` with the highest Calinski-Harabasz index
    pub fn best_calinski_harabasz_k(&self) -> usize {
        self.best_calinski_harabasz_k
    }

    /// `k` with the lowest Davies-Bouldin index
    pub fn best_davies_bouldin_k(&self) -> usize {
        self.best_davies_bouldin_k
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

/// Shared flag to stop a running sweep before its next candidate
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// K-means models for `k = 2, 3, ...`, each fitted with knowledge of the previous one
///
/// `k = 2` is the plain seeded fit with `n_runs` re-initialisations. Every later `k` is fitted
/// the same way and again from the centroids of `k - 1` plus the row farthest from them, and
/// the lower of the two inertias wins. The warm start can only lower the inertia of the
/// previous model, so inertia never increases along the chain.
pub(crate) struct ModelChain<'a> {
    observations: ArrayView2<'a, f64>,
    params: &'a AnalysisValidParams,
    k: usize,
    previous: Option<KMeans<f64>>,
}

impl<'a> ModelChain<'a> {
    pub(crate) fn new(observations: ArrayView2<'a, f64>, params: &'a AnalysisValidParams) -> Self {
        ModelChain {
            observations,
            params,
            k: 1,
            previous: None,
        }
    }

    /// Fit the model of the next `k`
    pub(crate) fn advance(&mut self) -> Result<&KMeans<f64>> {
        let k = self.k + 1;
        let model = self.fit(k)?;
        self.k = k;
        Ok(&*self.previous.insert(model))
    }

    /// Walk the chain up to `k` and return its model
    pub(crate) fn fit_up_to(mut self, k: usize) -> Result<KMeans<f64>> {
        while self.k < k {
            self.advance()?;
        }
        self.previous.ok_or_else(|| {
            AnalysisError::InvalidConfiguration(format!("no model for {} clusters", k))
        })
    }

    fn fit(&self, k: usize) -> Result<KMeans<f64>> {
        let dataset = DatasetBase::from(self.observations);
        let model = self.params.kmeans(k).fit(&dataset)?;
        let previous = match &self.previous {
            Some(previous) => previous,
            None => return Ok(model),
        };

        let farthest = previous
            .transform(&self.observations)
            .argmax()
            .map_err(|err| AnalysisError::InsufficientData(err.to_string()))?;
        let initial = concatenate(
            Axis(0),
            &[
                previous.centroids().view(),
                self.observations.row(farthest).insert_axis(Axis(0)),
            ],
        )
        .map_err(segmenta::error::Error::from)?;
        let warm = self
            .params
            .kmeans(k)
            .init_method(KMeansInit::Precomputed(initial))
            .fit(&dataset)?;

        Ok(if warm.inertia() < model.inertia() {
            warm
        } else {
            model
        })
    }
}

/// Evaluate every `k` in `2..=max_k`
///
/// The range stops at the number of distinct rows of the scaled matrix, in which case a
/// [`Warning::RangeTruncated`] is attached. Fewer than two distinct rows is `InsufficientData`.
pub fn select_model(scaled: &ScaledFeatures, params: &AnalysisValidParams) -> Result<ModelSelection> {
    select_model_with_cancel(scaled, params, &CancelToken::new())
}

/// Same as [`select_model`], checking `cancel` before every candidate
pub fn select_model_with_cancel(
    scaled: &ScaledFeatures,
    params: &AnalysisValidParams,
    cancel: &CancelToken,
) -> Result<ModelSelection> {
    let observations = scaled.matrix().view();
    let n_distinct = count_distinct_rows(&observations);
    if n_distinct < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "at least 2 distinct feature rows are needed, found {}",
            n_distinct
        )));
    }

    let mut warnings = Vec::new();
    let last_k = params.max_k().min(n_distinct);
    if last_k < params.max_k() {
        tracing::warn!(
            requested = params.max_k(),
            evaluated = last_k,
            "not enough distinct rows for the whole range"
        );
        warnings.push(Warning::RangeTruncated {
            requested: params.max_k(),
            evaluated: last_k,
        });
    }

    let mut chain = ModelChain::new(observations, params);
    let mut partitions = Vec::with_capacity(last_k - 1);
    for k in 2..=last_k {
        if cancel.is_cancelled() {
            tracing::info!(k, "model selection cancelled");
            return Err(AnalysisError::Cancelled);
        }
        let model = chain.advance()?.clone();
        let fitted = Partition::from_model(observations, model)?;
        tracing::debug!(
            k,
            inertia = fitted.inertia(),
            silhouette = fitted.silhouette(),
            calinski_harabasz = fitted.calinski_harabasz(),
            davies_bouldin = fitted.davies_bouldin(),
            "candidate evaluated"
        );
        partitions.push(fitted);
    }

    let selection = ModelSelection::from_partitions(partitions, warnings)?;
    tracing::info!(
        max_k = selection.max_k(),
        best_silhouette_k = selection.best_silhouette_k(),
        best_calinski_harabasz_k = selection.best_calinski_harabasz_k(),
        best_davies_bouldin_k = selection.best_davies_bouldin_k(),
        "model selection finished"
    );
    Ok(selection)
}

/// A sweep running on its own thread
#[derive(Debug)]
pub struct SelectionHandle {
    cancel: CancelToken,
    handle: JoinHandle<Result<ModelSelection>>,
}

impl SelectionHandle {
    /// Ask the sweep to stop before its next candidate
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the sweep has finished or noticed the cancellation
    pub fn join(self) -> Result<ModelSelection> {
        self.handle
            .join()
            .map_err(|_| AnalysisError::WorkerPanicked)?
    }
}

/// Run [`select_model`] on a worker thread
pub fn spawn_selection(
    scaled: Arc<ScaledFeatures>,
    params: AnalysisValidParams,
) -> Result<SelectionHandle> {
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let handle = thread::Builder::new()
        .name("model-selection".to_string())
        .spawn(move || select_model_with_cancel(&scaled, &params, &token))?;
    Ok(SelectionHandle { cancel, handle })
}
