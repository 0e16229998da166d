use std::collections::BTreeSet;

use crate::k_means::{KMeansParams, KMeansValidParams};
use crate::{k_means::errors::KMeansError, KMeansInit};
use ndarray::{
    Array1, Array2, ArrayBase, ArrayView, ArrayView1, Axis, Data, DataMut, Dimension, Ix1, Ix2, Zip,
};
use ndarray_stats::DeviationExt;
use ndarray_rand::rand::Rng;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use segmenta::traits::*;
use segmenta::{DatasetBase, Float};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// K-means clustering aims to partition a set of unlabeled observations into clusters,
/// where each observation belongs to the cluster with the nearest mean.
///
/// The mean of the points within a cluster is called *centroid*.
///
/// Given the set of centroids, you can assign an observation to a cluster
/// choosing the nearest centroid.
///
/// We provide the _standard algorithm_ (also known as Lloyd's Algorithm) with squared euclidean
/// distances. More details on the algorithm can be found in the next section or
/// [here](https://en.wikipedia.org/wiki/K-means_clustering).
///
/// ## Standard algorithm
///
/// K-means is an iterative algorithm: it progressively refines the choice of centroids.
///
/// It's guaranteed to converge, even though it might not find the optimal set of centroids
/// (unfortunately it can get stuck in a local minimum, finding the optimal minimum if NP-hard!).
///
/// There are three steps in the standard algorithm:
/// - initialisation step: select initial centroids using one of our provided algorithms.
/// - assignment step: assign each observation to the nearest cluster
///                    (minimum distance between the observation and the cluster's centroid);
/// - update step: recompute the centroid of each cluster.
///
/// The initialisation step is a one-off, done at the very beginning.
/// Assignment and update are repeated in a loop until convergence is reached (either the
/// squared euclidean distance between the old and the new centroids is below `tolerance` or
/// we exceed the `max_n_iterations`).
///
/// A cluster that loses all of its observations during the assignment step takes over the
/// observation farthest from its own centroid, so every cluster of the fitted model is populated.
///
/// The whole procedure is repeated `n_runs` times and the run with the lowest inertia wins. The
/// random generator is cloned from the hyperparameters at the start of every fit, so fitting the
/// same data twice with the same parameters gives the same model.
///
/// ## Parallelisation
///
/// The work performed by the assignment step does not require any coordination:
/// the closest centroid for each point can be computed independently from the
/// closest centroid for any of the remaining points.
///
/// This makes it a good candidate for parallel execution: `KMeans::fit` parallelises the
/// assignment step thanks to the `rayon` feature in `ndarray`.
///
/// ## Tutorial
///
/// ```
/// use segmenta::DatasetBase;
/// use segmenta::traits::{Fit, Predict};
/// use segmenta_clustering::{KMeans, generate_blobs};
/// use ndarray::{Axis, array};
/// use ndarray_rand::rand::SeedableRng;
/// use rand_xoshiro::Xoshiro256Plus;
/// use approx::assert_abs_diff_eq;
///
/// // Our random number generator, seeded for reproducibility
/// let mut rng = Xoshiro256Plus::seed_from_u64(42);
///
/// // `expected_centroids` has shape `(n_centroids, n_features)`
/// // i.e. three points in the 2-dimensional plane
/// let expected_centroids = array![[0., 1.], [-10., 20.], [-1., 10.]];
/// // Let's generate a synthetic dataset: three blobs of observations
/// // (100 points each) centered around our `expected_centroids`
/// let data = generate_blobs(100, &expected_centroids, &mut rng);
/// let n_clusters = expected_centroids.len_of(Axis(0));
///
/// let observations = DatasetBase::from(data);
/// // `n_clusters` is the only mandatory parameter, the others fall back to their defaults
/// let model = KMeans::params_with_rng(n_clusters, rng.clone())
///     .tolerance(1e-2)
///     .fit(&observations)
///     .expect("KMeans fitted");
///
/// // Once we found our set of centroids, we can also assign new points to the nearest cluster
/// let new_observation = DatasetBase::from(array![[-9., 20.5]]);
/// // Predict returns the **index** of the nearest cluster
/// let dataset = model.predict(new_observation);
/// // We can retrieve the actual centroid of the closest cluster using `.centroids()`
/// let closest_centroid = &model.centroids().index_axis(Axis(0), dataset.targets()[0]);
/// assert_abs_diff_eq!(closest_centroid.to_owned(), &array![-10., 20.], epsilon = 1e-1);
/// ```
pub struct KMeans<F: Float> {
    centroids: Array2<F>,
    cluster_count: Array1<F>,
    inertia: F,
    n_iterations: u64,
    converged: bool,
}

impl<F: Float> KMeans<F> {
    /// Hyperparameters with the default generator, a `Xoshiro256Plus` seeded with 42
    pub fn params(nclusters: usize) -> KMeansParams<F, Xoshiro256Plus> {
        KMeansParams::new(nclusters, Xoshiro256Plus::seed_from_u64(42))
    }

    pub fn params_with_rng<R: Rng>(nclusters: usize, rng: R) -> KMeansParams<F, R> {
        KMeansParams::new(nclusters, rng)
    }

    /// Return the set of centroids as a 2-dimensional matrix with shape
    /// `(n_centroids, n_features)`.
    pub fn centroids(&self) -> &Array2<F> {
        &self.centroids
    }

    /// Return the number of training points belonging to each cluster
    pub fn cluster_count(&self) -> &Array1<F> {
        &self.cluster_count
    }

    /// Return the sum of squared distances between each training point and its closest centroid
    pub fn inertia(&self) -> F {
        self.inertia
    }

    /// Number of Lloyd iterations performed by the winning run
    pub fn n_iterations(&self) -> u64 {
        self.n_iterations
    }

    /// Whether the winning run met the tolerance before `max_n_iterations`
    pub fn converged(&self) -> bool {
        self.converged
    }
}

/// Outcome of a single run, kept around while looking for the lowest inertia.
struct RunResult<F> {
    centroids: Array2<F>,
    memberships: Array1<usize>,
    inertia: F,
    n_iterations: u64,
    converged: bool,
}

impl<F: Float, R: Rng + Clone, DA: Data<Elem = F>, T> Fit<ArrayBase<DA, Ix2>, T, KMeansError>
    for KMeansValidParams<F, R>
{
    type Object = KMeans<F>;

    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `fit` identifies `n_clusters` centroids based on the training data distribution.
    ///
    /// Fails when the dataset contains fewer distinct observations than `n_clusters`.
    fn fit(
        &self,
        dataset: &DatasetBase<ArrayBase<DA, Ix2>, T>,
    ) -> Result<Self::Object, KMeansError> {
        let observations = dataset.records().view();
        let (n_samples, n_features) = observations.dim();
        if n_samples == 0 {
            return Err(segmenta::error::Error::NotEnoughSamples.into());
        }
        if let KMeansInit::Precomputed(centroids) = self.init_method() {
            if centroids.ncols() != n_features {
                return Err(KMeansError::CentroidDimension {
                    expected: n_features,
                    found: centroids.ncols(),
                });
            }
        }
        let n_distinct = count_distinct_rows(&observations);
        if n_distinct < self.n_clusters() {
            return Err(KMeansError::NotEnoughDistinctSamples {
                n_clusters: self.n_clusters(),
                n_distinct,
            });
        }

        let mut rng = self.rng().clone();
        // precomputed centroids give the same result on every run
        let n_runs = match self.init_method() {
            KMeansInit::Precomputed(_) => 1,
            _ => self.n_runs(),
        };

        let mut best: Option<RunResult<F>> = None;
        for run in 0..n_runs {
            let initial = self
                .init_method()
                .run(self.n_clusters(), observations, &mut rng);
            let result = self.lloyd(initial, &observations);
            tracing::trace!(
                run,
                n_iterations = result.n_iterations,
                inertia = %result.inertia,
                "k-means run finished"
            );
            if !result.converged {
                tracing::warn!(
                    run,
                    max_n_iterations = self.max_n_iterations(),
                    "k-means run stopped before reaching the tolerance"
                );
            }
            // We keep the centroids which minimize the inertia (defined as the sum of
            // the squared distances of the closest centroid for all observations)
            // over the n runs of the KMeans algorithm.
            if best.as_ref().map_or(true, |b| result.inertia < b.inertia) {
                best = Some(result);
            }
        }

        let best = best.ok_or(KMeansError::InertiaError)?;
        if !best.inertia.is_finite() {
            return Err(KMeansError::InertiaError);
        }
        let mut cluster_count = Array1::zeros(self.n_clusters());
        best.memberships
            .iter()
            .for_each(|&c| cluster_count[c] += F::one());
        tracing::debug!(
            n_clusters = self.n_clusters(),
            inertia = %best.inertia,
            n_iterations = best.n_iterations,
            "k-means fitted"
        );

        Ok(KMeans {
            centroids: best.centroids,
            cluster_count,
            inertia: best.inertia,
            n_iterations: best.n_iterations,
            converged: best.converged,
        })
    }
}

impl<F: Float, R: Rng> KMeansValidParams<F, R> {
    /// Runs assignment and update steps from the given centroids until convergence.
    fn lloyd(
        &self,
        mut centroids: Array2<F>,
        observations: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    ) -> RunResult<F> {
        let n_samples = observations.nrows();
        let mut memberships = Array1::zeros(n_samples);
        let mut dists = Array1::zeros(n_samples);
        let mut converged = false;
        let mut n_iterations = 0;

        while n_iterations < self.max_n_iterations() {
            n_iterations += 1;
            update_memberships_and_dists(&centroids, observations, &mut memberships, &mut dists);
            let repaired =
                repair_empty_clusters(&mut centroids, observations, &mut memberships, &mut dists);
            let new_centroids = compute_centroids(centroids.nrows(), observations, &memberships);
            let shift = squared_distance(centroids.view(), new_centroids.view());
            centroids = new_centroids;
            if !repaired && shift < self.tolerance() {
                converged = true;
                break;
            }
        }

        // final assignment against the last update, labels and inertia agree with `predict`
        for _ in 0..self.max_n_iterations() {
            update_memberships_and_dists(&centroids, observations, &mut memberships, &mut dists);
            if !repair_empty_clusters(&mut centroids, observations, &mut memberships, &mut dists) {
                break;
            }
        }

        RunResult {
            centroids,
            memberships,
            inertia: dists.sum(),
            n_iterations,
            converged,
        }
    }
}

impl<F: Float, DA: Data<Elem = F>> Transformer<&ArrayBase<DA, Ix2>, Array1<F>> for KMeans<F> {
    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `transform` returns, for each observation, its squared distance to its centroid.
    fn transform(&self, observations: &ArrayBase<DA, Ix2>) -> Array1<F> {
        let mut dists = Array1::zeros(observations.nrows());
        update_min_dists(&self.centroids, &observations.view(), &mut dists);
        dists
    }
}

impl<F: Float, DA: Data<Elem = F>> PredictInplace<ArrayBase<DA, Ix2>, Array1<usize>>
    for KMeans<F>
{
    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `predict` returns, for each observation, the index of the closest cluster/centroid.
    ///
    /// You can retrieve the centroid associated to an index using the
    /// [`centroids` method](#method.centroids).
    fn predict_inplace(&self, observations: &ArrayBase<DA, Ix2>, memberships: &mut Array1<usize>) {
        assert_eq!(
            observations.nrows(),
            memberships.len(),
            "The number of data points must match the number of memberships."
        );

        update_cluster_memberships(&self.centroids, &observations.view(), memberships);
    }

    fn default_target(&self, x: &ArrayBase<DA, Ix2>) -> Array1<usize> {
        Array1::zeros(x.nrows())
    }
}

impl<F: Float, DA: Data<Elem = F>> PredictInplace<ArrayBase<DA, Ix1>, usize> for KMeans<F> {
    /// Given one input observation, return the index of its closest cluster
    ///
    /// You can retrieve the centroid associated to an index using the
    /// [`centroids` method](#method.centroids).
    fn predict_inplace(&self, observation: &ArrayBase<DA, Ix1>, membership: &mut usize) {
        *membership = closest_centroid(&self.centroids, observation).0;
    }

    fn default_target(&self, _x: &ArrayBase<DA, Ix1>) -> usize {
        0
    }
}

/// Count the observations that differ in at least one feature
///
/// Positive and negative zero are treated as the same value.
pub fn count_distinct_rows<F: Float>(observations: &ArrayBase<impl Data<Elem = F>, Ix2>) -> usize {
    observations
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .map(|&x| {
                    let x = if x == F::zero() { F::zero() } else { x };
                    x.integer_decode()
                })
                .collect::<Vec<_>>()
        })
        .collect::<BTreeSet<_>>()
        .len()
}

/// K-means is an iterative algorithm.
/// We will perform the assignment and update steps until we are satisfied
/// (according to our convergence criteria).
///
/// `compute_centroids` returns a 2-dimensional array,
/// where the i-th row is the mean of the observations assigned to the i-th cluster.
/// Empty clusters are expected to be repaired before and end up at the origin otherwise.
fn compute_centroids<F: Float>(
    n_clusters: usize,
    // (n_observations, n_features)
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    // (n_observations,)
    cluster_memberships: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Array2<F> {
    let mut counts: Array1<usize> = Array1::zeros(n_clusters);
    let mut centroids = Array2::zeros((n_clusters, observations.ncols()));

    Zip::from(observations.rows())
        .and(cluster_memberships)
        .for_each(|observation, &cluster_membership| {
            let mut centroid = centroids.row_mut(cluster_membership);
            centroid += &observation;
            counts[cluster_membership] += 1;
        });

    Zip::from(centroids.rows_mut())
        .and(&counts)
        .for_each(|mut centroid, &cnt| {
            if cnt > 0 {
                centroid /= F::cast(cnt)
            }
        });
    centroids
}

/// Hand every empty cluster the observation farthest from its centroid.
///
/// Donors are taken from clusters with more than one member, the moved observation becomes the
/// centroid of the empty cluster. Returns whether anything was moved.
fn repair_empty_clusters<F: Float>(
    centroids: &mut Array2<F>,
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    memberships: &mut Array1<usize>,
    dists: &mut Array1<F>,
) -> bool {
    let n_clusters = centroids.nrows();
    let mut counts = vec![0usize; n_clusters];
    memberships.iter().for_each(|&c| counts[c] += 1);

    let mut repaired = false;
    for cluster in 0..n_clusters {
        if counts[cluster] > 0 {
            continue;
        }
        let mut donor: Option<(usize, F)> = None;
        for (idx, (&d, &c)) in dists.iter().zip(memberships.iter()).enumerate() {
            if counts[c] > 1 && donor.map_or(true, |(_, best)| d > best) {
                donor = Some((idx, d));
            }
        }
        if let Some((idx, _)) = donor {
            counts[memberships[idx]] -= 1;
            counts[cluster] = 1;
            memberships[idx] = cluster;
            dists[idx] = F::zero();
            centroids.row_mut(cluster).assign(&observations.row(idx));
            repaired = true;
        }
    }
    repaired
}

// Update `cluster_memberships` with the index of the cluster each observation belongs to.
pub(crate) fn update_cluster_memberships<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    cluster_memberships: &mut ArrayBase<impl DataMut<Elem = usize>, Ix1>,
) {
    Zip::from(observations.axis_iter(Axis(0)))
        .and(cluster_memberships)
        .par_for_each(|observation, cluster_membership| {
            *cluster_membership = closest_centroid(centroids, &observation).0
        });
}

// Updates `dists` with the squared distance of each observation from its closest centroid.
pub(crate) fn update_min_dists<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    dists: &mut ArrayBase<impl DataMut<Elem = F>, Ix1>,
) {
    Zip::from(observations.axis_iter(Axis(0)))
        .and(dists)
        .par_for_each(|observation, dist| *dist = closest_centroid(centroids, &observation).1);
}

// Efficient combination of `update_cluster_memberships` and `update_min_dists`.
pub(crate) fn update_memberships_and_dists<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    cluster_memberships: &mut ArrayBase<impl DataMut<Elem = usize>, Ix1>,
    dists: &mut ArrayBase<impl DataMut<Elem = F>, Ix1>,
) {
    Zip::from(observations.axis_iter(Axis(0)))
        .and(cluster_memberships)
        .and(dists)
        .par_for_each(|observation, cluster_membership, dist| {
            let (m, d) = closest_centroid(centroids, &observation);
            *cluster_membership = m;
            *dist = d;
        });
}

/// Squared euclidean distance, also used for the centroid shift of whole matrices
fn squared_distance<F: Float, D: Dimension>(a: ArrayView<F, D>, b: ArrayView<F, D>) -> F {
    // shapes always agree here, an empty feature space is the only failure and sits at distance 0
    a.sq_l2_dist(&b).unwrap_or_else(|_| F::zero())
}

/// Given a matrix of centroids with shape (n_centroids, n_features) and an observation,
/// return the index of the closest centroid (the index of the corresponding row in `centroids`)
/// and the squared distance to it. Ties go to the lowest index.
pub(crate) fn closest_centroid<F: Float>(
    // (n_centroids, n_features)
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    // (n_features)
    observation: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> (usize, F) {
    let observation: ArrayView1<F> = observation.view();
    let first_centroid = centroids.row(0);
    let (mut closest_index, mut minimum_distance) =
        (0, squared_distance(first_centroid, observation));

    for (centroid_index, centroid) in centroids.rows().into_iter().enumerate().skip(1) {
        let distance = squared_distance(centroid, observation);
        if distance < minimum_distance {
            closest_index = centroid_index;
            minimum_distance = distance;
        }
    }
    (closest_index, minimum_distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_blobs;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, concatenate, Array, Array1, Array2, Axis};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    fn function_test_1d(x: &Array2<f64>) -> Array2<f64> {
        let mut y = Array2::zeros(x.dim());
        Zip::from(&mut y).and(x).for_each(|yi, &xi| {
            if xi < 0.4 {
                *yi = xi * xi;
            } else if (0.4..0.8).contains(&xi) {
                *yi = 3. * xi + 1.;
            } else {
                *yi = f64::sin(10. * xi);
            }
        });
        y
    }

    macro_rules! calc_inertia {
        ($centroids:expr, $obs:expr, $memberships:expr) => {
            $obs.rows()
                .into_iter()
                .zip($memberships.iter())
                .map(|(row, &c)| squared_distance(row.view(), $centroids.row(c).view()))
                .sum::<f64>()
        };
    }

    macro_rules! calc_memberships {
        ($centroids:expr, $obs:expr) => {{
            let mut memberships = Array1::zeros($obs.nrows());
            update_cluster_memberships(&$centroids, &$obs, &mut memberships);
            memberships
        }};
    }

    #[test]
    fn test_min_dists() {
        let centroids = array![[0.0, 1.0], [40.0, 10.0]];
        let observations = array![[3.0, 4.0], [1.0, 3.0], [25.0, 15.0]];
        let mut dists = Array1::zeros(observations.nrows());

        update_min_dists(&centroids, &observations, &mut dists);
        assert_abs_diff_eq!(dists, array![18.0, 5.0, 250.0]);
    }

    #[test]
    fn test_n_runs() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let xt = Array::random_using(100, Uniform::new(0., 1.0), &mut rng).insert_axis(Axis(1));
        let yt = function_test_1d(&xt);
        let data = concatenate(Axis(1), &[xt.view(), yt.view()]).unwrap();

        for init in &[KMeansInit::Random, KMeansInit::KMeansPlusPlus] {
            // First clustering with one run
            let dataset = DatasetBase::from(data.clone());
            let model = KMeans::params_with_rng(3, rng.clone())
                .n_runs(1)
                .init_method(init.clone())
                .fit(&dataset)
                .expect("KMeans fitted");
            let clusters = model.predict(dataset);
            let inertia = calc_inertia!(model.centroids(), clusters.records, clusters.targets);
            let total_dist = model.transform(&clusters.records.view()).sum();
            assert_abs_diff_eq!(inertia, total_dist, epsilon = 1e-5);
            assert_abs_diff_eq!(inertia, model.inertia(), epsilon = 1e-5);

            let single_cluster: usize = model.predict(&data.row(0));
            assert_eq!(single_cluster, clusters.targets[0]);

            // Second clustering with 10 runs (default)
            let dataset2 = DatasetBase::from(clusters.records().clone());
            let model2 = KMeans::params_with_rng(3, rng.clone())
                .init_method(init.clone())
                .fit(&dataset2)
                .expect("KMeans fitted");
            let clusters2 = model2.predict(dataset2);
            let inertia2 = calc_inertia!(model2.centroids(), clusters2.records, clusters2.targets);
            let total_dist2 = model2.transform(&clusters2.records.view()).sum();
            assert_abs_diff_eq!(inertia2, total_dist2, epsilon = 1e-5);

            // the first run of both fits is identical, more runs can only improve
            assert!(inertia2 <= inertia + 1e-9);
        }
    }

    #[test]
    fn compute_centroids_works() {
        let cluster_size = 100;
        let n_features = 4;
        let mut rng = Xoshiro256Plus::seed_from_u64(42);

        // Let's setup a synthetic set of observations, composed of two clusters with known means
        let cluster_1: Array2<f64> = Array::random_using(
            (cluster_size, n_features),
            Uniform::new(-100., 100.),
            &mut rng,
        );
        let memberships_1 = Array1::zeros(cluster_size);
        let expected_centroid_1 = cluster_1.mean_axis(Axis(0)).unwrap();

        let cluster_2: Array2<f64> = Array::random_using(
            (cluster_size, n_features),
            Uniform::new(-100., 100.),
            &mut rng,
        );
        let memberships_2 = Array1::ones(cluster_size);
        let expected_centroid_2 = cluster_2.mean_axis(Axis(0)).unwrap();

        let observations = concatenate(Axis(0), &[cluster_1.view(), cluster_2.view()]).unwrap();
        let memberships =
            concatenate(Axis(0), &[memberships_1.view(), memberships_2.view()]).unwrap();

        let centroids = compute_centroids(2, &observations, &memberships);
        assert_abs_diff_eq!(
            centroids.index_axis(Axis(0), 0),
            expected_centroid_1,
            epsilon = 1e-5
        );
        assert_abs_diff_eq!(
            centroids.index_axis(Axis(0), 1),
            expected_centroid_2,
            epsilon = 1e-5
        );

        assert_eq!(centroids.len_of(Axis(0)), 2);
    }

    #[test]
    fn repair_moves_farthest_point() {
        let observations = array![[0., 0.], [1., 0.], [10., 0.], [11., 0.]];
        let mut centroids = array![[5., 0.], [100., 100.]];
        let mut memberships = Array1::zeros(4);
        let mut dists = Array1::zeros(4);
        update_memberships_and_dists(&centroids, &observations, &mut memberships, &mut dists);
        assert_eq!(memberships, array![0, 0, 0, 0]);

        assert!(repair_empty_clusters(
            &mut centroids,
            &observations,
            &mut memberships,
            &mut dists
        ));
        // [11, 0] is the farthest from [5, 0]
        assert_eq!(memberships, array![0, 0, 0, 1]);
        assert_abs_diff_eq!(centroids, array![[5., 0.], [11., 0.]]);
        assert_abs_diff_eq!(dists[3], 0.);

        // nothing to do once every cluster is populated
        assert!(!repair_empty_clusters(
            &mut centroids,
            &observations,
            &mut memberships,
            &mut dists
        ));
    }

    #[test]
    fn empty_cluster_is_filled_during_fit() {
        let observations = array![[0., 0.], [1., 0.], [10., 0.], [11., 0.]];
        let dataset = DatasetBase::from(observations);
        let model = KMeans::params(2)
            .init_method(KMeansInit::Precomputed(array![[5., 0.], [100., 100.]]))
            .fit(&dataset)
            .unwrap();
        assert_abs_diff_eq!(model.cluster_count(), &array![2., 2.]);
        assert_abs_diff_eq!(model.inertia(), 1.0, epsilon = 1e-12);
    }

    #[test]
    // An observation is closest to itself.
    fn nothing_is_closer_than_self() {
        let n_centroids = 20;
        let n_features = 5;
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let centroids: Array2<f64> = Array::random_using(
            (n_centroids, n_features),
            Uniform::new(-100., 100.),
            &mut rng,
        );

        let expected_memberships = (0..n_centroids).collect::<Array1<_>>();
        assert_eq!(calc_memberships!(centroids, centroids), expected_memberships);
    }

    #[test]
    fn oracle_test_for_closest_centroid() {
        let centroids = array![[0., 0.], [1., 2.], [20., 0.], [0., 20.],];
        let observations = array![[1., 0.6], [20., 2.], [20., 0.], [7., 20.],];
        let memberships = array![0, 2, 2, 3];

        assert_eq!(calc_memberships!(centroids, observations), memberships);
    }

    #[test]
    fn closest_centroid_ties_go_to_lowest_index() {
        let centroids = array![[1., 0.], [-1., 0.]];
        assert_eq!(closest_centroid(&centroids, &array![0., 5.]).0, 0);
    }

    #[test]
    fn distinct_rows() {
        let observations = array![[1., 2.], [1., 2.], [0., 3.], [-0., 3.], [2., 1.]];
        assert_eq!(count_distinct_rows(&observations), 3);
    }

    #[test]
    fn too_few_distinct_rows() {
        let dataset = DatasetBase::from(array![[1., 1.], [1., 1.], [2., 2.], [2., 2.]]);
        let res = KMeans::params(3).fit(&dataset);
        assert!(matches!(
            res,
            Err(KMeansError::NotEnoughDistinctSamples {
                n_clusters: 3,
                n_distinct: 2
            })
        ));
        assert!(KMeans::params(2).fit(&dataset).is_ok());
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let dataset = DatasetBase::from(Array2::<f64>::zeros((0, 2)));
        let res = KMeans::params(1).fit(&dataset);
        assert!(matches!(res, Err(KMeansError::SegmentaError(_))));
    }

    #[test]
    fn precomputed_dimension_mismatch() {
        let dataset = DatasetBase::from(array![[1., 1.], [2., 2.]]);
        let res = KMeans::params(1)
            .init_method(KMeansInit::Precomputed(array![[0., 0., 0.]]))
            .fit(&dataset);
        assert!(matches!(
            res,
            Err(KMeansError::CentroidDimension {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn same_seed_same_model() {
        let mut rng = Xoshiro256Plus::seed_from_u64(7);
        let centroids = array![[0., 0.], [5., 5.], [0., 8.]];
        let data = generate_blobs(40, &centroids, &mut rng);
        let dataset = DatasetBase::from(data);
        let params = KMeans::params(3);
        let first = params.fit(&dataset).unwrap();
        let second = params.fit(&dataset).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_cluster_is_the_mean() {
        let dataset = DatasetBase::from(array![[0., 0.], [2., 0.], [0., 4.], [2., 4.]]);
        let model = KMeans::params(1).fit(&dataset).unwrap();
        assert_abs_diff_eq!(model.centroids(), &array![[1., 2.]]);
        assert_abs_diff_eq!(model.inertia(), 20.);
        assert!(model.converged());
    }

    #[test]
    fn one_cluster_per_distinct_point_has_zero_inertia() {
        let dataset = DatasetBase::from(array![[0., 0.], [3., 0.], [0., 3.], [0., 3.]]);
        let model = KMeans::params(3).fit(&dataset).unwrap();
        assert_abs_diff_eq!(model.inertia(), 0.);
    }
}
