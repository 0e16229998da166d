use super::algorithm::update_min_dists;
use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use ndarray_rand::rand;
use ndarray_rand::rand::distributions::{Distribution, WeightedIndex};
use ndarray_rand::rand::Rng;
use segmenta::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
/// Specifies centroid initialization algorithm for KMeans.
pub enum KMeansInit<F: Float> {
    /// Pick random points as centroids.
    Random,
    /// Precomputed list of centroids, represented as an array of (n_centroids, n_features).
    /// Every run starts from the same centroids, so a single run is performed.
    Precomputed(Array2<F>),
    /// K-means++ algorithm. Using this over random initialization causes K-means to converge
    /// faster for almost all cases, since K-means++ produces better centroids.
    KMeansPlusPlus,
}

impl<F: Float> KMeansInit<F> {
    /// Runs the chosen initialization routine
    pub(crate) fn run<R: Rng>(
        &self,
        n_clusters: usize,
        observations: ArrayView2<F>,
        rng: &mut R,
    ) -> Array2<F> {
        match self {
            Self::Random => random_init(n_clusters, observations, rng),
            Self::KMeansPlusPlus => k_means_plusplus(n_clusters, observations, rng),
            Self::Precomputed(centroids) => centroids.clone(),
        }
    }
}

/// Pick random points from the input matrix as centroids
fn random_init<F: Float>(
    n_clusters: usize,
    observations: ArrayView2<F>,
    rng: &mut impl Rng,
) -> Array2<F> {
    let (n_samples, _) = observations.dim();
    let indices = rand::seq::index::sample(rng, n_samples, n_clusters).into_vec();
    observations.select(Axis(0), &indices)
}

/// Selects centroids using the KMeans++ initialization algorithm. The weights determine the
/// likeliness of an input point to be selected as a centroid relative to other points. The higher
/// the weight, the more likely the point will be selected as a centroid.
fn k_means_plusplus<F: Float>(
    n_clusters: usize,
    observations: ArrayView2<F>,
    rng: &mut impl Rng,
) -> Array2<F> {
    let (n_samples, n_features) = observations.dim();
    debug_assert!(n_samples >= n_clusters);
    let mut centroids = Array2::zeros((n_clusters, n_features));
    // Select 1st centroid from the input points randomly
    let first_idx = rng.gen_range(0..n_samples);
    centroids.row_mut(0).assign(&observations.row(first_idx));

    let mut dists = Array1::zeros(n_samples);
    for c_cnt in 1..n_clusters {
        update_min_dists(&centroids.slice(s![0..c_cnt, ..]), &observations, &mut dists);
        // every point sits on a centroid already, fall back to a uniform pick
        let centroid_idx = match WeightedIndex::new(dists.iter()) {
            Ok(weights) => weights.sample(rng),
            Err(_) => rng.gen_range(0..n_samples),
        };
        centroids
            .row_mut(c_cnt)
            .assign(&observations.row(centroid_idx));
    }
    centroids
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, concatenate, Array};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Normal;
    use ndarray_rand::RandomExt;
    use rand_xoshiro::Xoshiro256Plus;
    use std::collections::HashSet;

    #[test]
    fn test_precomputed() {
        let mut rng = Xoshiro256Plus::seed_from_u64(40);
        let centroids = array![[0.0, 1.0], [40.0, 10.0]];
        let observations = array![[3.0, 4.0], [1.0, 3.0], [25.0, 15.0]];
        let c = KMeansInit::Precomputed(centroids.clone()).run(2, observations.view(), &mut rng);
        assert_abs_diff_eq!(c, centroids);
    }

    #[test]
    fn test_random_init_picks_observations() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let observations = array![[0., 0.], [1., 1.], [2., 2.], [3., 3.], [4., 4.]];
        let centroids = KMeansInit::Random.run(3, observations.view(), &mut rng);
        assert_eq!(centroids.nrows(), 3);
        let mut seen = HashSet::new();
        for row in centroids.rows() {
            // each centroid is one of the observations, no repetitions
            assert_eq!(row[0], row[1]);
            assert!(seen.insert(row[0] as i64));
        }
    }

    #[test]
    fn test_kmeans_plusplus_distinct_points() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        // only three distinct points, repeated many times
        let observations = array![[0., 0.], [0., 0.], [5., 5.], [5., 5.], [9., 0.], [9., 0.]];
        let centroids = KMeansInit::KMeansPlusPlus.run(3, observations.view(), &mut rng);
        let mut firsts: Vec<f64> = centroids.column(0).to_vec();
        firsts.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(firsts, vec![0., 5., 9.]);
    }

    #[test]
    fn test_kmeans_plusplus_all_identical() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let observations = Array2::<f64>::ones((4, 2));
        let centroids = KMeansInit::KMeansPlusPlus.run(2, observations.view(), &mut rng);
        assert_abs_diff_eq!(centroids, Array2::ones((2, 2)));
    }

    #[test]
    fn test_kmeans_plusplus_spreads_centroids() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let normal = Normal::new(0., 0.1).unwrap();
        let blobs: Vec<Array2<f64>> = [[-10., -10.], [10., 10.], [10., -10.]]
            .iter()
            .map(|c| Array::random_using((30, 2), normal, &mut rng) + &array![c[0], c[1]])
            .collect();
        let views: Vec<_> = blobs.iter().map(|b| b.view()).collect();
        let observations = concatenate(Axis(0), &views).unwrap();

        let centroids = KMeansInit::KMeansPlusPlus.run(3, observations.view(), &mut rng);
        let mut quadrants: Vec<(i64, i64)> = centroids
            .rows()
            .into_iter()
            .map(|r| (r[0].signum() as i64, r[1].signum() as i64))
            .collect();
        quadrants.sort();
        assert_eq!(quadrants, vec![(-1, -1), (1, -1), (1, 1)]);
    }
}
