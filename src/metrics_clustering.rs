//! Common metrics for clustering
//!
//! All metrics are internal validity scores: they only need the records and the cluster
//! membership of every record, no ground truth.
use crate::dataset::{DatasetBase, Records};
use crate::error::{Error, Result};
use crate::Float;
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Axis, Data, Ix1, Ix2, Zip};
use ndarray_stats::DeviationExt;
use std::collections::BTreeMap;

/// Evaluates the quality of a clustering using euclidean distance.
pub trait SilhouetteScore<F> {
    /// Evaluates the quality of a clustering.
    ///
    /// Given a clustered dataset,
    /// the silhouette score for each sample is computed as
    /// the relative difference between the average distance
    /// of the sample to other samples in the same cluster and
    /// the minimum average distance of the sample to samples in
    /// another cluster. This value goes from -1 to +1 when the point
    /// is respectively closer (in average) to points in another cluster and to points in its own cluster.
    /// Samples alone in their cluster score 0.
    ///
    /// Finally, the silhouette score for the clustering is evaluated as the mean
    /// silhouette score of each sample.
    fn silhouette_score(&self) -> Result<F>;
}

/// Ratio of between-cluster dispersion to within-cluster dispersion.
pub trait CalinskiHarabaszScore<F> {
    /// Also known as the variance ratio criterion. Higher is better and the score is unbounded.
    ///
    /// With `k` clusters and `n` samples the score is `B / (k - 1)` divided by `W / (n - k)`,
    /// where `B` is the weighted sum of squared distances of the centroids to the overall mean
    /// and `W` the sum of squared distances of every sample to its centroid. A clustering
    /// without any within-cluster dispersion scores 1.
    fn calinski_harabasz_score(&self) -> Result<F>;
}

/// Average similarity of every cluster with its most similar cluster.
pub trait DaviesBouldinScore<F> {
    /// The similarity of two clusters is the sum of their average member-to-centroid distances
    /// divided by the distance between their centroids. Lower is better, zero is the minimum.
    /// Pairs of coincident centroids are ignored.
    fn davies_bouldin_score(&self) -> Result<F>;
}

struct DistanceCount<F> {
    total_distance: F,
    count: usize,
}

impl<F: Float> DistanceCount<F> {
    /// Sets the total distance from the sample to this cluster to zero
    pub fn reset(&mut self) {
        self.total_distance = F::zero();
    }

    pub fn new(count: usize) -> DistanceCount<F> {
        DistanceCount {
            total_distance: F::zero(),
            count,
        }
    }

    /// Divides the total distance from the sample to this cluster by the number of samples in the cluster
    pub fn mean_distance(&self) -> F {
        self.total_distance / F::cast(self.count)
    }

    /// To be used in the cluster in which the sample is located. The distance from the sample to itself
    /// is zero so it does not get added to the total distance. We can then just divide the total
    /// distance by 1 - #samples in this cluster
    pub fn same_label_mean_distance(&self) -> F {
        self.total_distance / F::cast(self.count - 1)
    }

    /// adds the distance of `other_sample` from `eval_sample` to the total distance of `eval_sample` from the current cluster
    pub fn add_point(&mut self, eval_sample: ArrayView1<F>, other_sample: ArrayView1<F>) {
        self.total_distance += euclidean(eval_sample, other_sample);
    }
}

fn euclidean<F: Float>(a: ArrayView1<F>, b: ArrayView1<F>) -> F {
    squared_euclidean(a, b).sqrt()
}

fn squared_euclidean<F: Float>(a: ArrayView1<F>, b: ArrayView1<F>) -> F {
    // rows of the same records, only an empty feature space fails and it has no extent
    a.sq_l2_dist(&b).unwrap_or_else(|_| F::zero())
}

/// Cluster memberships mapped to dense indices `0..n_clusters`, ordered by label
struct Memberships {
    dense: Array1<usize>,
    counts: Array1<usize>,
}

impl Memberships {
    fn new<F, D, T>(records: &ArrayBase<D, Ix2>, labels: &ArrayBase<T, Ix1>) -> Result<Self>
    where
        D: Data<Elem = F>,
        T: Data<Elem = usize>,
    {
        let n_samples = records.nsamples();
        if n_samples == 0 {
            return Err(Error::NotEnoughSamples);
        }
        if labels.len() != n_samples {
            return Err(Error::MismatchedLabels {
                samples: n_samples,
                labels: labels.len(),
            });
        }

        let mut index = BTreeMap::new();
        for &label in labels.iter() {
            *index.entry(label).or_insert(0usize) += 1;
        }
        if index.len() < 2 {
            return Err(Error::NotEnoughClusters(index.len()));
        }

        let counts = index.values().copied().collect();
        let positions: BTreeMap<usize, usize> = index
            .keys()
            .enumerate()
            .map(|(pos, &label)| (label, pos))
            .collect();
        let dense = labels.map(|label| positions[label]);

        Ok(Memberships { dense, counts })
    }

    fn n_clusters(&self) -> usize {
        self.counts.len()
    }

    /// Mean of every cluster with shape `(n_clusters, n_features)`
    fn centroids<F: Float>(&self, records: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
        let mut centroids = Array2::zeros((self.n_clusters(), records.ncols()));
        Zip::from(records.rows())
            .and(&self.dense)
            .for_each(|row, &cluster| {
                let mut centroid = centroids.row_mut(cluster);
                centroid += &row;
            });
        Zip::from(centroids.rows_mut())
            .and(&self.counts)
            .for_each(|mut centroid, &count| centroid /= F::cast(count));
        centroids
    }
}

impl<F: Float, D: Data<Elem = F>, T: Data<Elem = usize>> SilhouetteScore<F>
    for DatasetBase<ArrayBase<D, Ix2>, ArrayBase<T, Ix1>>
{
    fn silhouette_score(&self) -> Result<F> {
        let records = self.records();
        let memberships = Memberships::new(records, self.targets())?;
        let mut clusters: Vec<DistanceCount<F>> = memberships
            .counts
            .iter()
            .map(|&count| DistanceCount::new(count))
            .collect();

        // Compute and sum silhouette score for each sample
        let score = records
            .rows()
            .into_iter()
            .zip(memberships.dense.iter())
            .map(|(sample, &own)| {
                // Loops through all samples in the dataset and adds
                // the distance between them and `sample` to the cluster
                // in which they belong
                for (other, &cluster) in records.rows().into_iter().zip(memberships.dense.iter())
                {
                    clusters[cluster].add_point(sample, other);
                }

                // average distance from `sample` to points in its cluster
                let mut a_x = F::zero();
                // minimum average distance from `sample` to another cluster
                let mut b_x = F::infinity();

                for (cluster, counter) in clusters.iter_mut().enumerate() {
                    if cluster == own {
                        if counter.count > 1 {
                            a_x = counter.same_label_mean_distance();
                        }
                    } else {
                        b_x = b_x.min(counter.mean_distance());
                    }
                    counter.reset();
                }

                // singletons and fully collapsed neighbourhoods contribute zero
                if clusters[own].count == 1 || a_x.max(b_x) == F::zero() {
                    return F::zero();
                }

                // s(x) = (b(x) - a(x)) / max{a(x), b(x)}
                (b_x - a_x) / a_x.max(b_x)
            })
            .sum::<F>();

        Ok(score / F::cast(records.nsamples()))
    }
}

impl<F: Float, D: Data<Elem = F>, T: Data<Elem = usize>> CalinskiHarabaszScore<F>
    for DatasetBase<ArrayBase<D, Ix2>, ArrayBase<T, Ix1>>
{
    fn calinski_harabasz_score(&self) -> Result<F> {
        let records = self.records();
        let memberships = Memberships::new(records, self.targets())?;
        let centroids = memberships.centroids(records);
        let mean = records.mean_axis(Axis(0)).ok_or(Error::NotEnoughSamples)?;

        let extra_dispersion = centroids
            .rows()
            .into_iter()
            .zip(memberships.counts.iter())
            .map(|(centroid, &count)| F::cast(count) * squared_euclidean(centroid, mean.view()))
            .sum::<F>();
        let intra_dispersion = records
            .rows()
            .into_iter()
            .zip(memberships.dense.iter())
            .map(|(sample, &cluster)| squared_euclidean(sample, centroids.row(cluster)))
            .sum::<F>();

        if intra_dispersion == F::zero() {
            return Ok(F::one());
        }

        let n_samples = F::cast(records.nsamples());
        let n_clusters = F::cast(memberships.n_clusters());
        Ok(extra_dispersion * (n_samples - n_clusters)
            / (intra_dispersion * (n_clusters - F::one())))
    }
}

impl<F: Float, D: Data<Elem = F>, T: Data<Elem = usize>> DaviesBouldinScore<F>
    for DatasetBase<ArrayBase<D, Ix2>, ArrayBase<T, Ix1>>
{
    fn davies_bouldin_score(&self) -> Result<F> {
        let records = self.records();
        let memberships = Memberships::new(records, self.targets())?;
        let centroids = memberships.centroids(records);
        let n_clusters = memberships.n_clusters();

        let mut scatter = Array1::<F>::zeros(n_clusters);
        Zip::from(records.rows())
            .and(&memberships.dense)
            .for_each(|sample, &cluster| {
                scatter[cluster] += euclidean(sample, centroids.row(cluster));
            });
        Zip::from(&mut scatter)
            .and(&memberships.counts)
            .for_each(|s, &count| *s /= F::cast(count));

        let mut total = F::zero();
        let mut any_separated = false;
        for i in 0..n_clusters {
            let mut worst = F::zero();
            for j in 0..n_clusters {
                if i == j {
                    continue;
                }
                let separation = euclidean(centroids.row(i), centroids.row(j));
                if separation == F::zero() {
                    continue;
                }
                any_separated = true;
                worst = worst.max((scatter[i] + scatter[j]) / separation);
            }
            total += worst;
        }

        if !any_separated {
            return Ok(F::zero());
        }
        Ok(total / F::cast(n_clusters))
    }
}
