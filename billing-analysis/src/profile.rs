//! Per-cluster statistics in original units
use std::collections::BTreeMap;

use ndarray::{Array1, Array2};
use segmenta::traits::{Fit, Transformer};
use segmenta::DatasetBase;
use segmenta_preprocessing::LinearScaler;

use crate::aggregate::FeatureTable;
use crate::error::Result;
use crate::feature::Feature;
use crate::partition::Partition;

/// Members, sums and means of one cluster over every feature of the catalog
///
/// Arrays are indexed by [`Feature::index`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterProfile {
    cluster: usize,
    size: usize,
    sums: Array1<f64>,
    means: Array1<f64>,
    normalized_means: Array1<f64>,
}

impl ClusterProfile {
    pub fn cluster(&self) -> usize {
        self.cluster
    }

    /// Number of feature rows in the cluster
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn sum(&self, feature: Feature) -> f64 {
        self.sums[feature.index()]
    }

    pub fn mean(&self, feature: Feature) -> f64 {
        self.means[feature.index()]
    }

    /// Mean rescaled to `[0, 1]` between the smallest and largest cluster mean
    ///
    /// 0 when every cluster has the same mean.
    pub fn normalized_mean(&self, feature: Feature) -> f64 {
        self.normalized_means[feature.index()]
    }

    pub fn sums(&self) -> &Array1<f64> {
        &self.sums
    }

    pub fn means(&self) -> &Array1<f64> {
        &self.means
    }

    pub fn normalized_means(&self) -> &Array1<f64> {
        &self.normalized_means
    }
}

fn check_alignment(table: &FeatureTable, partition: &Partition) -> Result<()> {
    if table.len() != partition.labels().len() {
        return Err(segmenta::error::Error::MismatchedLabels {
            samples: table.len(),
            labels: partition.labels().len(),
        }
        .into());
    }
    Ok(())
}

/// Profile every cluster of a partition on the unscaled feature table it was fitted on
pub fn profile_clusters(table: &FeatureTable, partition: &Partition) -> Result<Vec<ClusterProfile>> {
    check_alignment(table, partition)?;
    let k = partition.k();
    let n_features = Feature::ALL.len();

    let mut sizes = vec![0usize; k];
    let mut sums = Array2::<f64>::zeros((k, n_features));
    for (row, &label) in table.rows().iter().zip(partition.labels()) {
        sizes[label] += 1;
        let mut cluster_sums = sums.row_mut(label);
        for feature in Feature::ALL {
            cluster_sums[feature.index()] += feature.extract(row);
        }
    }

    let mut means = sums.clone();
    for (mut cluster_means, &size) in means.rows_mut().into_iter().zip(&sizes) {
        if size > 0 {
            cluster_means /= size as f64;
        }
    }
    let normalized = LinearScaler::min_max()
        .fit(&DatasetBase::from(means.view()))?
        .transform(means.clone());

    Ok((0..k)
        .map(|cluster| ClusterProfile {
            cluster,
            size: sizes[cluster],
            sums: sums.row(cluster).to_owned(),
            means: means.row(cluster).to_owned(),
            normalized_means: normalized.row(cluster).to_owned(),
        })
        .collect())
}

/// Lines and billed value of one cluster
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub cluster: usize,
    pub total_lines: f64,
    pub mean_lines: f64,
    pub total_value: f64,
    pub mean_value: f64,
    pub n_records: usize,
}

impl From<&ClusterProfile> for ClusterSummary {
    fn from(profile: &ClusterProfile) -> Self {
        ClusterSummary {
            cluster: profile.cluster(),
            total_lines: profile.sum(Feature::Lines),
            mean_lines: profile.mean(Feature::Lines),
            total_value: profile.sum(Feature::Value),
            mean_value: profile.mean(Feature::Value),
            n_records: profile.size(),
        }
    }
}

pub fn summarize(profiles: &[ClusterProfile]) -> Vec<ClusterSummary> {
    profiles.iter().map(ClusterSummary::from).collect()
}

/// Members of a cluster counted per operator, technology and service
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClusterComposition {
    pub cluster: usize,
    pub operators: BTreeMap<String, usize>,
    pub technologies: BTreeMap<String, usize>,
    pub services: BTreeMap<String, usize>,
}

pub fn compose(table: &FeatureTable, partition: &Partition) -> Result<Vec<ClusterComposition>> {
    check_alignment(table, partition)?;
    let mut compositions: Vec<ClusterComposition> = (0..partition.k())
        .map(|cluster| ClusterComposition {
            cluster,
            ..Default::default()
        })
        .collect();
    for (row, &label) in table.rows().iter().zip(partition.labels()) {
        let composition = &mut compositions[label];
        *composition
            .operators
            .entry(row.key.operator.clone())
            .or_default() += 1;
        *composition
            .technologies
            .entry(row.key.technology.clone())
            .or_default() += 1;
        *composition
            .services
            .entry(row.key.service.clone())
            .or_default() += 1;
    }
    Ok(compositions)
}
