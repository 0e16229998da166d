//! `segmenta` provides the building blocks for unsupervised segmentation of tabular data in Rust.
//!
//! The crate itself is small: it defines the dataset abstraction, the traits every algorithm
//! implements and the metrics used to judge a clustering. The algorithms live in sibling crates
//! of the workspace:
//!
//! * `segmenta-clustering`: K-Means with seeded, repeated initialisation
//! * `segmenta-preprocessing`: standard and min-max scaling
//! * `segmenta-reduction`: principal component analysis
//!
//! ## Hyperparameters
//!
//! Every algorithm is configured through a parameter struct built with the builder pattern. The
//! values are only checked when the parameters are used, see [`ParamGuard`]. A fitted model is a
//! new object, the parameters are never mutated by fitting.
//!
//! ## Metrics
//!
//! Internal validity metrics work on a [`DatasetBase`] whose targets are cluster memberships:
//!
//! ```
//! use segmenta::metrics::SilhouetteScore;
//! use segmenta::DatasetBase;
//! use ndarray::array;
//!
//! let records = array![[0., 0.], [0., 1.], [10., 10.], [10., 11.]];
//! let dataset = DatasetBase::new(records, array![0usize, 0, 1, 1]);
//! assert!(dataset.silhouette_score().unwrap() > 0.9);
//! ```

pub mod correlation;
pub mod dataset;
pub mod error;
mod metrics_clustering;
mod param_guard;
pub mod prelude;
pub mod traits;

pub use dataset::{DatasetBase, Float, Records};
pub use param_guard::ParamGuard;

/// Common metrics functions for clustering
pub mod metrics {
    pub use crate::metrics_clustering::{
        CalinskiHarabaszScore, DaviesBouldinScore, SilhouetteScore,
    };
}
