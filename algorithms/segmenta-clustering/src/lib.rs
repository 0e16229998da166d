//! `segmenta-clustering` provides a pure Rust implementation of K-Means for the
//! segmentation workflows of `segmenta`.
//!
//! ## The big picture
//!
//! `segmenta-clustering` is a crate in the `segmenta` ecosystem. It fits partitions of
//! scaled feature tables, the other crates of the workspace take care of scaling,
//! projection and the validity metrics used to pick the number of clusters.
//!
//! ## Current state
//!
//! Right now `segmenta-clustering` provides:
//! * [K-Means](KMeans) with random, k-means++ or precomputed initialisation
//! * [`generate_blobs`] to assemble synthetic datasets for tests and benchmarks
//!
//! Implementation choices, algorithmic details and tutorials can be found in the page dedicated
//! to the specific algorithms.
#[allow(clippy::new_ret_no_self)]
mod k_means;
mod utils;

pub use k_means::*;
pub use utils::*;
