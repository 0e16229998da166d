//! # Billing segmentation
//!
//! `billing-analysis` groups fixed-telecom billing records by operator, technology and service
//! and clusters the resulting feature rows with k-means.
//!
//! The pipeline runs in stages, each one an immutable value built from the previous one:
//!
//! * aggregate the records into a [`FeatureTable`]
//! * select at least two [`Feature`]s and standardise them ([`Configured`])
//! * sweep `k` over `2..=max_k` with silhouette, Calinski-Harabasz, Davies-Bouldin and inertia
//!   ([`Explored`])
//! * fit the final partition for a chosen `k` ([`Partitioned`])
//! * project onto 2 and 3 principal components and profile every cluster ([`Profiled`])
//!
//! Data problems that can be recovered, like a feature without variance, are reported as
//! [`Warning`]s. Configuration and ordering mistakes are [`AnalysisError`]s.
//!
//! ## Example
//!
//! ```
//! use billing_analysis::{AnalysisParams, Feature, FeatureSelection, RawRecord, Unconfigured};
//!
//! let records = vec![
//!     RawRecord::new("A", "Cobre", "Telefonia").lines(10).value(50.),
//!     RawRecord::new("B", "Cobre", "Telefonia").lines(12).value(60.),
//!     RawRecord::new("C", "Fibra", "Internet").lines(400).value(9000.),
//!     RawRecord::new("D", "Fibra", "Internet").lines(410).value(9100.),
//! ];
//! let selection = FeatureSelection::new([Feature::Lines, Feature::Value]).unwrap();
//!
//! let explored = Unconfigured::new(&records)
//!     .configure(selection, AnalysisParams::new().max_k(3))
//!     .unwrap()
//!     .explore()
//!     .unwrap();
//! let k = explored.selection().best_silhouette_k();
//!
//! let profiled = explored.partition(k).unwrap().profile().unwrap();
//! assert_eq!(profiled.profiles().len(), k);
//! ```
pub mod aggregate;
pub mod error;
pub mod export;
pub mod feature;
pub mod params;
pub mod partition;
pub mod profile;
pub mod projection;
pub mod record;
pub mod scale;
pub mod selection;
pub mod session;
pub mod stats;

pub use aggregate::{aggregate, FeatureRow, FeatureTable, GroupKey};
pub use error::{AnalysisError, Result, Stage, Warning};
pub use feature::{Feature, FeatureSelection};
pub use params::{AnalysisParams, AnalysisParamsError, AnalysisValidParams};
pub use partition::{partition, Partition};
pub use profile::{ClusterComposition, ClusterProfile, ClusterSummary};
pub use projection::{project, Embedding, Projection};
pub use record::{read_records, read_records_from_path, RawRecord};
pub use scale::{scale_features, ScaledFeatures};
pub use selection::{
    select_model, select_model_with_cancel, spawn_selection, CancelToken, CandidateMetrics,
    ModelSelection, SelectionHandle,
};
pub use session::{
    AnalysisSession, Configured, DatasetOverview, ExploreHandle, Explored, Partitioned, Profiled,
    Unconfigured,
};
pub use stats::FeatureStatistics;
