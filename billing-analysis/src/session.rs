//! Typed pipeline stages and the session that moves between them
//!
//! Every stage is an immutable value built from the previous one, so a stage can only be
//! reached through its prerequisites:
//!
//! ```text
//! Unconfigured -> Configured -> Explored -> Partitioned -> Profiled
//! ```
//!
//! [`AnalysisSession`] holds the most advanced stage for callers that drive the pipeline from
//! user actions. Configuring again drops every stage downstream of the new configuration.
use std::collections::BTreeSet;
use std::io;
use std::sync::Arc;

use segmenta::correlation::PearsonCorrelation;
use segmenta::ParamGuard;

use crate::aggregate::{aggregate, FeatureRow, FeatureTable};
use crate::error::{AnalysisError, Result, Stage, Warning};
use crate::export::{write_labeled_table, write_summary};
use crate::feature::{Feature, FeatureSelection};
use crate::params::{AnalysisParams, AnalysisValidParams};
use crate::partition::{partition, Partition};
use crate::profile::{
    compose, profile_clusters, summarize, ClusterComposition, ClusterProfile, ClusterSummary,
};
use crate::projection::{project, Projection};
use crate::record::RawRecord;
use crate::scale::{scale_features, ScaledFeatures};
use crate::selection::{select_model, spawn_selection, ModelSelection, SelectionHandle};
use crate::stats::{correlation, describe, FeatureStatistics};

/// Size of the aggregated data set
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetOverview {
    pub n_rows: usize,
    pub n_records: usize,
    pub n_operators: usize,
    pub n_technologies: usize,
    pub n_services: usize,
    pub total_lines: f64,
    pub total_value: f64,
}

impl DatasetOverview {
    pub fn from_table(table: &FeatureTable) -> Self {
        let distinct = |field: fn(&FeatureRow) -> &str| {
            table.rows().iter().map(field).collect::<BTreeSet<_>>().len()
        };
        DatasetOverview {
            n_rows: table.len(),
            n_records: table.rows().iter().map(|row| row.n_records).sum(),
            n_operators: distinct(|row| row.key.operator.as_str()),
            n_technologies: distinct(|row| row.key.technology.as_str()),
            n_services: distinct(|row| row.key.service.as_str()),
            total_lines: table.total(Feature::Lines),
            total_value: table.total(Feature::Value),
        }
    }
}

/// Aggregated records without a feature selection
#[derive(Debug, Clone)]
pub struct Unconfigured {
    table: Arc<FeatureTable>,
}

impl Unconfigured {
    pub fn new(records: &[RawRecord]) -> Self {
        Self::from_table(aggregate(records))
    }

    pub fn from_table(table: FeatureTable) -> Self {
        Unconfigured {
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &FeatureTable {
        &self.table
    }

    pub fn overview(&self) -> DatasetOverview {
        DatasetOverview::from_table(&self.table)
    }

    /// Select the features and settings of the analysis and scale the feature table
    pub fn configure(&self, selection: FeatureSelection, params: AnalysisParams) -> Result<Configured> {
        Configured::new(self.table.clone(), selection, params)
    }
}

/// Scaled feature matrix of a selection
#[derive(Debug, Clone)]
pub struct Configured {
    table: Arc<FeatureTable>,
    scaled: Arc<ScaledFeatures>,
    params: AnalysisValidParams,
}

impl Configured {
    fn new(table: Arc<FeatureTable>, selection: FeatureSelection, params: AnalysisParams) -> Result<Self> {
        let params = params.check()?;
        let scaled = scale_features(&table, &selection)?;
        tracing::info!(
            n_rows = table.len(),
            features = ?selection.column_names(),
            max_k = params.max_k(),
            "session configured"
        );
        Ok(Configured {
            table,
            scaled: Arc::new(scaled),
            params,
        })
    }

    pub fn table(&self) -> &FeatureTable {
        &self.table
    }

    pub fn selection(&self) -> &FeatureSelection {
        self.scaled.selection()
    }

    pub fn scaled(&self) -> &ScaledFeatures {
        &self.scaled
    }

    pub fn params(&self) -> &AnalysisValidParams {
        &self.params
    }

    /// Aggregation and scaling warnings
    pub fn warnings(&self) -> Vec<Warning> {
        self.table
            .warnings()
            .iter()
            .chain(self.scaled.warnings())
            .cloned()
            .collect()
    }

    pub fn overview(&self) -> DatasetOverview {
        DatasetOverview::from_table(&self.table)
    }

    pub fn statistics(&self) -> Vec<FeatureStatistics> {
        describe(&self.table, self.selection())
    }

    pub fn correlation(&self) -> Result<PearsonCorrelation<f64>> {
        correlation(&self.table, self.selection())
    }

    /// New configuration of the same feature table
    pub fn reconfigure(&self, selection: FeatureSelection, params: AnalysisParams) -> Result<Configured> {
        Configured::new(self.table.clone(), selection, params)
    }

    /// Run the model selection sweep, blocking until every `k` is evaluated
    pub fn explore(&self) -> Result<Explored> {
        let selection = select_model(&self.scaled, &self.params)?;
        Ok(self.explored(selection))
    }

    /// Run the model selection sweep on a worker thread
    pub fn spawn_explore(&self) -> Result<ExploreHandle> {
        let handle = spawn_selection(self.scaled.clone(), self.params.clone())?;
        Ok(ExploreHandle {
            configured: self.clone(),
            handle,
        })
    }

    fn explored(&self, selection: ModelSelection) -> Explored {
        Explored {
            configured: self.clone(),
            selection: Arc::new(selection),
        }
    }

    fn same_configuration(&self, other: &Configured) -> bool {
        Arc::ptr_eq(&self.scaled, &other.scaled) && self.params == other.params
    }
}

/// Model selection sweep running in the background for a configuration
#[derive(Debug)]
pub struct ExploreHandle {
    configured: Configured,
    handle: SelectionHandle,
}

impl ExploreHandle {
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the sweep, `Cancelled` when it was stopped
    pub fn join(self) -> Result<Explored> {
        let selection = self.handle.join()?;
        Ok(self.configured.explored(selection))
    }
}

/// Configuration with the metrics of every candidate `k`
#[derive(Debug, Clone)]
pub struct Explored {
    configured: Configured,
    selection: Arc<ModelSelection>,
}

impl Explored {
    pub fn configured(&self) -> &Configured {
        &self.configured
    }

    pub fn selection(&self) -> &ModelSelection {
        &self.selection
    }

    pub fn warnings(&self) -> Vec<Warning> {
        let mut warnings = self.configured.warnings();
        warnings.extend(self.selection.warnings().iter().cloned());
        warnings
    }

    /// Partition with the chosen number of clusters
    ///
    /// An evaluated `k` reuses the model scored by the sweep, any other `k` is fitted the same way.
    pub fn partition(&self, k: usize) -> Result<Partitioned> {
        let partition = match self.selection.partition(k) {
            Some(scored) => {
                tracing::info!(k, "partition taken from the model selection");
                scored.clone()
            }
            None => partition(self.configured.scaled(), k, self.configured.params())?,
        };
        Ok(Partitioned {
            explored: self.clone(),
            partition: Arc::new(partition),
        })
    }
}

/// A fitted partition of the configured feature rows
#[derive(Debug, Clone)]
pub struct Partitioned {
    explored: Explored,
    partition: Arc<Partition>,
}

impl Partitioned {
    pub fn explored(&self) -> &Explored {
        &self.explored
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Cluster of a feature row that was not part of the analysis
    pub fn classify(&self, row: &FeatureRow) -> Result<usize> {
        self.partition.classify(self.explored.configured.scaled(), row)
    }

    /// Project the scaled features and profile the clusters
    pub fn profile(&self) -> Result<Profiled> {
        let configured = &self.explored.configured;
        let projection = project(configured.scaled())?;
        let profiles = profile_clusters(configured.table(), &self.partition)?;
        let compositions = compose(configured.table(), &self.partition)?;
        tracing::info!(
            k = self.partition.k(),
            sizes = ?self.partition.cluster_sizes(),
            "clusters profiled"
        );
        Ok(Profiled {
            partitioned: self.clone(),
            projection: Arc::new(projection),
            profiles: Arc::new(profiles),
            compositions: Arc::new(compositions),
        })
    }
}

/// Projections and cluster profiles of a partition
#[derive(Debug, Clone)]
pub struct Profiled {
    partitioned: Partitioned,
    projection: Arc<Projection>,
    profiles: Arc<Vec<ClusterProfile>>,
    compositions: Arc<Vec<ClusterComposition>>,
}

impl Profiled {
    pub fn partitioned(&self) -> &Partitioned {
        &self.partitioned
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn profiles(&self) -> &[ClusterProfile] {
        &self.profiles
    }

    pub fn compositions(&self) -> &[ClusterComposition] {
        &self.compositions
    }

    pub fn summary(&self) -> Vec<ClusterSummary> {
        summarize(&self.profiles)
    }

    /// Write the labeled feature table, see [`write_labeled_table`]
    pub fn write_labeled_table<W: io::Write>(&self, writer: W, bom: bool) -> Result<()> {
        let configured = &self.partitioned.explored.configured;
        write_labeled_table(
            writer,
            configured.table(),
            configured.selection(),
            &self.partitioned.partition,
            bom,
        )
    }

    /// Write the cluster summary, see [`write_summary`]
    pub fn write_summary<W: io::Write>(&self, writer: W, bom: bool) -> Result<()> {
        write_summary(writer, &self.summary(), bom)
    }
}

#[derive(Debug, Clone)]
enum State {
    Unconfigured,
    Configured(Configured),
    Explored(Explored),
    Partitioned(Partitioned),
    Profiled(Profiled),
}

/// One analysis over a fixed set of records, advanced stage by stage
///
/// A failed transition leaves the session where it was.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    data: Unconfigured,
    state: State,
}

impl AnalysisSession {
    pub fn new(records: &[RawRecord]) -> Self {
        Self::from_table(aggregate(records))
    }

    pub fn from_table(table: FeatureTable) -> Self {
        AnalysisSession {
            data: Unconfigured::from_table(table),
            state: State::Unconfigured,
        }
    }

    pub fn table(&self) -> &FeatureTable {
        self.data.table()
    }

    pub fn stage(&self) -> Stage {
        match self.state {
            State::Unconfigured => Stage::Unconfigured,
            State::Configured(_) => Stage::Configured,
            State::Explored(_) => Stage::Explored,
            State::Partitioned(_) => Stage::Partitioned,
            State::Profiled(_) => Stage::Profiled,
        }
    }

    /// Error for entering `stage`, naming the first stage the session still lacks
    fn missing(&self, stage: Stage) -> AnalysisError {
        let missing = match self.stage() {
            Stage::Unconfigured => Stage::Configured,
            Stage::Configured => Stage::Explored,
            _ => Stage::Partitioned,
        };
        AnalysisError::PrerequisiteMissing { stage, missing }
    }

    pub fn configured(&self) -> Option<&Configured> {
        match &self.state {
            State::Unconfigured => None,
            State::Configured(configured) => Some(configured),
            State::Explored(explored) => Some(explored.configured()),
            State::Partitioned(partitioned) => Some(partitioned.explored().configured()),
            State::Profiled(profiled) => Some(profiled.partitioned().explored().configured()),
        }
    }

    pub fn explored(&self) -> Option<&Explored> {
        match &self.state {
            State::Explored(explored) => Some(explored),
            State::Partitioned(partitioned) => Some(partitioned.explored()),
            State::Profiled(profiled) => Some(profiled.partitioned().explored()),
            _ => None,
        }
    }

    pub fn partitioned(&self) -> Option<&Partitioned> {
        match &self.state {
            State::Partitioned(partitioned) => Some(partitioned),
            State::Profiled(profiled) => Some(profiled.partitioned()),
            _ => None,
        }
    }

    pub fn profiled(&self) -> Option<&Profiled> {
        match &self.state {
            State::Profiled(profiled) => Some(profiled),
            _ => None,
        }
    }

    /// Select features and settings, dropping any exploration, partition or profile
    pub fn configure(&mut self, selection: FeatureSelection, params: AnalysisParams) -> Result<()> {
        let configured = self.data.configure(selection, params)?;
        self.state = State::Configured(configured);
        Ok(())
    }

    /// Run the model selection sweep of the current configuration
    pub fn explore(&mut self) -> Result<()> {
        let configured = self
            .configured()
            .ok_or_else(|| self.missing(Stage::Explored))?;
        let explored = configured.explore()?;
        self.state = State::Explored(explored);
        Ok(())
    }

    /// Install the result of a background sweep
    ///
    /// Fails with `InvalidConfiguration` when the session was configured again since the sweep
    /// was started.
    pub fn adopt(&mut self, explored: Explored) -> Result<()> {
        let current = self
            .configured()
            .ok_or_else(|| self.missing(Stage::Explored))?;
        if !current.same_configuration(explored.configured()) {
            return Err(AnalysisError::InvalidConfiguration(
                "the sweep belongs to a previous configuration".to_string(),
            ));
        }
        self.state = State::Explored(explored);
        Ok(())
    }

    pub fn partition(&mut self, k: usize) -> Result<()> {
        let explored = self
            .explored()
            .ok_or_else(|| self.missing(Stage::Partitioned))?;
        let partitioned = explored.partition(k)?;
        self.state = State::Partitioned(partitioned);
        Ok(())
    }

    pub fn profile(&mut self) -> Result<()> {
        let partitioned = self
            .partitioned()
            .ok_or_else(|| self.missing(Stage::Profiled))?;
        let profiled = partitioned.profile()?;
        self.state = State::Profiled(profiled);
        Ok(())
    }
}
