//! Catalog of the numeric features a clustering can be built on
use std::fmt;
use std::str::FromStr;

use crate::aggregate::FeatureRow;
use crate::error::{AnalysisError, Result};

/// A numeric attribute of an aggregated [`FeatureRow`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    /// Summed line count
    Lines,
    /// Summed billed value
    Value,
    /// Mean effective downstream speed
    Downstream,
    /// Mean effective upstream speed
    Upstream,
    /// Number of distinct departments
    Departments,
    /// Number of distinct municipalities
    Municipalities,
    /// Billed value per line
    ValuePerLine,
    /// Downstream over upstream plus one
    SpeedRatio,
}

impl Feature {
    /// Every feature, in catalog order
    pub const ALL: [Feature; 8] = [
        Feature::Lines,
        Feature::Value,
        Feature::Downstream,
        Feature::Upstream,
        Feature::Departments,
        Feature::Municipalities,
        Feature::ValuePerLine,
        Feature::SpeedRatio,
    ];

    /// Column name used in tables and exports
    pub fn column_name(&self) -> &'static str {
        match self {
            Feature::Lines => "CANTIDAD_LINEAS_ACCESOS",
            Feature::Value => "VALOR_FACTURADO_O_COBRADO",
            Feature::Downstream => "VELOCIDAD_EFECTIVA_DOWNSTREAM",
            Feature::Upstream => "VELOCIDAD_EFECTIVA_UPSTREAM",
            Feature::Departments => "N_DEPARTAMENTOS",
            Feature::Municipalities => "N_MUNICIPIOS",
            Feature::ValuePerLine => "VALOR_POR_LINEA",
            Feature::SpeedRatio => "RATIO_VELOCIDAD",
        }
    }

    /// Position in [`Feature::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn extract(&self, row: &FeatureRow) -> f64 {
        match self {
            Feature::Lines => row.lines as f64,
            Feature::Value => row.value,
            Feature::Downstream => row.downstream,
            Feature::Upstream => row.upstream,
            Feature::Departments => row.n_departments as f64,
            Feature::Municipalities => row.n_municipalities as f64,
            Feature::ValuePerLine => row.value_per_line,
            Feature::SpeedRatio => row.speed_ratio,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.column_name())
    }
}

impl FromStr for Feature {
    type Err = AnalysisError;

    fn from_str(name: &str) -> Result<Self> {
        let name = name.trim();
        Feature::ALL
            .iter()
            .copied()
            .find(|feature| feature.column_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| AnalysisError::InvalidConfiguration(format!("unknown feature `{}`", name)))
    }
}

/// Ordered set of at least two distinct features
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureSelection(Vec<Feature>);

impl FeatureSelection {
    pub fn new(features: impl IntoIterator<Item = Feature>) -> Result<Self> {
        let features: Vec<Feature> = features.into_iter().collect();
        if features.len() < 2 {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "at least 2 features are needed for clustering, {} selected",
                features.len()
            )));
        }
        for (i, feature) in features.iter().enumerate() {
            if features[..i].contains(feature) {
                return Err(AnalysisError::InvalidConfiguration(format!(
                    "{} is selected twice",
                    feature
                )));
            }
        }
        Ok(FeatureSelection(features))
    }

    pub fn features(&self) -> &[Feature] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false, a selection holds at least two features
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.iter().map(|f| f.column_name().to_string()).collect()
    }
}

impl Default for FeatureSelection {
    /// Lines, billed value, downstream speed and department count
    fn default() -> Self {
        FeatureSelection(vec![
            Feature::Lines,
            Feature::Value,
            Feature::Downstream,
            Feature::Departments,
        ])
    }
}

impl FromStr for FeatureSelection {
    type Err = AnalysisError;

    /// Comma separated column names
    fn from_str(names: &str) -> Result<Self> {
        let features = names
            .split(',')
            .filter(|name| !name.trim().is_empty())
            .map(Feature::from_str)
            .collect::<Result<Vec<_>>>()?;
        FeatureSelection::new(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for feature in Feature::ALL {
            assert_eq!(feature.column_name().parse::<Feature>().unwrap(), feature);
        }
        assert_eq!(
            "n_municipios".parse::<Feature>().unwrap(),
            Feature::Municipalities
        );
    }

    #[test]
    fn unknown_name_is_rejected() {
        let res = "SEGMENTO".parse::<Feature>();
        assert!(matches!(res, Err(AnalysisError::InvalidConfiguration(_))));
    }

    #[test]
    fn index_follows_catalog_order() {
        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
        }
    }

    #[test]
    fn single_feature_is_rejected() {
        let res = FeatureSelection::new([Feature::Value]);
        assert!(matches!(res, Err(AnalysisError::InvalidConfiguration(_))));
        let res = FeatureSelection::new(Vec::new());
        assert!(matches!(res, Err(AnalysisError::InvalidConfiguration(_))));
    }

    #[test]
    fn duplicates_are_rejected() {
        let res = FeatureSelection::new([Feature::Value, Feature::Lines, Feature::Value]);
        assert!(matches!(res, Err(AnalysisError::InvalidConfiguration(_))));
    }

    #[test]
    fn parse_selection_keeps_order() {
        let selection: FeatureSelection = "RATIO_VELOCIDAD, CANTIDAD_LINEAS_ACCESOS"
            .parse()
            .unwrap();
        assert_eq!(
            selection.features(),
            &[Feature::SpeedRatio, Feature::Lines]
        );
        assert!("RATIO_VELOCIDAD".parse::<FeatureSelection>().is_err());
    }

    #[test]
    fn default_selection() {
        let selection = FeatureSelection::default();
        assert_eq!(selection.len(), 4);
        assert!(selection.contains(Feature::Departments));
        assert!(!selection.contains(Feature::SpeedRatio));
    }
}
