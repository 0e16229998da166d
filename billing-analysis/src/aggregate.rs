//! Aggregation of billing records into one feature row per operator, technology and service
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ndarray::{Array1, Array2};

use crate::error::Warning;
use crate::feature::{Feature, FeatureSelection};
use crate::record::RawRecord;

/// Grouping key of a [`FeatureRow`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub operator: String,
    pub technology: String,
    pub service: String,
}

impl GroupKey {
    pub fn new(operator: &str, technology: &str, service: &str) -> Self {
        GroupKey {
            operator: operator.to_string(),
            technology: technology.to_string(),
            service: service.to_string(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.operator, self.technology, self.service)
    }
}

/// Aggregated features of one operator, technology and service combination
///
/// Every floating point feature is finite.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub key: GroupKey,
    pub lines: u64,
    pub value: f64,
    pub downstream: f64,
    pub upstream: f64,
    pub n_departments: usize,
    pub n_municipalities: usize,
    pub value_per_line: f64,
    pub speed_ratio: f64,
    /// Number of billing records merged into this row
    pub n_records: usize,
}

impl FeatureRow {
    pub fn get(&self, feature: Feature) -> f64 {
        feature.extract(self)
    }
}

#[derive(Default)]
struct Accumulator<'a> {
    lines: u64,
    value: f64,
    downstream: f64,
    upstream: f64,
    n_records: usize,
    departments: BTreeSet<&'a str>,
    municipalities: BTreeSet<&'a str>,
}

impl<'a> Accumulator<'a> {
    fn push(&mut self, record: &'a RawRecord) {
        self.lines = self.lines.saturating_add(record.lines);
        self.value += record.value;
        self.downstream += record.downstream;
        self.upstream += record.upstream;
        self.n_records += 1;
        self.departments.insert(&record.department);
        self.municipalities.insert(&record.municipality);
    }

    fn finish(self, key: GroupKey, warnings: &mut Vec<Warning>) -> FeatureRow {
        let n = self.n_records as f64;
        let mut sanitize = |x: f64, feature: Feature| {
            if x.is_finite() {
                x
            } else {
                tracing::warn!(key = %key, feature = %feature, "non finite feature replaced by 0");
                warnings.push(Warning::NonFiniteFeature {
                    key: key.clone(),
                    feature,
                });
                0.
            }
        };

        let value = sanitize(self.value, Feature::Value);
        let downstream = sanitize(self.downstream / n, Feature::Downstream);
        let upstream = sanitize(self.upstream / n, Feature::Upstream);
        let value_per_line = if self.lines == 0 {
            0.
        } else {
            sanitize(value / self.lines as f64, Feature::ValuePerLine)
        };
        let speed_ratio = sanitize(downstream / (upstream + 1.), Feature::SpeedRatio);

        FeatureRow {
            lines: self.lines,
            value,
            downstream,
            upstream,
            n_departments: self.departments.len(),
            n_municipalities: self.municipalities.len(),
            value_per_line,
            speed_ratio,
            n_records: self.n_records,
            key,
        }
    }
}

/// Feature rows ordered by their [`GroupKey`], with the warnings raised while building them
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
    warnings: Vec<Warning>,
}

/// Group records by operator, technology and service
///
/// Line counts and billed values are summed, speeds are averaged and departments and
/// municipalities are counted once per distinct name. An empty input gives an empty table.
pub fn aggregate(records: &[RawRecord]) -> FeatureTable {
    let mut groups: BTreeMap<GroupKey, Accumulator> = BTreeMap::new();
    for record in records {
        let key = GroupKey::new(&record.operator, &record.technology, &record.service);
        groups.entry(key).or_default().push(record);
    }

    let mut warnings = Vec::new();
    let rows: Vec<FeatureRow> = groups
        .into_iter()
        .map(|(key, acc)| acc.finish(key, &mut warnings))
        .collect();
    tracing::info!(
        n_records = records.len(),
        n_rows = rows.len(),
        "billing records aggregated"
    );

    FeatureTable { rows, warnings }
}

impl FeatureTable {
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// One column per selected feature, in selection order
    pub fn matrix(&self, selection: &FeatureSelection) -> Array2<f64> {
        let features = selection.features();
        Array2::from_shape_fn((self.len(), features.len()), |(i, j)| {
            features[j].extract(&self.rows[i])
        })
    }

    pub fn column(&self, feature: Feature) -> Array1<f64> {
        self.rows.iter().map(|row| feature.extract(row)).collect()
    }

    pub fn total(&self, feature: Feature) -> f64 {
        self.rows.iter().map(|row| feature.extract(row)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn records() -> Vec<RawRecord> {
        vec![
            RawRecord::new("B", "Cable", "TV")
                .lines(10)
                .value(100.)
                .speeds(20., 5.)
                .location("ANTIOQUIA", "MEDELLIN"),
            RawRecord::new("A", "Fibra", "Internet")
                .lines(4)
                .value(80.)
                .speeds(100., 50.)
                .location("ANTIOQUIA", "ENVIGADO"),
            RawRecord::new("B", "Cable", "TV")
                .lines(30)
                .value(300.)
                .speeds(40., 15.)
                .location("CUNDINAMARCA", "MEDELLIN"),
        ]
    }

    #[test]
    fn rows_are_sorted_by_key() {
        let table = aggregate(&records());
        let keys: Vec<_> = table.rows().iter().map(|r| r.key.clone()).collect();
        assert_eq!(
            keys,
            vec![
                GroupKey::new("A", "Fibra", "Internet"),
                GroupKey::new("B", "Cable", "TV")
            ]
        );
    }

    #[test]
    fn sums_means_and_distinct_counts() {
        let table = aggregate(&records());
        let row = &table.rows()[1];
        assert_eq!(row.lines, 40);
        assert_abs_diff_eq!(row.value, 400.);
        assert_abs_diff_eq!(row.downstream, 30.);
        assert_abs_diff_eq!(row.upstream, 10.);
        assert_eq!(row.n_departments, 2);
        // municipalities are counted by name
        assert_eq!(row.n_municipalities, 1);
        assert_abs_diff_eq!(row.value_per_line, 10.);
        assert_abs_diff_eq!(row.speed_ratio, 30. / 11.);
        assert_eq!(row.n_records, 2);
    }

    #[test]
    fn single_record_group() {
        let table = aggregate(&records());
        let row = &table.rows()[0];
        assert_abs_diff_eq!(row.downstream, 100.);
        assert_eq!(row.n_departments, 1);
        assert_eq!(row.n_municipalities, 1);
        assert_abs_diff_eq!(row.value_per_line, 20.);
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = aggregate(&[]);
        assert!(table.is_empty());
        assert!(table.warnings().is_empty());
        assert_eq!(
            table.matrix(&FeatureSelection::default()).dim(),
            (0, 4)
        );
    }

    #[test]
    fn zero_lines_give_zero_value_per_line() {
        let table = aggregate(&[RawRecord::new("A", "Satelital", "Internet").value(50.)]);
        assert_eq!(table.rows()[0].value_per_line, 0.);
        assert!(table.warnings().is_empty());
    }

    #[test]
    fn non_finite_features_are_replaced() {
        let table = aggregate(&[RawRecord::new("A", "Satelital", "Internet")
            .lines(2)
            .value(f64::INFINITY)
            .speeds(10., -1.)]);
        let row = &table.rows()[0];
        assert_eq!(row.value, 0.);
        assert_eq!(row.value_per_line, 0.);
        assert_eq!(row.speed_ratio, 0.);
        assert_eq!(
            table.warnings(),
            &[
                Warning::NonFiniteFeature {
                    key: GroupKey::new("A", "Satelital", "Internet"),
                    feature: Feature::Value
                },
                Warning::NonFiniteFeature {
                    key: GroupKey::new("A", "Satelital", "Internet"),
                    feature: Feature::SpeedRatio
                }
            ]
        );
    }

    #[test]
    fn matrix_follows_selection_order() {
        let table = aggregate(&records());
        let selection = FeatureSelection::new([Feature::Value, Feature::Lines]).unwrap();
        assert_abs_diff_eq!(table.matrix(&selection), array![[80., 4.], [400., 40.]]);
        assert_abs_diff_eq!(table.column(Feature::Departments), array![1., 2.]);
        assert_abs_diff_eq!(table.total(Feature::Lines), 44.);
    }
}
