use approx::assert_abs_diff_eq;
use billing_analysis::{
    aggregate, partition, scale_features, select_model, AnalysisParams, Feature,
    FeatureSelection, FeatureTable, RawRecord,
};
use ndarray::Axis;
use proptest::prelude::*;
use segmenta::ParamGuard;
use segmenta_clustering::count_distinct_rows;

const OPERATORS: [&str; 4] = ["CLARO", "ETB", "MOVISTAR", "TIGO"];
const TECHNOLOGIES: [&str; 3] = ["Cobre", "Fibra", "HFC"];
const SERVICES: [&str; 2] = ["Internet", "TV"];
const DEPARTMENTS: [&str; 3] = ["ANTIOQUIA", "BOGOTA", "VALLE"];

fn record() -> impl Strategy<Value = RawRecord> {
    (
        0..OPERATORS.len(),
        0..TECHNOLOGIES.len(),
        0..SERVICES.len(),
        0..DEPARTMENTS.len(),
        0..5usize,
        0..2_000u64,
        0..1_000_000u32,
        0..1_000u32,
        0..300u32,
    )
        .prop_map(|(o, t, s, d, m, lines, value, down, up)| {
            RawRecord::new(OPERATORS[o], TECHNOLOGIES[t], SERVICES[s])
                .location(DEPARTMENTS[d], &format!("M{}", m))
                .lines(lines)
                .value(f64::from(value))
                .speeds(f64::from(down), f64::from(up))
        })
}

fn records(max: usize) -> impl Strategy<Value = Vec<RawRecord>> {
    prop::collection::vec(record(), 1..max)
}

fn selection() -> FeatureSelection {
    FeatureSelection::new([
        Feature::Lines,
        Feature::Value,
        Feature::Downstream,
        Feature::ValuePerLine,
    ])
    .unwrap()
}

fn distinct_rows(table: &FeatureTable, selection: &FeatureSelection) -> usize {
    let scaled = scale_features(table, selection).unwrap();
    count_distinct_rows(scaled.matrix())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn aggregation_conserves_totals(records in records(60)) {
        let table = aggregate(&records);
        let lines: u64 = table.rows().iter().map(|r| r.lines).sum();
        prop_assert_eq!(lines, records.iter().map(|r| r.lines).sum::<u64>());
        let value: f64 = records.iter().map(|r| r.value).sum();
        assert_abs_diff_eq!(table.total(Feature::Value), value, epsilon = 1e-6 * value.max(1.));
        let merged: usize = table.rows().iter().map(|r| r.n_records).sum();
        prop_assert_eq!(merged, records.len());
    }

    #[test]
    fn scaled_columns_are_standard_or_zero(records in records(60)) {
        let table = aggregate(&records);
        let scaled = scale_features(&table, &selection()).unwrap();
        let matrix = scaled.matrix();
        for (j, column) in matrix.axis_iter(Axis(1)).enumerate() {
            if scaled.std_devs()[j] == 0. {
                prop_assert!(column.iter().all(|&v| v == 0.));
            } else {
                assert_abs_diff_eq!(column.mean().unwrap(), 0., epsilon = 1e-9);
                assert_abs_diff_eq!(column.std(0.), 1., epsilon = 1e-9);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn partitions_are_deterministic_and_complete(records in records(40), k in 2..=4usize) {
        let table = aggregate(&records);
        let selection = selection();
        prop_assume!(distinct_rows(&table, &selection) >= k);
        let scaled = scale_features(&table, &selection).unwrap();
        let params = AnalysisParams::new().max_k(4).check().unwrap();

        let first = partition(&scaled, k, &params).unwrap();
        let second = partition(&scaled, k, &params).unwrap();
        prop_assert_eq!(first.labels(), second.labels());

        prop_assert_eq!(first.labels().len(), table.len());
        let sizes = first.cluster_sizes();
        prop_assert_eq!(sizes.len(), k);
        prop_assert!(sizes.iter().all(|&size| size > 0));
    }

    #[test]
    fn sweep_inertia_never_increases(records in records(40)) {
        let table = aggregate(&records);
        let selection = selection();
        prop_assume!(distinct_rows(&table, &selection) >= 2);
        let scaled = scale_features(&table, &selection).unwrap();
        let params = AnalysisParams::new().max_k(6).check().unwrap();

        let inertias = select_model(&scaled, &params).unwrap().inertias();
        for pair in inertias.windows(2) {
            prop_assert!(pair[1] <= pair[0] + 1e-9 * pair[0].max(1.));
        }
    }

    #[test]
    fn profiles_conserve_totals(records in records(40)) {
        let table = aggregate(&records);
        let selection = selection();
        prop_assume!(distinct_rows(&table, &selection) >= 3);
        let scaled = scale_features(&table, &selection).unwrap();
        let params = AnalysisParams::new().max_k(3).check().unwrap();
        let partition = partition(&scaled, 3, &params).unwrap();

        let profiles = billing_analysis::profile::profile_clusters(&table, &partition).unwrap();
        for feature in Feature::ALL {
            let total: f64 = profiles.iter().map(|p| p.size() as f64 * p.mean(feature)).sum();
            let expected = table.total(feature);
            assert_abs_diff_eq!(total, expected, epsilon = 1e-9 * expected.abs().max(1.));
        }
    }
}
