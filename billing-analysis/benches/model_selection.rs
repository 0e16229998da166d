use billing_analysis::{
    aggregate, scale_features, select_model, AnalysisParams, Feature, FeatureSelection, RawRecord,
    ScaledFeatures,
};
use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion,
    PlotConfiguration,
};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use segmenta::ParamGuard;

const TECHNOLOGIES: [&str; 4] = ["Cobre", "Fibra", "HFC", "Inalambrico"];
const SERVICES: [&str; 3] = ["Internet", "Telefonia", "Television"];

/// Scaled feature table with roughly `n_operators * 12` operator/technology/service groups
fn billing_table(n_operators: usize, rng: &mut Xoshiro256Plus) -> ScaledFeatures {
    let mut records = Vec::new();
    for operator in 0..n_operators {
        // small, regional and national operators bill on very different scales
        let scale = [1., 50., 2_000.][operator % 3];
        for technology in TECHNOLOGIES {
            for service in SERVICES {
                for quarter in 1..=4 {
                    let lines = (rng.gen_range(1. ..100.) * scale) as u64;
                    records.push(
                        RawRecord::new(&format!("OPERADOR {}", operator), technology, service)
                            .lines(lines)
                            .value(lines as f64 * rng.gen_range(20_000. ..90_000.))
                            .speeds(rng.gen_range(1. ..900.), rng.gen_range(0.5..300.))
                            .period(2023, quarter),
                    );
                }
            }
        }
    }
    let selection = FeatureSelection::new([
        Feature::Lines,
        Feature::Value,
        Feature::Downstream,
        Feature::ValuePerLine,
    ])
    .unwrap();
    scale_features(&aggregate(&records), &selection).unwrap()
}

fn model_selection_bench(c: &mut Criterion) {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let params = AnalysisParams::new().max_k(15).check().unwrap();

    let mut benchmark = c.benchmark_group("model_selection");
    benchmark.sample_size(10);
    benchmark.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
    for n_operators in [10, 40, 120] {
        let scaled = billing_table(n_operators, &mut rng);
        benchmark.bench_function(BenchmarkId::new("select_model", scaled.nrows()), |bencher| {
            bencher.iter(|| select_model(black_box(&scaled), black_box(&params)).unwrap());
        });
    }

    benchmark.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = model_selection_bench
}
criterion_main!(benches);
