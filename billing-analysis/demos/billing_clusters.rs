//! Cluster a cleaned billing CSV and print the sweep and the cluster profiles
//!
//! ```sh
//! RUST_LOG=billing_analysis=debug cargo run --example billing_clusters -- records.csv 4 \
//!     CANTIDAD_LINEAS_ACCESOS,VALOR_FACTURADO_O_COBRADO,VELOCIDAD_EFECTIVA_DOWNSTREAM
//! ```
use std::env;
use std::error::Error;
use std::io;

use billing_analysis::{read_records_from_path, AnalysisParams, Feature, FeatureSelection, Unconfigured};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("billing_analysis=info")),
        )
        .init();

    let mut args = env::args().skip(1);
    let path = args.next().ok_or("usage: billing_clusters <records.csv> [k] [features]")?;
    let k: Option<usize> = args.next().map(|k| k.parse()).transpose()?;
    let selection = match args.next() {
        Some(names) => names.parse::<FeatureSelection>()?,
        None => FeatureSelection::default(),
    };

    let records = read_records_from_path(&path)?;
    let data = Unconfigured::new(&records);
    let overview = data.overview();
    println!(
        "{} combinations from {} records: {} operators, {} technologies, {} services",
        overview.n_rows,
        overview.n_records,
        overview.n_operators,
        overview.n_technologies,
        overview.n_services
    );

    let configured = data.configure(selection, AnalysisParams::new())?;
    for warning in configured.warnings() {
        println!("warning: {}", warning);
    }
    for stats in configured.statistics() {
        println!(
            "{:<32} mean {:>14.2} std {:>14.2} cv {:>7.2}%",
            stats.feature, stats.mean, stats.std, stats.coefficient_of_variation
        );
    }

    let explored = configured.explore()?;
    let selection = explored.selection();
    println!("\n k  inertia      silhouette  calinski-harabasz  davies-bouldin");
    for c in selection.candidates() {
        println!(
            "{:>2}  {:>11.3}  {:>10.4}  {:>17.3}  {:>14.4}",
            c.k, c.inertia, c.silhouette, c.calinski_harabasz, c.davies_bouldin
        );
    }
    println!(
        "best k: silhouette {}, calinski-harabasz {}, davies-bouldin {}",
        selection.best_silhouette_k(),
        selection.best_calinski_harabasz_k(),
        selection.best_davies_bouldin_k()
    );

    let k = k.unwrap_or_else(|| selection.best_silhouette_k());
    let profiled = explored.partition(k)?.profile()?;
    let ratios = profiled.projection().planar().explained_variance_ratio();
    println!(
        "\nk = {}, PC1 {:.1}% PC2 {:.1}% of the variance",
        k,
        ratios[0] * 100.,
        ratios[1] * 100.
    );
    for (profile, composition) in profiled.profiles().iter().zip(profiled.compositions()) {
        println!(
            "cluster {}: {} rows, {} operators, mean lines {:.1}, mean value {:.1}",
            profile.cluster(),
            profile.size(),
            composition.operators.len(),
            profile.mean(Feature::Lines),
            profile.mean(Feature::Value)
        );
    }

    println!();
    profiled.write_summary(io::stdout().lock(), false)?;
    Ok(())
}
