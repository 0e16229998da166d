//! Delimited text exports of the labeled feature table and the cluster summary
use std::io;

use crate::aggregate::FeatureTable;
use crate::error::Result;
use crate::feature::FeatureSelection;
use crate::partition::Partition;
use crate::profile::ClusterSummary;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Columns of [`write_summary`]
pub const SUMMARY_HEADER: [&str; 6] = [
    "Cluster",
    "Total Lineas",
    "Prom Lineas",
    "Total Valor",
    "Prom Valor",
    "N Registros",
];

fn csv_writer<W: io::Write>(mut writer: W, bom: bool) -> Result<csv::Writer<W>> {
    if bom {
        writer.write_all(UTF8_BOM)?;
    }
    Ok(csv::Writer::from_writer(writer))
}

/// Write every feature row with its cluster
///
/// Columns: `EMPRESA,TECNOLOGIA,SERVICIO_PAQUETE,Cluster` followed by the selected features in
/// selection order. With `bom` the output starts with a UTF-8 byte order mark.
pub fn write_labeled_table<W: io::Write>(
    writer: W,
    table: &FeatureTable,
    selection: &FeatureSelection,
    partition: &Partition,
    bom: bool,
) -> Result<()> {
    if table.len() != partition.labels().len() {
        return Err(segmenta::error::Error::MismatchedLabels {
            samples: table.len(),
            labels: partition.labels().len(),
        }
        .into());
    }
    let mut writer = csv_writer(writer, bom)?;

    let mut header = vec![
        "EMPRESA".to_string(),
        "TECNOLOGIA".to_string(),
        "SERVICIO_PAQUETE".to_string(),
        "Cluster".to_string(),
    ];
    header.extend(selection.column_names());
    writer.write_record(&header)?;

    for (row, label) in table.rows().iter().zip(partition.labels()) {
        let mut record = vec![
            row.key.operator.clone(),
            row.key.technology.clone(),
            row.key.service.clone(),
            label.to_string(),
        ];
        record.extend(selection.iter().map(|feature| feature.extract(row).to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write one line per cluster, means rounded to two decimals
pub fn write_summary<W: io::Write>(writer: W, summary: &[ClusterSummary], bom: bool) -> Result<()> {
    let mut writer = csv_writer(writer, bom)?;
    writer.write_record(SUMMARY_HEADER)?;
    for row in summary {
        writer.write_record(&[
            row.cluster.to_string(),
            row.total_lines.to_string(),
            format!("{:.2}", row.mean_lines),
            row.total_value.to_string(),
            format!("{:.2}", row.mean_value),
            row.n_records.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> Vec<ClusterSummary> {
        vec![
            ClusterSummary {
                cluster: 0,
                total_lines: 150.,
                mean_lines: 75.,
                total_value: 1500.,
                mean_value: 750.,
                n_records: 2,
            },
            ClusterSummary {
                cluster: 1,
                total_lines: 200.,
                mean_lines: 200. / 3.,
                total_value: 4000.5,
                mean_value: 1333.5,
                n_records: 3,
            },
        ]
    }

    #[test]
    fn summary_columns_are_stable() {
        let mut out = Vec::new();
        write_summary(&mut out, &summary(), false).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Cluster,Total Lineas,Prom Lineas,Total Valor,Prom Valor,N Registros",
                "0,150,75.00,1500,750.00,2",
                "1,200,66.67,4000.5,1333.50,3",
            ]
        );
    }

    #[test]
    fn bom_prefix() {
        let mut out = Vec::new();
        write_summary(&mut out, &[], true).unwrap();
        assert!(out.starts_with(UTF8_BOM));
        assert_eq!(&out[UTF8_BOM.len()..], b"Cluster,Total Lineas,Prom Lineas,Total Valor,Prom Valor,N Registros\n");
    }
}
