//! Cleaned billing records and their CSV reader
use std::fs::File;
use std::io;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::Result;

/// One cleaned billing observation
///
/// Field names follow the headers of the cleaned dataset. Speeds that do not apply to a service
/// are empty cells in the source and read as 0.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "EMPRESA")]
    pub operator: String,
    #[serde(rename = "TECNOLOGIA")]
    pub technology: String,
    #[serde(rename = "SERVICIO_PAQUETE")]
    pub service: String,
    #[serde(rename = "DEPARTAMENTO")]
    pub department: String,
    #[serde(rename = "MUNICIPIO")]
    pub municipality: String,
    #[serde(rename = "ANNO")]
    pub year: i32,
    #[serde(rename = "TRIMESTRE")]
    pub quarter: u8,
    #[serde(rename = "CANTIDAD_LINEAS_ACCESOS")]
    pub lines: u64,
    #[serde(rename = "VALOR_FACTURADO_O_COBRADO")]
    pub value: f64,
    #[serde(
        rename = "VELOCIDAD_EFECTIVA_DOWNSTREAM",
        default,
        deserialize_with = "empty_as_zero"
    )]
    pub downstream: f64,
    #[serde(
        rename = "VELOCIDAD_EFECTIVA_UPSTREAM",
        default,
        deserialize_with = "empty_as_zero"
    )]
    pub upstream: f64,
}

fn empty_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.))
}

impl RawRecord {
    /// A record of the given combination with no lines, value or speed
    pub fn new(operator: &str, technology: &str, service: &str) -> Self {
        RawRecord {
            operator: operator.to_string(),
            technology: technology.to_string(),
            service: service.to_string(),
            department: String::new(),
            municipality: String::new(),
            year: 0,
            quarter: 1,
            lines: 0,
            value: 0.,
            downstream: 0.,
            upstream: 0.,
        }
    }

    pub fn lines(mut self, lines: u64) -> Self {
        self.lines = lines;
        self
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    /// Effective downstream and upstream speed in Mbps
    pub fn speeds(mut self, downstream: f64, upstream: f64) -> Self {
        self.downstream = downstream;
        self.upstream = upstream;
        self
    }

    pub fn location(mut self, department: &str, municipality: &str) -> Self {
        self.department = department.to_string();
        self.municipality = municipality.to_string();
        self
    }

    pub fn period(mut self, year: i32, quarter: u8) -> Self {
        self.year = year;
        self.quarter = quarter;
        self
    }
}

/// Read cleaned records from CSV data with a header row
///
/// Columns not used by the analysis are ignored.
pub fn read_records<R: io::Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut reader = csv::Reader::from_reader(reader);
    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<RawRecord>, csv::Error>>()?;
    tracing::info!(n_records = records.len(), "billing records loaded");
    Ok(records)
}

/// Read cleaned records from a CSV file, see [`read_records`]
pub fn read_records_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
    let file = File::open(path)?;
    read_records(io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    const CSV: &str = "\
ANNO,TRIMESTRE,EMPRESA,DEPARTAMENTO,MUNICIPIO,SERVICIO_PAQUETE,TECNOLOGIA,CANTIDAD_LINEAS_ACCESOS,VALOR_FACTURADO_O_COBRADO,VELOCIDAD_EFECTIVA_DOWNSTREAM,VELOCIDAD_EFECTIVA_UPSTREAM,SEGMENTO
2023,1,COLOMBIA TELECOMUNICACIONES,ANTIOQUIA,MEDELLIN,Internet fijo,Fibra optica,120,3600000.5,300,150,Residencial
2024,4,UNE EPM,BOGOTA,BOGOTA D.C.,Telefonia fija,Cobre,10,25000,,,Corporativo
";

    #[test]
    fn reads_records_and_ignores_extra_columns() {
        let records = read_records(CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            RawRecord::new("COLOMBIA TELECOMUNICACIONES", "Fibra optica", "Internet fijo")
                .location("ANTIOQUIA", "MEDELLIN")
                .period(2023, 1)
                .lines(120)
                .value(3600000.5)
                .speeds(300., 150.)
        );
    }

    #[test]
    fn empty_speeds_read_as_zero() {
        let records = read_records(CSV.as_bytes()).unwrap();
        assert_eq!(records[1].downstream, 0.);
        assert_eq!(records[1].upstream, 0.);
        assert_eq!(records[1].quarter, 4);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let csv = "EMPRESA,TECNOLOGIA\nA,B\n";
        let res = read_records(csv.as_bytes());
        assert!(matches!(res, Err(AnalysisError::Csv(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let res = read_records_from_path("/nonexistent/billing.csv");
        assert!(matches!(res, Err(AnalysisError::Io(_))));
    }
}
