use std::{fs::File, io::Read};

use common::{DataError, Diagnosis, Observations};
use nalgebra::DMatrix;
use nanorand::{Rng, WyRand};
use thiserror::Error;

pub(crate) const PREDICTOR_NAMES: [&str; 9] = [
    "thickness",
    "cell size",
    "cell shape",
    "marginal adhesion",
    "epithelial size",
    "bare nuclei",
    "bland chromatin",
    "normal nucleoli",
    "mitoses",
];

/// id, nine ordinal predictors, class
const RECORD_LEN: usize = 11;

#[derive(Debug, Error)]
pub(crate) enum LoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("record {record} has {got} fields, expected {}", RECORD_LEN)]
    RecordLength { record: usize, got: usize },

    #[error("record {record}: cannot parse {value:?} as a number")]
    Parse { record: usize, value: String },

    #[error("record {record}: class must be 2 (benign) or 4 (malignant), got {value}")]
    InvalidClass { record: usize, value: String },

    #[error("no complete records")]
    NoCompleteRecords,

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Load the UCI breast cancer file from disk
pub(crate) fn load_file(path: &str) -> Result<Observations, LoadError> {
    let f = File::open(path)?;

    load_csv(f)
}

/// Parse headerless UCI records, dropping those with a missing (`?`) value.
/// Sample code numbers repeat in the file, so rows are identified by their
/// position among the records instead.
pub(crate) fn load_csv<R: Read>(reader: R) -> Result<Observations, LoadError> {
    let mut r = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut ids: Vec<u64> = vec![];
    let mut values: Vec<f64> = vec![];
    let mut diagnoses: Vec<Diagnosis> = vec![];
    let mut dropped = 0;
    for (record, row) in r.records().enumerate() {
        let row = row?;
        if row.len() != RECORD_LEN {
            return Err(LoadError::RecordLength {
                record,
                got: row.len(),
            });
        }
        if row.iter().any(|field| field == "?") {
            dropped += 1;
            continue;
        }

        for field in row.iter().skip(1).take(PREDICTOR_NAMES.len()) {
            let v: f64 = field.parse().map_err(|_| LoadError::Parse {
                record,
                value: field.to_string(),
            })?;
            values.push(v);
        }
        let diagnosis = match &row[RECORD_LEN - 1] {
            "2" => Diagnosis::Benign,
            "4" => Diagnosis::Malignant,
            other => {
                return Err(LoadError::InvalidClass {
                    record,
                    value: other.to_string(),
                })
            }
        };
        diagnoses.push(diagnosis);
        ids.push(record as u64);
    }
    if diagnoses.is_empty() {
        return Err(LoadError::NoCompleteRecords);
    }
    info!("loaded {} complete records, dropped {} with missing values", diagnoses.len(), dropped);

    let predictors = DMatrix::from_row_slice(diagnoses.len(), PREDICTOR_NAMES.len(), &values);

    Ok(Observations::new(ids, names(), predictors, &diagnoses)?)
}

/// A reproducible stand-in for the UCI cohort: ordinal predictors in 1..=10
/// that run high for malignant rows, each with its own share of noise.
pub(crate) fn synthesize(num_rows: usize, seed: Option<u64>) -> Result<Observations, DataError> {
    // probability that a predictor follows the diagnosis rather than noise
    const SIGNAL: [f64; 9] = [0.7, 0.9, 0.85, 0.6, 0.6, 0.85, 0.7, 0.65, 0.15];

    let mut rng = match seed {
        Some(seed) => WyRand::new_seed(seed),
        None => WyRand::new(),
    };

    let mut values: Vec<f64> = Vec::with_capacity(num_rows * SIGNAL.len());
    let mut diagnoses: Vec<Diagnosis> = Vec::with_capacity(num_rows);
    for _ in 0..num_rows {
        let diagnosis = if rng.generate::<f64>() < 0.35 {
            Diagnosis::Malignant
        } else {
            Diagnosis::Benign
        };
        for signal in SIGNAL.iter() {
            let v = if rng.generate::<f64>() < *signal {
                match diagnosis {
                    Diagnosis::Benign => rng.generate_range(1_u32..=3),
                    Diagnosis::Malignant => rng.generate_range(4_u32..=10),
                }
            } else {
                rng.generate_range(1_u32..=10)
            };
            values.push(v as f64);
        }
        diagnoses.push(diagnosis);
    }
    let predictors = DMatrix::from_row_slice(num_rows, SIGNAL.len(), &values);

    Observations::new((0..num_rows as u64).collect(), names(), predictors, &diagnoses)
}

fn names() -> Vec<String> {
    PREDICTOR_NAMES.iter().map(|n| n.to_string()).collect()
}
