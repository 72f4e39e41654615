use std::collections::HashSet;

use nalgebra::{DMatrix, DVector};

use crate::{DataError, FeatureSet, MAX_UNIVERSE};

/// The binary outcome of a biopsy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Diagnosis {
    /// Encoded as label 0
    Benign,
    /// Encoded as label 1
    Malignant,
}

impl Diagnosis {
    /// The numeric label used as regression target
    #[inline(always)]
    pub fn label(self) -> f64 {
        match self {
            Diagnosis::Benign => 0.0,
            Diagnosis::Malignant => 1.0,
        }
    }

    /// Inverse of `label`, `None` for anything but 0 or 1
    pub fn from_label(label: f64) -> Option<Self> {
        if label == 0.0 {
            Some(Diagnosis::Benign)
        } else if label == 1.0 {
            Some(Diagnosis::Malignant)
        } else {
            None
        }
    }

    /// Threshold a fitted probability at one half
    #[inline(always)]
    pub fn from_fitted(value: f64) -> Self {
        if value >= 0.5 {
            Diagnosis::Malignant
        } else {
            Diagnosis::Benign
        }
    }
}

/// A cleaned observation table: one row per biopsy, `p` numeric predictor
/// columns and a 0/1 label. Contains no missing values.
#[derive(Debug, Clone)]
pub struct Observations {
    ids: Vec<u64>,
    predictor_names: Vec<String>,
    predictors: DMatrix<f64>,
    labels: DVector<f64>,
}

impl Observations {
    /// Create a new table from diagnoses
    ///
    /// # Arguments:
    /// ids: Unique row identifiers
    /// predictor_names: One name per predictor column
    /// predictors: Rows are observations, columns are predictors
    /// diagnoses: The outcome of each row
    pub fn new(
        ids: Vec<u64>,
        predictor_names: Vec<String>,
        predictors: DMatrix<f64>,
        diagnoses: &[Diagnosis],
    ) -> Result<Self, DataError> {
        let labels = DVector::from_iterator(diagnoses.len(), diagnoses.iter().map(|d| d.label()));

        Self::from_labels(ids, predictor_names, predictors, labels)
    }

    /// Create a new table from numeric labels, which must be 0 or 1
    pub fn from_labels(
        ids: Vec<u64>,
        predictor_names: Vec<String>,
        predictors: DMatrix<f64>,
        labels: DVector<f64>,
    ) -> Result<Self, DataError> {
        let n = predictors.nrows();
        if n == 0 {
            return Err(DataError::Empty);
        }
        if predictors.ncols() == 0 || predictors.ncols() > MAX_UNIVERSE {
            return Err(DataError::TooManyPredictors {
                universe: predictors.ncols(),
                max: MAX_UNIVERSE,
            });
        }
        check_len("identifiers", n, ids.len())?;
        check_len("labels", n, labels.len())?;
        check_len("predictor names", predictors.ncols(), predictor_names.len())?;

        for row in 0..n {
            for col in 0..predictors.ncols() {
                if !predictors[(row, col)].is_finite() {
                    return Err(DataError::NonFinite { row, col });
                }
            }
        }
        for (row, value) in labels.iter().enumerate() {
            if Diagnosis::from_label(*value).is_none() {
                return Err(DataError::InvalidLabel { row, value: *value });
            }
        }
        let mut seen = HashSet::with_capacity(n);
        for id in ids.iter() {
            if !seen.insert(*id) {
                return Err(DataError::DuplicateId(*id));
            }
        }

        Ok(Self {
            ids,
            predictor_names,
            predictors,
            labels,
        })
    }

    /// Number of observations
    #[inline(always)]
    pub fn num_rows(&self) -> usize {
        self.predictors.nrows()
    }

    /// Number of predictor columns, the universe feature subsets draw from
    #[inline(always)]
    pub fn num_predictors(&self) -> usize {
        self.predictors.ncols()
    }

    /// Row identifiers
    #[inline(always)]
    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    /// Predictor column names
    #[inline(always)]
    pub fn predictor_names(&self) -> &[String] {
        &self.predictor_names
    }

    /// The full predictor matrix
    #[inline(always)]
    pub fn predictors(&self) -> &DMatrix<f64> {
        &self.predictors
    }

    /// 0/1 labels
    #[inline(always)]
    pub fn labels(&self) -> &DVector<f64> {
        &self.labels
    }

    /// Counts of (benign, malignant) rows
    pub fn class_counts(&self) -> (usize, usize) {
        let malignant = self.labels.iter().filter(|l| **l == 1.0).count();
        (self.num_rows() - malignant, malignant)
    }

    /// Copy out the given rows, keeping only the columns in `features`
    pub fn restrict(&self, rows: &[usize], features: &FeatureSet) -> (DMatrix<f64>, DVector<f64>) {
        let columns = features.indices();
        let predictors = self.predictors.select_rows(rows.iter()).select_columns(columns.iter());
        let labels = self.labels.select_rows(rows.iter());

        (predictors, labels)
    }

    /// Copy out all rows, keeping only the columns in `features`
    pub fn restrict_columns(&self, features: &FeatureSet) -> DMatrix<f64> {
        let columns = features.indices();
        self.predictors.select_columns(columns.iter())
    }

    /// Scale every predictor column to zero mean and unit sample standard deviation.
    /// Constant columns are only centred.
    pub fn standardized(&self) -> Self {
        let n = self.num_rows();
        let mut predictors = self.predictors.clone();
        for (j, mut column) in predictors.column_iter_mut().enumerate() {
            let mean = column.sum() / n as f64;
            let sum_sq: f64 = column.iter().map(|v| (v - mean).powi(2)).sum();
            let sd = if n > 1 {
                (sum_sq / (n - 1) as f64).sqrt()
            } else {
                0.0
            };
            if sd == 0.0 {
                debug!("column {} is constant, centring only", self.predictor_names[j]);
            }
            for v in column.iter_mut() {
                *v -= mean;
                if sd > 0.0 {
                    *v /= sd;
                }
            }
        }

        Self {
            ids: self.ids.clone(),
            predictor_names: self.predictor_names.clone(),
            predictors,
            labels: self.labels.clone(),
        }
    }
}

fn check_len(what: &'static str, expected: usize, got: usize) -> Result<(), DataError> {
    if expected != got {
        return Err(DataError::DimensionMismatch {
            what,
            expected,
            got,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use round::round;

    use super::*;

    fn names(p: usize) -> Vec<String> {
        (0..p).map(|i| format!("x{}", i)).collect()
    }

    fn small_table() -> Observations {
        let predictors = DMatrix::from_row_slice(
            4,
            2,
            &[1.0, 10.0, 2.0, 10.0, 3.0, 10.0, 6.0, 10.0],
        );
        Observations::new(
            vec![1, 2, 3, 4],
            names(2),
            predictors,
            &[Diagnosis::Benign, Diagnosis::Benign, Diagnosis::Malignant, Diagnosis::Malignant],
        )
        .unwrap()
    }

    #[test]
    fn diagnosis_labels() {
        assert_eq!(Diagnosis::Benign.label(), 0.0);
        assert_eq!(Diagnosis::from_label(1.0), Some(Diagnosis::Malignant));
        assert_eq!(Diagnosis::from_label(2.0), None);
        assert_eq!(Diagnosis::from_fitted(0.5), Diagnosis::Malignant);
        assert_eq!(Diagnosis::from_fitted(0.49), Diagnosis::Benign);
    }

    #[test]
    fn validation() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let predictors = DMatrix::from_row_slice(2, 1, &[1.0, f64::NAN]);
        assert_eq!(
            Observations::from_labels(vec![1, 2], names(1), predictors, DVector::from_vec(vec![0.0, 1.0]))
                .unwrap_err(),
            DataError::NonFinite { row: 1, col: 0 }
        );

        let predictors = DMatrix::from_row_slice(2, 1, &[1.0, 2.0]);
        assert_eq!(
            Observations::from_labels(
                vec![1, 2],
                names(1),
                predictors.clone(),
                DVector::from_vec(vec![0.0, 4.0])
            )
            .unwrap_err(),
            DataError::InvalidLabel { row: 1, value: 4.0 }
        );
        assert_eq!(
            Observations::from_labels(
                vec![7, 7],
                names(1),
                predictors.clone(),
                DVector::from_vec(vec![0.0, 1.0])
            )
            .unwrap_err(),
            DataError::DuplicateId(7)
        );
        assert!(matches!(
            Observations::from_labels(vec![1], names(1), predictors, DVector::from_vec(vec![0.0, 1.0])),
            Err(DataError::DimensionMismatch {
                what: "identifiers",
                ..
            })
        ));
    }

    #[test]
    fn restrict_rows_and_columns() {
        let table = small_table();
        assert_eq!(table.class_counts(), (2, 2));

        let features = FeatureSet::from_indices(&[0], 2).unwrap();
        let (x, y) = table.restrict(&[1, 3], &features);
        assert_eq!(x, DMatrix::from_row_slice(2, 1, &[2.0, 6.0]));
        assert_eq!(y, DVector::from_vec(vec![0.0, 1.0]));
        assert_eq!(table.restrict_columns(&features).nrows(), 4);
    }

    #[test]
    fn standardize() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let table = small_table().standardized();
        let first = table.predictors().column(0);
        assert_eq!(round(first.sum(), 9), 0.0);
        let var: f64 = first.iter().map(|v| v * v).sum::<f64>() / 3.0;
        assert_eq!(round(var, 9), 1.0);

        // constant column is centred only
        assert!(table.predictors().column(1).iter().all(|v| *v == 0.0));
        assert_eq!(table.labels(), small_table().labels());
    }
}
