use common::{FeatureSet, FitError, ModelFitter, Observations, PredictiveModel};
use nalgebra::DVector;

use crate::{CvError, FoldAssignment};

/// Held-out error of a single fold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldError {
    /// Fold id in `1..=K`
    pub fold: usize,
    /// Number of held-out rows
    pub size: usize,
    /// Mean squared error over the held-out rows
    pub error: f64,
}

/// Result of cross-validating one configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CvReport {
    aggregate_error: f64,
    folds: Vec<FoldError>,
}

impl CvReport {
    /// Combine per-fold errors, weighting each fold by its size
    pub fn from_folds(folds: Vec<FoldError>) -> Self {
        Self {
            aggregate_error: weighted_fold_mean(&folds),
            folds,
        }
    }

    /// The fold size weighted mean of the per-fold errors
    #[inline(always)]
    pub fn aggregate_error(&self) -> f64 {
        self.aggregate_error
    }

    #[inline(always)]
    pub fn folds(&self) -> &[FoldError] {
        &self.folds
    }

    /// Standard error of the aggregate, from the fold size weighted spread
    /// of the per-fold errors around it
    pub fn standard_error(&self) -> f64 {
        let k = self.folds.len();
        if k < 2 {
            return 0.0;
        }
        let total: usize = self.folds.iter().map(|f| f.size).sum();
        let spread: f64 = self
            .folds
            .iter()
            .map(|f| f.size as f64 * (f.error - self.aggregate_error).powi(2))
            .sum::<f64>()
            / total as f64;

        (spread / (k - 1) as f64).sqrt()
    }
}

/// `sum(size * error) / sum(size)`, not the plain average of the folds
pub fn weighted_fold_mean(folds: &[FoldError]) -> f64 {
    let total: usize = folds.iter().map(|f| f.size).sum();
    if total == 0 {
        return 0.0;
    }

    folds.iter().map(|f| f.size as f64 * f.error).sum::<f64>() / total as f64
}

/// Mean of the squared differences, 0 for empty vectors
///
/// # Panics
/// If the lengths differ
pub fn mean_squared_error(targets: &DVector<f64>, fitted: &DVector<f64>) -> f64 {
    assert_eq!(targets.len(), fitted.len());
    if targets.is_empty() {
        return 0.0;
    }

    (targets - fitted).norm_squared() / targets.len() as f64
}

/// Cross-validate one feature subset against a fixed fold assignment.
///
/// For each fold the fitter is trained on all other folds, restricted to
/// `features`, and the squared error of its predictions on the held-out
/// 0/1 labels is averaged. The per-fold errors are combined with weights
/// proportional to the fold sizes.
///
/// # Arguments:
/// table: The cleaned observations
/// features: Predictor columns to use
/// folds: Fold id of every row of `table`, shared by all compared subsets
/// fitter: The model fitting strategy
pub fn evaluate<F>(
    table: &Observations,
    features: &FeatureSet,
    folds: &FoldAssignment,
    fitter: &F,
) -> Result<CvReport, CvError>
where
    F: ModelFitter,
{
    if features.is_empty() {
        return Err(CvError::EmptyFeatureSet);
    }
    if features.universe() != table.num_predictors() {
        return Err(CvError::FeatureUniverseMismatch {
            features: features.universe(),
            table: table.num_predictors(),
        });
    }
    if folds.len() != table.num_rows() {
        return Err(CvError::FoldLengthMismatch {
            expected: table.num_rows(),
            got: folds.len(),
        });
    }
    folds.validate()?;

    let mut fold_errors = Vec::with_capacity(folds.num_folds());
    for fold in 1..=folds.num_folds() {
        let held_out = folds.rows_in(fold);
        if held_out.is_empty() {
            return Err(CvError::EmptyHeldOut { fold });
        }
        let training = folds.rows_outside(fold);
        if training.is_empty() {
            return Err(CvError::DegenerateTrainingSet {
                fold,
                source: FitError::EmptyTrainingSet,
            });
        }

        let (train_x, train_y) = table.restrict(&training, features);
        let model = fitter
            .fit(&train_x, &train_y)
            .map_err(|source| CvError::DegenerateTrainingSet { fold, source })?;

        let (test_x, test_y) = table.restrict(&held_out, features);
        let fitted = model.predict(&test_x);
        let error = mean_squared_error(&test_y, &fitted);
        trace!("{} fold {}: {} held out, mse {:.5}", features, fold, held_out.len(), error);

        fold_errors.push(FoldError {
            fold,
            size: held_out.len(),
            error,
        });
    }

    let report = CvReport::from_folds(fold_errors);
    debug!("{}: cv error {:.5}", features, report.aggregate_error());

    Ok(report)
}

/// Fit the chosen configuration once more on every row
pub fn refit<F>(table: &Observations, features: &FeatureSet, fitter: &F) -> Result<F::Model, FitError>
where
    F: ModelFitter,
{
    let all_rows: Vec<usize> = (0..table.num_rows()).collect();
    let (x, y) = table.restrict(&all_rows, features);

    fitter.fit(&x, &y)
}
