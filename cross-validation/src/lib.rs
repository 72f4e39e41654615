//! K-fold cross-validation: assigning rows to folds, scoring one feature
//! subset against a fixed assignment, and classifiers that run their own
//! internal cross-validation.

#[macro_use]
extern crate log;

use common::FitError;
use thiserror::Error;

mod classifier;
mod evaluator;
mod fold_partition;

pub use classifier::{Boundary, ThresholdedClassifier};
pub use evaluator::{evaluate, mean_squared_error, refit, weighted_fold_mean, CvReport, FoldError};
pub use fold_partition::{FoldAssignment, FoldPartitioner};

/// Everything that aborts a cross-validation run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CvError {
    #[error("need 2 <= folds <= rows, got {num_folds} folds for {num_rows} rows")]
    InvalidFoldCount { num_folds: usize, num_rows: usize },

    #[error("degenerate fold partition: folds {missing:?} received no rows")]
    DegenerateFoldPartition { missing: Vec<usize> },

    #[error("invalid fold partition: missing fold ids {missing:?}, out of range ids {out_of_range:?}")]
    InvalidFoldPartition {
        missing: Vec<usize>,
        out_of_range: Vec<usize>,
    },

    #[error("fold assignment covers {got} rows but the table has {expected}")]
    FoldLengthMismatch { expected: usize, got: usize },

    #[error("feature subset is empty")]
    EmptyFeatureSet,

    #[error("feature subset is drawn from {features} predictors but the table has {table}")]
    FeatureUniverseMismatch { features: usize, table: usize },

    #[error("fold {fold} holds no rows")]
    EmptyHeldOut { fold: usize },

    #[error("degenerate training set leaving out fold {fold}: {source}")]
    DegenerateTrainingSet { fold: usize, source: FitError },
}
