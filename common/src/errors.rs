use lin_reg::LinRegError;
use thiserror::Error;

/// Problems with an observation table or a feature subset drawn from it
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// The table has no rows
    #[error("observation table is empty")]
    Empty,

    /// Identifiers, labels and predictor rows disagree in length
    #[error("{what}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Which part of the table is off
        what: &'static str,
        /// Length implied by the predictor matrix
        expected: usize,
        /// Length actually supplied
        got: usize,
    },

    /// A predictor value is NaN or infinite, which is how missing values surface
    #[error("non-finite predictor value at row {row}, column {col}")]
    NonFinite {
        /// Row index
        row: usize,
        /// Column index
        col: usize,
    },

    /// A label other than 0 or 1
    #[error("label {value} at row {row} is neither 0 nor 1")]
    InvalidLabel {
        /// Row index
        row: usize,
        /// Offending value
        value: f64,
    },

    /// Two rows share an identifier
    #[error("duplicate row identifier {0}")]
    DuplicateId(u64),

    /// More predictors than a feature mask can address
    #[error("predictor universe of {universe} does not fit in 1..={max}")]
    TooManyPredictors {
        /// Requested universe size
        universe: usize,
        /// Largest supported universe
        max: usize,
    },

    /// A feature index outside the predictor universe
    #[error("feature {index} is outside a universe of {universe} predictors")]
    FeatureOutOfRange {
        /// Offending index
        index: usize,
        /// Universe size
        universe: usize,
    },

    /// A feature subset must select at least one predictor
    #[error("feature subset is empty")]
    EmptyFeatureSet,
}

/// Failure of a model fitting collaborator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// No rows to fit on
    #[error("training set is empty")]
    EmptyTrainingSet,

    /// The underlying least squares solve failed
    #[error(transparent)]
    Regression(#[from] LinRegError),

    /// A classifier could not split its data into internal folds
    #[error("internal cross-validation split failed: {0}")]
    InternalSplit(String),
}
