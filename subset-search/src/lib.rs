//! Searching feature subsets for the one with the lowest cross-validated error

#[macro_use]
extern crate log;

use common::{DataError, FeatureSet, FitError};
use cross_validation::CvError;
use thiserror::Error;

mod best_subset;
mod environment;
mod exhaustive;
mod nested;
mod params;
mod penalty_grid;
mod pool;
mod scan;

pub use best_subset::{RssBestSubset, SelectedSubset, SubsetSelector};
pub use environment::{ClassifierEnvironment, CvEnvironment};
pub use exhaustive::{ExhaustiveOutcome, ExhaustiveSearch, MAX_EXHAUSTIVE_UNIVERSE};
pub use nested::{NestedOutcome, NestedSearch, SizeResult};
pub use params::{FailurePolicy, SearchParams};
pub use penalty_grid::{log_spaced_grid, PenaltyGridSearch, PenaltyOutcome, PenaltyResult};
pub use scan::{BestSoFar, CandidateResult, SkippedCandidate};

/// A place where feature subsets are scored
pub trait SubsetEnvironment {
    /// Number of predictors subsets are drawn from
    fn universe(&self) -> usize;

    /// Evaluates one feature subset
    ///
    /// # Returns:
    /// the aggregate error of the subset, lower is better
    fn evaluate(&self, features: &FeatureSet) -> Result<f64, SearchError>;
}

/// Everything that aborts a search
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("cross-validation of {features} failed: {source}")]
    Evaluation { features: FeatureSet, source: CvError },

    #[error("{classifier} classifier failed on {features}: {source}")]
    Classifier {
        classifier: String,
        features: FeatureSet,
        source: FitError,
    },

    #[error("best subset selection could not fit {features}: {source}")]
    Selection { features: FeatureSet, source: FitError },

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Cv(#[from] CvError),

    #[error("selection path needs one subset of each size 1..={expected}, found size {found} at position {position}")]
    MalformedPath {
        position: usize,
        expected: usize,
        found: usize,
    },

    #[error("penalty grid is empty")]
    EmptyGrid,

    #[error("penalty {0} is not a finite non-negative number")]
    InvalidPenalty(f64),

    #[error("exhaustive search over {universe} predictors exceeds the limit of {max}")]
    UniverseTooLarge { universe: usize, max: usize },

    #[error("result of candidate {0} never arrived from the worker pool")]
    WorkerLost(usize),
}
