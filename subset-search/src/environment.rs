use std::sync::Arc;

use common::{ClassifierReport, FeatureSet, InternalCvClassifier, ModelFitter, Observations};
use cross_validation::{evaluate, CvError, CvReport, FoldAssignment};

use crate::{SearchError, SubsetEnvironment};

/// Scores subsets by k-fold cross-validation against one fixed fold
/// assignment, so every candidate is compared on the same split
#[derive(Debug)]
pub struct CvEnvironment<F> {
    table: Arc<Observations>,
    folds: Arc<FoldAssignment>,
    fitter: F,
}

impl<F: ModelFitter> CvEnvironment<F> {
    /// Create a new environment, checking the fold assignment up front
    pub fn new(
        table: Arc<Observations>,
        folds: Arc<FoldAssignment>,
        fitter: F,
    ) -> Result<Self, SearchError> {
        if folds.len() != table.num_rows() {
            return Err(CvError::FoldLengthMismatch {
                expected: table.num_rows(),
                got: folds.len(),
            }
            .into());
        }
        folds.validate()?;

        Ok(Self {
            table,
            folds,
            fitter,
        })
    }

    /// The full cross-validation report of one subset
    pub fn report(&self, features: &FeatureSet) -> Result<CvReport, CvError> {
        evaluate(&self.table, features, &self.folds, &self.fitter)
    }

    #[inline(always)]
    pub fn table(&self) -> &Arc<Observations> {
        &self.table
    }

    #[inline(always)]
    pub fn folds(&self) -> &Arc<FoldAssignment> {
        &self.folds
    }

    #[inline(always)]
    pub fn fitter(&self) -> &F {
        &self.fitter
    }
}

impl<F: ModelFitter> SubsetEnvironment for CvEnvironment<F> {
    #[inline(always)]
    fn universe(&self) -> usize {
        self.table.num_predictors()
    }

    fn evaluate(&self, features: &FeatureSet) -> Result<f64, SearchError> {
        self.report(features)
            .map(|r| r.aggregate_error())
            .map_err(|source| SearchError::Evaluation {
                features: *features,
                source,
            })
    }
}

/// Scores subsets by the misclassification rate a classifier reports
/// from its own internal cross-validation
#[derive(Debug)]
pub struct ClassifierEnvironment<C> {
    table: Arc<Observations>,
    classifier: C,
}

impl<C: InternalCvClassifier> ClassifierEnvironment<C> {
    /// Create a new environment
    pub fn new(table: Arc<Observations>, classifier: C) -> Self {
        Self { table, classifier }
    }

    /// The classifier's report for one subset
    pub fn report(&self, features: &FeatureSet) -> Result<ClassifierReport, SearchError> {
        if features.universe() != self.table.num_predictors() {
            return Err(SearchError::Evaluation {
                features: *features,
                source: CvError::FeatureUniverseMismatch {
                    features: features.universe(),
                    table: self.table.num_predictors(),
                },
            });
        }
        let predictors = self.table.restrict_columns(features);

        self.classifier
            .cross_validate(&predictors, self.table.labels(), features)
            .map_err(|source| SearchError::Classifier {
                classifier: self.classifier.name().to_string(),
                features: *features,
                source,
            })
    }

    #[inline(always)]
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    #[inline(always)]
    pub fn table(&self) -> &Arc<Observations> {
        &self.table
    }
}

impl<C: InternalCvClassifier> SubsetEnvironment for ClassifierEnvironment<C> {
    #[inline(always)]
    fn universe(&self) -> usize {
        self.table.num_predictors()
    }

    fn evaluate(&self, features: &FeatureSet) -> Result<f64, SearchError> {
        self.report(features).map(|r| r.misclassification_rate)
    }
}
