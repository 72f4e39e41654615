use lin_reg::{LinReg, LinearModel};
use nalgebra::{DMatrix, DVector};

use crate::{ConfusionMatrix, FeatureSet, FitError};

/// Anything that maps predictor rows to fitted values
pub trait PredictiveModel {
    /// One fitted value per row of `predictors`
    fn predict(&self, predictors: &DMatrix<f64>) -> DVector<f64>;
}

/// A model fitting strategy, given a training subset already restricted
/// to the columns of one feature subset
pub trait ModelFitter: Send + Sync {
    /// The fitted model type
    type Model: PredictiveModel;

    /// Fit on the training rows
    ///
    /// # Arguments:
    /// predictors: Training rows, only the selected columns
    /// labels: 0/1 label of each training row
    fn fit(&self, predictors: &DMatrix<f64>, labels: &DVector<f64>)
        -> Result<Self::Model, FitError>;
}

impl PredictiveModel for LinearModel {
    #[inline(always)]
    fn predict(&self, predictors: &DMatrix<f64>) -> DVector<f64> {
        LinearModel::predict(self, predictors)
    }
}

/// Least squares regression of the 0/1 label on the predictors,
/// i.e. a linear probability model
#[derive(Debug, Clone)]
pub struct LinearProbabilityFitter<R> {
    regressor: R,
}

impl<R: LinReg> LinearProbabilityFitter<R> {
    /// Wrap a linear regression method
    pub fn new(regressor: R) -> Self {
        Self { regressor }
    }

    /// The wrapped regression method
    #[inline(always)]
    pub fn regressor(&self) -> &R {
        &self.regressor
    }
}

impl<R: LinReg> ModelFitter for LinearProbabilityFitter<R> {
    type Model = LinearModel;

    fn fit(
        &self,
        predictors: &DMatrix<f64>,
        labels: &DVector<f64>,
    ) -> Result<Self::Model, FitError> {
        if predictors.nrows() == 0 {
            return Err(FitError::EmptyTrainingSet);
        }

        Ok(LinearModel::fit(&self.regressor, predictors, labels)?)
    }
}

/// Outcome of a classifier's own cross-validation
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierReport {
    /// Fraction of held-out rows classified wrongly
    pub misclassification_rate: f64,
    /// Held-out predictions pooled over all internal folds
    pub confusion: ConfusionMatrix,
}

/// A classifier that performs its own cross-validation internally,
/// with a split of its own choosing
pub trait InternalCvClassifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Cross-validate on the given rows
    ///
    /// # Arguments:
    /// predictors: All rows, only the columns of `features`
    /// labels: 0/1 label of each row
    /// features: The feature subset the columns were taken from
    fn cross_validate(
        &self,
        predictors: &DMatrix<f64>,
        labels: &DVector<f64>,
        features: &FeatureSet,
    ) -> Result<ClassifierReport, FitError>;
}

#[cfg(test)]
mod tests {
    use lin_reg::{LinRegError, OrdinaryLeastSquares};
    use round::round;

    use super::*;

    #[test]
    fn linear_probability_fit() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let fitter = LinearProbabilityFitter::new(OrdinaryLeastSquares);
        let x = DMatrix::from_column_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = DVector::from_vec(vec![0.0, 0.0, 1.0, 1.0]);

        let model = fitter.fit(&x, &y).unwrap();
        let fitted = PredictiveModel::predict(&model, &x);
        assert_eq!(round(fitted[0], 6), -0.1);
        assert_eq!(round(fitted[3], 6), 1.1);
    }

    #[test]
    fn fit_errors() {
        let fitter = LinearProbabilityFitter::new(OrdinaryLeastSquares);
        assert_eq!(
            fitter.fit(&DMatrix::zeros(0, 2), &DVector::zeros(0)).unwrap_err(),
            FitError::EmptyTrainingSet
        );

        let x = DMatrix::from_column_slice(3, 2, &[1.0, 2.0, 3.0, 2.0, 4.0, 6.0]);
        let y = DVector::from_vec(vec![0.0, 1.0, 1.0]);
        assert_eq!(
            fitter.fit(&x, &y).unwrap_err(),
            FitError::Regression(LinRegError::RankDeficient { rank: 2, cols: 3 })
        );
    }
}
