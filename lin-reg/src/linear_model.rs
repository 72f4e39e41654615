use nalgebra::{DMatrix, DVector};

use super::{LinReg, LinRegError};

/// Prepend the column of 1s every design matrix starts with
pub fn with_intercept(predictors: &DMatrix<f64>) -> DMatrix<f64> {
    predictors.clone().insert_column(0, 1.0)
}

/// A fitted linear model, intercept first
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    coefficients: DVector<f64>,
}

impl LinearModel {
    /// Fit on raw predictors; the intercept column is added here
    pub fn fit<R: LinReg>(
        regressor: &R,
        predictors: &DMatrix<f64>,
        targets: &DVector<f64>,
    ) -> Result<Self, LinRegError> {
        let design = with_intercept(predictors);
        let coefficients = regressor.fit(&design, targets)?;
        trace!("fitted coefficients: {}", coefficients.transpose());

        Ok(Self { coefficients })
    }

    pub fn from_coefficients(coefficients: DVector<f64>) -> Self {
        Self { coefficients }
    }

    #[inline(always)]
    pub fn intercept(&self) -> f64 {
        self.coefficients[0]
    }

    /// Coefficients of the predictors, in column order
    #[inline(always)]
    pub fn slopes(&self) -> &[f64] {
        &self.coefficients.as_slice()[1..]
    }

    #[inline(always)]
    pub fn coefficients(&self) -> &DVector<f64> {
        &self.coefficients
    }

    /// Fitted values for each row of `predictors`
    ///
    /// # Panics
    /// If the column count differs from the one the model was fitted on
    pub fn predict(&self, predictors: &DMatrix<f64>) -> DVector<f64> {
        assert_eq!(
            predictors.ncols() + 1,
            self.coefficients.len(),
            "predictor columns do not match fitted coefficients"
        );
        with_intercept(predictors) * &self.coefficients
    }
}
