#[macro_use]
extern crate log;

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

mod linear_model;
mod ordinary_least_squares;
mod tikhonov_regularization;

pub use linear_model::{with_intercept, LinearModel};
pub use ordinary_least_squares::OrdinaryLeastSquares;
pub use tikhonov_regularization::TikhonovRegularization;

/// Everything that can go wrong while solving for regression coefficients
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinRegError {
    #[error("design matrix has no rows")]
    EmptyDesign,

    #[error("design matrix has {design_rows} rows but there are {target_rows} targets")]
    DimensionMismatch { design_rows: usize, target_rows: usize },

    #[error("design matrix is rank deficient: rank {rank} of {cols} columns")]
    RankDeficient { rank: usize, cols: usize },

    #[error("normal equations are not positive definite")]
    Singular,
}

/// Generic way of performing linear regression and fitting the coefficient vector
pub trait LinReg: Clone + Send + Sync {
    /// Fit a coefficient vector, mapping design rows to targets
    ///
    /// # Parameters
    /// design: Input data, where the first column should be just 1s
    /// targets: One target value per design row
    fn fit(&self, design: &DMatrix<f64>, targets: &DVector<f64>)
        -> Result<DVector<f64>, LinRegError>;
}

/// Number of singular values of `design` above the usual numerical tolerance,
/// `max(sv) * max(rows, cols) * eps`
pub fn numerical_rank(design: &DMatrix<f64>) -> usize {
    if design.is_empty() {
        return 0;
    }
    let svd = design.clone().svd(false, false);
    let largest = svd.singular_values.max();
    let tolerance = largest * design.nrows().max(design.ncols()) as f64 * f64::EPSILON;

    svd.singular_values.iter().filter(|s| **s > tolerance).count()
}

pub(crate) fn check_dimensions(
    design: &DMatrix<f64>,
    targets: &DVector<f64>,
) -> Result<(), LinRegError> {
    if design.nrows() == 0 {
        return Err(LinRegError::EmptyDesign);
    }
    if design.nrows() != targets.len() {
        return Err(LinRegError::DimensionMismatch {
            design_rows: design.nrows(),
            target_rows: targets.len(),
        });
    }
    Ok(())
}

/// Solve `gram * beta = rhs` for a symmetric positive definite `gram`
pub(crate) fn solve_normal_equations(
    gram: DMatrix<f64>,
    rhs: DVector<f64>,
) -> Result<DVector<f64>, LinRegError> {
    let cholesky = gram.cholesky().ok_or(LinRegError::Singular)?;

    Ok(cholesky.solve(&rhs))
}
