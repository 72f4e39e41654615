use nalgebra::{DMatrix, DVector};

use super::{check_dimensions, numerical_rank, solve_normal_equations, LinReg, LinRegError};

/// Plain least squares through the normal equations.
/// Refuses designs whose columns are linearly dependent instead of
/// returning one of infinitely many solutions.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrdinaryLeastSquares;

impl LinReg for OrdinaryLeastSquares {
    fn fit(
        &self,
        design: &DMatrix<f64>,
        targets: &DVector<f64>,
    ) -> Result<DVector<f64>, LinRegError> {
        check_dimensions(design, targets)?;

        let rank = numerical_rank(design);
        if rank < design.ncols() {
            return Err(LinRegError::RankDeficient {
                rank,
                cols: design.ncols(),
            });
        }

        let gram = design.transpose() * design;
        let rhs = design.transpose() * targets;

        solve_normal_equations(gram, rhs)
    }
}
