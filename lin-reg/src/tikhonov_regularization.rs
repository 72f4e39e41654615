use nalgebra::{DMatrix, DVector};

use super::{check_dimensions, solve_normal_equations, LinReg, LinRegError};

/// Tikhonov regularization aka ridge regression
/// It is particularly useful to mitigate the problem of multicollinearity in
/// linear regression. The intercept column is left unpenalized.
#[derive(Debug, Clone)]
pub struct TikhonovRegularization {
    /// Ridge parameter
    pub regularization_coeff: f64,
}

impl LinReg for TikhonovRegularization {
    fn fit(
        &self,
        design: &DMatrix<f64>,
        targets: &DVector<f64>,
    ) -> Result<DVector<f64>, LinRegError> {
        check_dimensions(design, targets)?;

        let mut reg_m: DMatrix<f64> =
            DMatrix::from_diagonal_element(design.ncols(), design.ncols(), self.regularization_coeff);
        reg_m[(0, 0)] = 0.0;

        let p0 = design.transpose() * design;
        let p1 = design.transpose() * targets;

        solve_normal_equations(p0 + reg_m, p1)
    }
}
