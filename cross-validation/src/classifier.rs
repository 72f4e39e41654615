use common::{
    ClassifierReport, ConfusionMatrix, FeatureSet, FitError, InternalCvClassifier,
};
use lin_reg::{LinReg, LinearModel};
use nalgebra::{DMatrix, DVector};

use crate::FoldPartitioner;

/// Shape of the decision boundary a thresholded classifier can draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Hyperplane in the selected predictors
    Linear,
    /// Quadric surface: the predictors plus all of their degree two monomials
    Quadratic,
}

impl Boundary {
    /// Number of columns `expand` produces from `d` predictors
    pub fn num_terms(&self, d: usize) -> usize {
        match self {
            Boundary::Linear => d,
            Boundary::Quadratic => d + d * (d + 1) / 2,
        }
    }

    /// Construct the full feature matrix from the linear part
    pub fn expand(&self, lin_part: &DMatrix<f64>) -> DMatrix<f64> {
        match self {
            Boundary::Linear => lin_part.clone(),
            Boundary::Quadratic => {
                let d_lin = lin_part.ncols();
                let mut full_features = lin_part.clone().resize_horizontally(self.num_terms(d_lin), 0.0);

                let mut cnt: usize = 0;
                for i in 0..d_lin {
                    for j in i..d_lin {
                        let column = lin_part.column(i).component_mul(&lin_part.column(j));
                        full_features.set_column(d_lin + cnt, &column);
                        cnt += 1;
                    }
                }

                full_features
            }
        }
    }
}

/// Classifies a biopsy as malignant when a least squares fit of the 0/1
/// label, over a linear or quadratic feature map, reaches one half.
///
/// This is not discriminant analysis: no class covariances are estimated,
/// so its rates are not those of LDA or QDA.
///
/// Scoring draws a fresh internal K-fold split per feature subset, so two
/// candidates are generally not compared on the same split.
#[derive(Debug, Clone)]
pub struct ThresholdedClassifier<R> {
    name: String,
    regressor: R,
    boundary: Boundary,
    num_folds: usize,
    seed: Option<u64>,
}

impl<R: LinReg> ThresholdedClassifier<R> {
    /// Create a new classifier
    ///
    /// # Arguments:
    /// regressor: The linear regression used to fit the label
    /// boundary: Linear or quadratic decision boundary
    /// num_folds: K of the internal cross-validation
    /// seed: Base seed of the internal splits, None draws them from entropy
    pub fn new(regressor: R, boundary: Boundary, num_folds: usize, seed: Option<u64>) -> Self {
        let name = match boundary {
            Boundary::Linear => "linear",
            Boundary::Quadratic => "quadratic",
        };

        Self {
            name: name.to_string(),
            regressor,
            boundary,
            num_folds,
            seed,
        }
    }

    #[inline(always)]
    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Seed of the internal split used for `features`
    pub fn internal_seed(&self, features: &FeatureSet) -> Option<u64> {
        self.seed
            .map(|seed| seed.wrapping_add((features.mask() as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)))
    }

    /// Fit on every row and return the model together with its resubstitution
    /// confusion matrix
    pub fn fit_all(
        &self,
        predictors: &DMatrix<f64>,
        labels: &DVector<f64>,
    ) -> Result<(LinearModel, ConfusionMatrix), FitError> {
        let expanded = self.boundary.expand(predictors);
        let model = LinearModel::fit(&self.regressor, &expanded, labels)?;
        let confusion = ConfusionMatrix::from_fitted(labels, &model.predict(&expanded));

        Ok((model, confusion))
    }
}

impl<R: LinReg> InternalCvClassifier for ThresholdedClassifier<R> {
    #[inline(always)]
    fn name(&self) -> &str {
        &self.name
    }

    fn cross_validate(
        &self,
        predictors: &DMatrix<f64>,
        labels: &DVector<f64>,
        features: &FeatureSet,
    ) -> Result<ClassifierReport, FitError> {
        let expanded = self.boundary.expand(predictors);
        let folds = FoldPartitioner::new(self.num_folds, self.internal_seed(features))
            .partition(expanded.nrows())
            .map_err(|e| FitError::InternalSplit(e.to_string()))?;

        let mut confusion = ConfusionMatrix::default();
        for fold in 1..=folds.num_folds() {
            let held_out = folds.rows_in(fold);
            let training = folds.rows_outside(fold);

            let train_x = expanded.select_rows(training.iter());
            let train_y = labels.select_rows(training.iter());
            let model = LinearModel::fit(&self.regressor, &train_x, &train_y)?;

            let fitted = model.predict(&expanded.select_rows(held_out.iter()));
            confusion += ConfusionMatrix::from_fitted(&labels.select_rows(held_out.iter()), &fitted);
        }
        trace!("{} {}: {} misclassified", self.name, features, confusion.total() - confusion.correct());

        Ok(ClassifierReport {
            misclassification_rate: confusion.misclassification_rate(),
            confusion,
        })
    }
}

#[cfg(test)]
mod tests {
    use lin_reg::{OrdinaryLeastSquares, TikhonovRegularization};

    use super::*;

    fn column(values: &[f64]) -> DMatrix<f64> {
        DMatrix::from_column_slice(values.len(), 1, values)
    }

    #[test]
    fn quadratic_expansion() {
        let lin_part = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let full = Boundary::Quadratic.expand(&lin_part);

        assert_eq!(Boundary::Quadratic.num_terms(2), 5);
        assert_eq!(full.ncols(), 5);
        // x0, x1, x0^2, x0*x1, x1^2
        assert_eq!(full.row(0).iter().copied().collect::<Vec<_>>(), vec![1.0, 2.0, 1.0, 2.0, 4.0]);
        assert_eq!(full.row(1).iter().copied().collect::<Vec<_>>(), vec![3.0, 4.0, 9.0, 12.0, 16.0]);
        assert_eq!(Boundary::Linear.expand(&lin_part), lin_part);
    }

    #[test]
    fn separable_data_is_classified() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for v in 10..=40 {
            xs.push(-(v as f64));
            ys.push(0.0);
            xs.push(v as f64);
            ys.push(1.0);
        }
        let features = FeatureSet::full(1).unwrap();
        let classifier = ThresholdedClassifier::new(OrdinaryLeastSquares, Boundary::Linear, 5, Some(0));

        let report = classifier
            .cross_validate(&column(&xs), &DVector::from_vec(ys), &features)
            .unwrap();
        assert_eq!(report.misclassification_rate, 0.0);
        assert_eq!(report.confusion.total(), 62);
    }

    #[test]
    fn quadratic_boundary_separates_a_shell() {
        if let Err(_) = pretty_env_logger::try_init() {}

        // malignant iff |x| > 5
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for _ in 0..4 {
            for v in -10..=10_i32 {
                if v.abs() == 5 {
                    continue;
                }
                xs.push(v as f64);
                ys.push(if v.abs() > 5 { 1.0 } else { 0.0 });
            }
        }
        let x = column(&xs);
        let y = DVector::from_vec(ys);
        let features = FeatureSet::full(1).unwrap();
        let regressor = TikhonovRegularization {
            regularization_coeff: 1e-6,
        };

        let linear = ThresholdedClassifier::new(regressor.clone(), Boundary::Linear, 5, Some(1))
            .cross_validate(&x, &y, &features)
            .unwrap();
        let quadratic = ThresholdedClassifier::new(regressor, Boundary::Quadratic, 5, Some(1))
            .cross_validate(&x, &y, &features)
            .unwrap();
        info!("linear: {}, quadratic: {}", linear.misclassification_rate, quadratic.misclassification_rate);

        assert!(quadratic.misclassification_rate < 0.15);
        assert!(quadratic.misclassification_rate < linear.misclassification_rate);
    }

    #[test]
    fn internal_split_depends_on_subset() {
        let classifier = ThresholdedClassifier::new(OrdinaryLeastSquares, Boundary::Linear, 10, Some(7));
        let a = FeatureSet::from_indices(&[0], 9).unwrap();
        let b = FeatureSet::from_indices(&[1], 9).unwrap();

        assert_ne!(classifier.internal_seed(&a), classifier.internal_seed(&b));
        assert_eq!(classifier.internal_seed(&a), classifier.internal_seed(&a));
        assert_eq!(classifier.name(), "linear");

        let unseeded = ThresholdedClassifier::new(OrdinaryLeastSquares, Boundary::Quadratic, 10, None);
        assert_eq!(unseeded.internal_seed(&a), None);
    }

    #[test]
    fn too_few_rows_for_internal_folds() {
        let classifier = ThresholdedClassifier::new(OrdinaryLeastSquares, Boundary::Linear, 10, Some(0));
        let result = classifier.cross_validate(
            &column(&[1.0, 2.0, 3.0]),
            &DVector::from_vec(vec![0.0, 1.0, 1.0]),
            &FeatureSet::full(1).unwrap(),
        );
        assert!(matches!(result, Err(FitError::InternalSplit(_))));
    }

    #[test]
    fn resubstitution_fit() {
        let xs: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let ys: Vec<f64> = (0..20).map(|i| if i >= 10 { 1.0 } else { 0.0 }).collect();
        let classifier = ThresholdedClassifier::new(OrdinaryLeastSquares, Boundary::Linear, 5, Some(0));

        let (model, confusion) = classifier.fit_all(&column(&xs), &DVector::from_vec(ys)).unwrap();
        assert_eq!(model.coefficients().len(), 2);
        assert_eq!(confusion.total(), 20);
        assert_eq!(confusion.misclassification_rate(), 0.0);
    }
}
