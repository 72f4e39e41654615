use std::{sync::Arc, time::Instant};

use common::{FeatureSet, LinearProbabilityFitter, Observations};
use cross_validation::{evaluate, CvError, CvReport, FoldAssignment};
use lin_reg::TikhonovRegularization;

use crate::{pool::par_map, SearchError, SearchParams};

/// Cross-validated error at one penalty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenaltyResult {
    pub lambda: f64,
    pub cv_error: f64,
    pub standard_error: f64,
}

/// The error-by-penalty curve and the two usual picks from it
#[derive(Debug, Clone)]
pub struct PenaltyOutcome {
    /// One entry per grid value, in grid order
    pub curve: Vec<PenaltyResult>,
    /// Entry with the smallest error, earliest on ties
    pub lambda_min: PenaltyResult,
    /// Largest penalty whose error is within one standard error of `lambda_min`
    pub lambda_1se: PenaltyResult,
}

/// `len` values spaced evenly on a log scale, from `max` down to `max * min_ratio`
pub fn log_spaced_grid(max: f64, min_ratio: f64, len: usize) -> Vec<f64> {
    match len {
        0 => vec![],
        1 => vec![max],
        _ => {
            let hi = max.ln();
            let lo = (max * min_ratio).ln();
            let step = (hi - lo) / (len - 1) as f64;
            (0..len).map(|i| (hi - step * i as f64).exp()).collect()
        }
    }
}

/// Scores one feature subset with a ridge penalized linear probability
/// model at every penalty of a grid, all on the same fold assignment
#[derive(Debug, Clone)]
pub struct PenaltyGridSearch {
    params: SearchParams,
    grid: Vec<f64>,
}

impl PenaltyGridSearch {
    /// Create a new search over an explicit grid
    pub fn new(params: SearchParams, grid: Vec<f64>) -> Self {
        Self { params, grid }
    }

    /// 100 log spaced penalties from `10 n` down to `10 n * 1e-4`
    pub fn default_grid(num_rows: usize) -> Vec<f64> {
        log_spaced_grid(10.0 * num_rows as f64, 1e-4, 100)
    }

    #[inline(always)]
    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    /// Cross-validate `features` at every penalty of the grid
    pub fn run(
        &self,
        table: Arc<Observations>,
        folds: Arc<FoldAssignment>,
        features: FeatureSet,
    ) -> Result<PenaltyOutcome, SearchError> {
        if self.grid.is_empty() {
            return Err(SearchError::EmptyGrid);
        }
        if let Some(bad) = self.grid.iter().find(|l| !l.is_finite() || **l < 0.0) {
            return Err(SearchError::InvalidPenalty(*bad));
        }
        if folds.len() != table.num_rows() {
            return Err(CvError::FoldLengthMismatch {
                expected: table.num_rows(),
                got: folds.len(),
            }
            .into());
        }

        let t0 = Instant::now();
        let job = Arc::new(move |lambda: f64| -> Result<CvReport, CvError> {
            let fitter = LinearProbabilityFitter::new(TikhonovRegularization {
                regularization_coeff: lambda,
            });
            evaluate(&table, &features, &folds, &fitter)
        });
        let reports = par_map(self.grid.clone(), self.params.num_threads, job);

        let mut curve = Vec::with_capacity(self.grid.len());
        for (i, (lambda, report)) in self.grid.iter().zip(reports).enumerate() {
            let report = report
                .ok_or(SearchError::WorkerLost(i))?
                .map_err(|source| SearchError::Evaluation { features, source })?;
            curve.push(PenaltyResult {
                lambda: *lambda,
                cv_error: report.aggregate_error(),
                standard_error: report.standard_error(),
            });
        }

        let mut lambda_min = curve[0];
        for r in curve.iter().skip(1) {
            if r.cv_error < lambda_min.cv_error {
                lambda_min = *r;
            }
        }
        let limit = lambda_min.cv_error + lambda_min.standard_error;
        let lambda_1se = curve
            .iter()
            .filter(|r| r.cv_error <= limit)
            .fold(lambda_min, |acc, r| if r.lambda > acc.lambda { *r } else { acc });

        info!(
            "penalty grid of {} values done in {}ms: lambda_min {:.5} (cv {:.5}), lambda_1se {:.5} (cv {:.5})",
            curve.len(),
            t0.elapsed().as_millis(),
            lambda_min.lambda,
            lambda_min.cv_error,
            lambda_1se.lambda,
            lambda_1se.cv_error,
        );

        Ok(PenaltyOutcome {
            curve,
            lambda_min,
            lambda_1se,
        })
    }
}

#[cfg(test)]
mod tests {
    use cross_validation::FoldPartitioner;
    use nalgebra::{DMatrix, DVector};
    use round::round;

    use super::*;

    fn setup() -> (Arc<Observations>, Arc<FoldAssignment>) {
        let n = 90;
        let predictors = DMatrix::from_fn(n, 4, |i, j| ((i * (2 * j + 3) + j) % (5 + 2 * j)) as f64);
        let labels = DVector::from_fn(n, |i, _| if (i * 3) % 5 + (i % 3) > 3 { 1.0 } else { 0.0 });
        let table = Observations::from_labels(
            (0..n as u64).collect(),
            (0..4).map(|j| format!("x{}", j)).collect(),
            predictors,
            labels,
        )
        .unwrap()
        .standardized();
        let folds = FoldPartitioner::new(5, Some(3)).partition(n).unwrap();

        (Arc::new(table), Arc::new(folds))
    }

    #[test]
    fn grid_is_descending_and_log_spaced() {
        let grid = log_spaced_grid(100.0, 1e-4, 5);
        let expected = [100.0, 10.0, 1.0, 0.1, 0.01];
        assert_eq!(grid.len(), 5);
        for (g, e) in grid.iter().zip(expected.iter()) {
            assert_eq!(round(*g, 9), *e);
        }
        assert_eq!(PenaltyGridSearch::default_grid(50).len(), 100);
        assert_eq!(round(PenaltyGridSearch::default_grid(50)[0], 9), 500.0);
        assert!(log_spaced_grid(1.0, 0.1, 0).is_empty());
    }

    #[test]
    fn one_standard_error_rule() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let (table, folds) = setup();
        let grid = log_spaced_grid(900.0, 1e-4, 20);
        let search = PenaltyGridSearch::new(SearchParams::default(), grid.clone());
        let outcome = search
            .run(table.clone(), folds.clone(), FeatureSet::full(4).unwrap())
            .unwrap();

        assert_eq!(outcome.curve.len(), 20);
        for (r, lambda) in outcome.curve.iter().zip(grid.iter()) {
            assert_eq!(r.lambda, *lambda);
        }
        let min = outcome.curve.iter().map(|r| r.cv_error).fold(f64::MAX, f64::min);
        assert_eq!(outcome.lambda_min.cv_error, min);
        assert!(outcome.lambda_1se.lambda >= outcome.lambda_min.lambda);
        assert!(
            outcome.lambda_1se.cv_error
                <= outcome.lambda_min.cv_error + outcome.lambda_min.standard_error
        );

        // same numbers as a single direct evaluation
        let fitter = LinearProbabilityFitter::new(TikhonovRegularization {
            regularization_coeff: grid[7],
        });
        let direct = evaluate(&table, &FeatureSet::full(4).unwrap(), &folds, &fitter).unwrap();
        assert_eq!(outcome.curve[7].cv_error, direct.aggregate_error());
    }

    #[test]
    fn rejects_bad_grids() {
        let (table, folds) = setup();
        let features = FeatureSet::full(4).unwrap();

        let empty = PenaltyGridSearch::new(SearchParams::default(), vec![]);
        assert_eq!(
            empty.run(table.clone(), folds.clone(), features).unwrap_err(),
            SearchError::EmptyGrid
        );

        let negative = PenaltyGridSearch::new(SearchParams::default(), vec![1.0, -0.5]);
        assert_eq!(
            negative.run(table, folds, features).unwrap_err(),
            SearchError::InvalidPenalty(-0.5)
        );
    }
}
