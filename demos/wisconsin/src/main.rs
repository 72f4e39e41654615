#[macro_use]
extern crate log;

mod cohort;

use std::{env, sync::Arc, time::Instant};

use common::{
    ConfusionMatrix, FeatureSet, InternalCvClassifier, LinearProbabilityFitter, Observations,
};
use cross_validation::{refit, Boundary, FoldPartitioner, ThresholdedClassifier};
use dialoguer::{theme::ColorfulTheme, Select};
use lin_reg::{OrdinaryLeastSquares, TikhonovRegularization};
use subset_search::{
    ClassifierEnvironment, CvEnvironment, ExhaustiveSearch, NestedSearch,
    PenaltyGridSearch, RssBestSubset, SearchError, SearchParams, SubsetSelector,
};

use crate::cohort::LoadError;

const SEED: Option<u64> = Some(0);
const NUM_FOLDS: usize = 10;
/// Complete records in the UCI file
const COHORT_SIZE: usize = 683;

pub(crate) fn main() {
    pretty_env_logger::init();

    let table = match load_table() {
        Ok(t) => Arc::new(t.standardized()),
        Err(e) => {
            error!("could not load the cohort: {}", e);
            return;
        }
    };
    let (benign, malignant) = table.class_counts();
    info!(
        "cohort of {} rows, {} benign, {} malignant, {} predictors",
        table.num_rows(),
        benign,
        malignant,
        table.num_predictors()
    );

    let analyses = vec![
        "Best subset (AIC / BIC)",
        "Exhaustive, linear boundary",
        "Exhaustive, quadratic boundary",
        "Ridge penalty grid",
    ];
    let e = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select analysis")
        .items(&analyses)
        .default(0)
        .interact()
        .unwrap();

    let t0 = Instant::now();
    let res = match e {
        0 => best_subset(&table),
        1 => exhaustive(&table, Boundary::Linear),
        2 => exhaustive(&table, Boundary::Quadratic),
        3 => penalty_grid(&table),
        _ => unreachable!(),
    };
    match res {
        Ok(()) => info!("{} took {}ms", analyses[e], t0.elapsed().as_millis()),
        Err(e) => error!("{}", e),
    }
}

fn load_table() -> Result<Observations, LoadError> {
    match env::var("WISCONSIN_CSV") {
        Ok(path) => {
            info!("loading {}", path);
            cohort::load_file(&path)
        }
        Err(_) => {
            info!("WISCONSIN_CSV not set, synthesizing {} rows", COHORT_SIZE);
            Ok(cohort::synthesize(COHORT_SIZE, SEED)?)
        }
    }
}

/// Nested mode: one RSS-best subset per size, cross-validated side by side
/// with the information criteria that ranked them
fn best_subset(table: &Arc<Observations>) -> Result<(), SearchError> {
    let folds = Arc::new(FoldPartitioner::new(NUM_FOLDS, SEED).partition(table.num_rows())?);
    let path = RssBestSubset::new(OrdinaryLeastSquares).select(table)?;

    let fitter = LinearProbabilityFitter::new(OrdinaryLeastSquares);
    let env = Arc::new(CvEnvironment::new(table.clone(), folds, fitter.clone())?);
    let outcome = NestedSearch::default().run(env, &path)?;

    for s in outcome.curve.iter() {
        info!(
            "size {}: cv error {:.5}, aic {:.2}, bic {:.2}, {}",
            s.size,
            s.cv_error,
            s.aic,
            s.bic,
            s.features.describe(table.predictor_names())
        );
    }

    for (criterion, pick) in [("AIC", outcome.best_by_aic), ("BIC", outcome.best_by_bic)] {
        let model = refit(table, &pick.features, &fitter).map_err(|source| {
            SearchError::Selection {
                features: pick.features,
                source,
            }
        })?;
        let fitted = model.predict(&table.restrict_columns(&pick.features));
        let confusion = ConfusionMatrix::from_fitted(table.labels(), &fitted);
        info!(
            "{} picks size {} {}, cv error {:.5}\ncoefficients: {:?}\n{}",
            criterion,
            pick.size,
            pick.features.describe(table.predictor_names()),
            pick.cv_error,
            model.coefficients().as_slice(),
            confusion
        );
    }

    Ok(())
}

/// Exhaustive mode: every subset scored by a thresholded classifier's own
/// internal cross-validation
fn exhaustive(table: &Arc<Observations>, boundary: Boundary) -> Result<(), SearchError> {
    let classifier = ThresholdedClassifier::new(OrdinaryLeastSquares, boundary, NUM_FOLDS, SEED);
    let env = Arc::new(ClassifierEnvironment::new(table.clone(), classifier.clone()));
    let outcome = ExhaustiveSearch::new(SearchParams::default()).run(env)?;

    info!(
        "{} subsets evaluated, {} skipped",
        outcome.evaluated.len(),
        outcome.skipped.len()
    );
    for size in 1..=table.num_predictors() {
        let best_of_size = outcome
            .evaluated
            .iter()
            .filter(|c| c.features.len() == size)
            .fold(None, |acc: Option<(FeatureSet, f64)>, c| match acc {
                Some((_, e)) if e <= c.error => acc,
                _ => Some((c.features, c.error)),
            });
        if let Some((features, error)) = best_of_size {
            info!(
                "size {}: lowest misclassification {:.4} with {}",
                size,
                error,
                features.describe(table.predictor_names())
            );
        }
    }

    let best = match outcome.best {
        Some(best) => best,
        None => {
            warn!("no subset got below the sentinel error");
            return Ok(());
        }
    };
    let (model, confusion) = classifier
        .fit_all(&table.restrict_columns(&best.features), table.labels())
        .map_err(|source| SearchError::Classifier {
            classifier: classifier.name().to_string(),
            features: best.features,
            source,
        })?;
    info!(
        "best subset {} with misclassification {:.4}\n{} coefficients\nresubstitution:\n{}",
        best.features.describe(table.predictor_names()),
        best.error,
        model.coefficients().len(),
        confusion
    );

    Ok(())
}

/// Ridge penalty grid over the full predictor set
fn penalty_grid(table: &Arc<Observations>) -> Result<(), SearchError> {
    let folds = Arc::new(FoldPartitioner::new(NUM_FOLDS, SEED).partition(table.num_rows())?);
    let features = FeatureSet::full(table.num_predictors())?;
    let search = PenaltyGridSearch::new(
        SearchParams::default(),
        PenaltyGridSearch::default_grid(table.num_rows()),
    );
    let outcome = search.run(table.clone(), folds, features)?;

    for r in outcome.curve.iter().step_by(10) {
        info!(
            "lambda {:>12.4}: cv error {:.5} +- {:.5}",
            r.lambda, r.cv_error, r.standard_error
        );
    }

    let lambda = outcome.lambda_1se.lambda;
    let fitter = LinearProbabilityFitter::new(TikhonovRegularization {
        regularization_coeff: lambda,
    });
    let model = refit(table, &features, &fitter)
        .map_err(|source| SearchError::Selection { features, source })?;
    let fitted = model.predict(&table.restrict_columns(&features));
    let confusion = ConfusionMatrix::from_fitted(table.labels(), &fitted);
    info!(
        "lambda_min {:.4} (cv {:.5}), lambda_1se {:.4} (cv {:.5})\ncoefficients at lambda_1se: {:?}\n{}",
        outcome.lambda_min.lambda,
        outcome.lambda_min.cv_error,
        lambda,
        outcome.lambda_1se.cv_error,
        model.coefficients().as_slice(),
        confusion
    );

    Ok(())
}
