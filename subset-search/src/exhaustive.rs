use std::{sync::Arc, time::Instant};

use common::FeatureSet;

use crate::{
    pool::par_map,
    scan::{settle, BestSoFar, CandidateResult, SkippedCandidate},
    SearchError, SearchParams, SubsetEnvironment,
};

/// Largest universe whose power set is enumerated
pub const MAX_EXHAUSTIVE_UNIVERSE: usize = 20;

/// Everything an exhaustive search has seen
#[derive(Debug, Clone)]
pub struct ExhaustiveOutcome {
    /// Every evaluated candidate, in enumeration order
    pub evaluated: Vec<CandidateResult>,
    /// Candidates that failed, only filled under `FailurePolicy::SkipAndContinue`
    pub skipped: Vec<SkippedCandidate>,
    /// Lowest error strictly below the sentinel, earliest candidate on ties
    pub best: Option<CandidateResult>,
}

impl ExhaustiveOutcome {
    /// Errors in enumeration order
    pub fn errors(&self) -> Vec<f64> {
        self.evaluated.iter().map(|c| c.error).collect()
    }
}

/// Scores every non-empty subset of the predictors.
/// Subsets are enumerated by size, and within a size in combination order.
#[derive(Debug, Clone, Default)]
pub struct ExhaustiveSearch {
    params: SearchParams,
}

impl ExhaustiveSearch {
    /// Create a new exhaustive search
    pub fn new(params: SearchParams) -> Self {
        Self { params }
    }

    #[inline(always)]
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Evaluate all `2^p - 1` candidates of the environment
    pub fn run<E>(&self, env: Arc<E>) -> Result<ExhaustiveOutcome, SearchError>
    where
        E: SubsetEnvironment + Send + Sync + 'static,
    {
        let universe = env.universe();
        if universe > MAX_EXHAUSTIVE_UNIVERSE {
            return Err(SearchError::UniverseTooLarge {
                universe,
                max: MAX_EXHAUSTIVE_UNIVERSE,
            });
        }
        let candidates = FeatureSet::non_empty_subsets(universe)?;
        info!(
            "evaluating {} subsets of {} predictors on {} threads",
            candidates.len(),
            universe,
            self.params.num_threads
        );

        let t0 = Instant::now();
        let e = env.clone();
        let results = par_map(
            candidates.clone(),
            self.params.num_threads,
            Arc::new(move |c: FeatureSet| e.evaluate(&c)),
        );
        let (evaluated, skipped) = settle(&candidates, results, self.params.failure_policy)?;

        let mut best = BestSoFar::new(self.params.sentinel);
        for candidate in evaluated.iter() {
            if best.offer(*candidate) {
                debug!("new best {} with error {:.5}", candidate.features, candidate.error);
            }
        }
        info!(
            "exhaustive search done in {}ms, {} evaluated, {} skipped",
            t0.elapsed().as_millis(),
            evaluated.len(),
            skipped.len()
        );

        Ok(ExhaustiveOutcome {
            evaluated,
            skipped,
            best: best.into_best(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use common::{FitError, LinearProbabilityFitter, Observations};
    use cross_validation::{evaluate, Boundary, CvError, FoldPartitioner, ThresholdedClassifier};
    use lin_reg::OrdinaryLeastSquares;
    use nanorand::{Rng, WyRand};

    use super::*;
    use crate::{ClassifierEnvironment, CvEnvironment, FailurePolicy};

    /// Errors given by a function of the mask, counting every call
    struct InjectedErrors<S> {
        universe: usize,
        score: S,
        visits: AtomicUsize,
    }

    impl<S> InjectedErrors<S>
    where
        S: Fn(u32) -> Result<f64, SearchError>,
    {
        fn new(universe: usize, score: S) -> Self {
            Self {
                universe,
                score,
                visits: AtomicUsize::new(0),
            }
        }
    }

    impl<S> SubsetEnvironment for InjectedErrors<S>
    where
        S: Fn(u32) -> Result<f64, SearchError>,
    {
        fn universe(&self) -> usize {
            self.universe
        }

        fn evaluate(&self, features: &FeatureSet) -> Result<f64, SearchError> {
            self.visits.fetch_add(1, Ordering::SeqCst);
            (self.score)(features.mask())
        }
    }

    fn params(failure_policy: FailurePolicy) -> SearchParams {
        SearchParams {
            num_threads: 3,
            failure_policy,
            sentinel: 1.0,
        }
    }

    /// `n` rows of three noisy ordinal predictors, only the first two matter
    fn cohort(n: usize, seed: u64) -> Observations {
        let mut rng = WyRand::new_seed(seed);
        let mut values = Vec::with_capacity(n * 3);
        let mut labels = Vec::with_capacity(n);
        for _ in 0..n {
            let a = rng.generate_range(1_u32..=10) as f64;
            let b = rng.generate_range(1_u32..=10) as f64;
            let c = rng.generate_range(1_u32..=10) as f64;
            let noise = rng.generate::<f64>() * 4.0 - 2.0;
            values.extend_from_slice(&[a, b, c]);
            labels.push(if a + 0.5 * b + noise > 8.0 { 1.0 } else { 0.0 });
        }
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        Observations::from_labels(
            (0..n as u64).collect(),
            names,
            nalgebra::DMatrix::from_row_slice(n, 3, &values),
            nalgebra::DVector::from_vec(labels),
        )
        .unwrap()
    }

    #[test]
    fn visits_every_subset_and_finds_the_minimum() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let score = |mask: u32| Ok(((mask * 37) % 11) as f64 / 20.0 + 0.1);
        let env = Arc::new(InjectedErrors::new(3, score));

        let outcome = ExhaustiveSearch::new(params(FailurePolicy::FailFast))
            .run(env.clone())
            .unwrap();
        assert_eq!(env.visits.load(Ordering::SeqCst), 7);
        assert_eq!(outcome.evaluated.len(), 7);
        assert!(outcome.skipped.is_empty());

        // brute force outside the driver
        let mut brute = (0, f64::MAX);
        for mask in 1..8_u32 {
            let error = score(mask).unwrap();
            if error < brute.1 {
                brute = (mask, error);
            }
        }
        let best = outcome.best.unwrap();
        assert_eq!(best.features.mask(), brute.0);
        assert_eq!(best.error, brute.1);
    }

    #[test]
    fn ties_keep_the_first_enumerated_subset() {
        // {1} and {2} tie, as do {0, 1} and {2}
        let env = Arc::new(InjectedErrors::new(3, |mask: u32| {
            Ok(match mask {
                0b010 | 0b100 | 0b011 => 0.2,
                _ => 0.5,
            })
        }));

        let outcome = ExhaustiveSearch::new(params(FailurePolicy::FailFast)).run(env).unwrap();
        assert_eq!(outcome.best.unwrap().features.indices(), vec![1]);
        assert_eq!(outcome.errors().len(), 7);
    }

    #[test]
    fn nothing_beats_the_sentinel() {
        let env = Arc::new(InjectedErrors::new(2, |_| Ok(1.0)));
        let outcome = ExhaustiveSearch::new(params(FailurePolicy::FailFast)).run(env).unwrap();

        assert_eq!(outcome.evaluated.len(), 3);
        assert!(outcome.best.is_none());
    }

    #[test]
    fn failures_abort_or_are_reported() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let failing = |mask: u32| {
            if mask == 0b011 || mask == 0b101 {
                Err(SearchError::Classifier {
                    classifier: "test".to_string(),
                    features: FeatureSet::from_mask(mask, 3).unwrap(),
                    source: FitError::EmptyTrainingSet,
                })
            } else {
                Ok(mask as f64 / 10.0)
            }
        };

        let err = ExhaustiveSearch::new(params(FailurePolicy::FailFast))
            .run(Arc::new(InjectedErrors::new(3, failing)))
            .unwrap_err();
        match err {
            SearchError::Classifier { features, .. } => assert_eq!(features.mask(), 0b011),
            e => panic!("unexpected error {}", e),
        }

        let outcome = ExhaustiveSearch::new(params(FailurePolicy::SkipAndContinue))
            .run(Arc::new(InjectedErrors::new(3, failing)))
            .unwrap();
        assert_eq!(outcome.evaluated.len(), 5);
        let skipped: Vec<u32> = outcome.skipped.iter().map(|s| s.features.mask()).collect();
        assert_eq!(skipped, vec![0b011, 0b101]);
        assert_eq!(outcome.best.unwrap().features.mask(), 0b001);
    }

    #[test]
    fn universe_limit() {
        let env = Arc::new(InjectedErrors::new(21, |_| Ok(0.0)));
        assert_eq!(
            ExhaustiveSearch::default().run(env).unwrap_err(),
            SearchError::UniverseTooLarge {
                universe: 21,
                max: MAX_EXHAUSTIVE_UNIVERSE
            }
        );
    }

    #[test]
    fn cross_validated_least_squares() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let table = Arc::new(cohort(200, 0));
        let folds = Arc::new(FoldPartitioner::new(5, Some(0)).partition(200).unwrap());
        let fitter = LinearProbabilityFitter::new(OrdinaryLeastSquares);
        let env = Arc::new(CvEnvironment::new(table.clone(), folds.clone(), fitter.clone()).unwrap());

        let outcome = ExhaustiveSearch::new(params(FailurePolicy::FailFast)).run(env).unwrap();

        let mut brute: Option<(FeatureSet, f64)> = None;
        for features in FeatureSet::non_empty_subsets(3).unwrap() {
            let error = evaluate(&table, &features, &folds, &fitter).unwrap().aggregate_error();
            if brute.map_or(true, |(_, b)| error < b) {
                brute = Some((features, error));
            }
        }
        let best = outcome.best.unwrap();
        assert_eq!(Some((best.features, best.error)), brute);
        assert!(best.features.contains(0));
    }

    #[test]
    fn classifier_environment() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let table = Arc::new(cohort(150, 1));
        let classifier = ThresholdedClassifier::new(OrdinaryLeastSquares, Boundary::Linear, 5, Some(2));
        let env = Arc::new(ClassifierEnvironment::new(table, classifier));

        let outcome = ExhaustiveSearch::new(params(FailurePolicy::FailFast)).run(env.clone()).unwrap();
        assert!(outcome.errors().iter().all(|e| (0.0..=1.0).contains(e)));

        let best = outcome.best.unwrap();
        let report = env.report(&best.features).unwrap();
        assert_eq!(report.misclassification_rate, best.error);
        assert_eq!(report.confusion.total(), 150);

        let foreign = FeatureSet::full(4).unwrap();
        assert!(matches!(
            env.report(&foreign),
            Err(SearchError::Evaluation {
                source: CvError::FeatureUniverseMismatch { .. },
                ..
            })
        ));
    }
}
