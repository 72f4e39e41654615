use common::FeatureSet;

use crate::{FailurePolicy, SearchError};

/// One scored feature subset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateResult {
    pub features: FeatureSet,
    pub error: f64,
}

/// A candidate that could not be evaluated under `FailurePolicy::SkipAndContinue`
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCandidate {
    pub features: FeatureSet,
    pub reason: SearchError,
}

/// Linear scan accumulator keeping the first candidate with the lowest error
#[derive(Debug, Clone)]
pub struct BestSoFar {
    best_error: f64,
    best: Option<CandidateResult>,
}

impl BestSoFar {
    /// Start from a sentinel error that every winner has to beat
    pub fn new(sentinel: f64) -> Self {
        Self {
            best_error: sentinel,
            best: None,
        }
    }

    /// Keep `candidate` if it is strictly better than everything seen so far.
    /// Equal errors keep the earlier candidate.
    pub fn offer(&mut self, candidate: CandidateResult) -> bool {
        if candidate.error < self.best_error {
            self.best_error = candidate.error;
            self.best = Some(candidate);
            return true;
        }
        false
    }

    #[inline(always)]
    pub fn best_error(&self) -> f64 {
        self.best_error
    }

    #[inline(always)]
    pub fn best(&self) -> Option<&CandidateResult> {
        self.best.as_ref()
    }

    #[inline(always)]
    pub fn into_best(self) -> Option<CandidateResult> {
        self.best
    }
}

/// Pair results with their candidates in enumeration order and apply the failure policy
pub(crate) fn settle(
    candidates: &[FeatureSet],
    results: Vec<Option<Result<f64, SearchError>>>,
    policy: FailurePolicy,
) -> Result<(Vec<CandidateResult>, Vec<SkippedCandidate>), SearchError> {
    let mut evaluated = Vec::with_capacity(candidates.len());
    let mut skipped = Vec::new();

    for (i, (features, result)) in candidates.iter().zip(results).enumerate() {
        match result.unwrap_or(Err(SearchError::WorkerLost(i))) {
            Ok(error) => evaluated.push(CandidateResult {
                features: *features,
                error,
            }),
            Err(reason) => match policy {
                FailurePolicy::FailFast => return Err(reason),
                FailurePolicy::SkipAndContinue => {
                    warn!("skipping {}: {}", features, reason);
                    skipped.push(SkippedCandidate {
                        features: *features,
                        reason,
                    });
                }
            },
        }
    }

    Ok((evaluated, skipped))
}
