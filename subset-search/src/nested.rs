use std::{sync::Arc, time::Instant};

use common::{DataError, FeatureSet};

use crate::{
    pool::par_map, scan::settle, FailurePolicy, SearchError, SearchParams, SelectedSubset,
    SubsetEnvironment,
};

/// Cross-validated error and information criteria of one path entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeResult {
    pub size: usize,
    pub features: FeatureSet,
    pub cv_error: f64,
    pub aic: f64,
    pub bic: f64,
}

/// The error-by-size curve and the sizes each criterion prefers
#[derive(Debug, Clone)]
pub struct NestedOutcome {
    /// One entry per size `1..=p`
    pub curve: Vec<SizeResult>,
    /// Entry with the smallest AIC
    pub best_by_aic: SizeResult,
    /// Entry with the smallest BIC
    pub best_by_bic: SizeResult,
    /// Entry with the smallest cross-validated error
    pub best_by_cv: SizeResult,
}

impl NestedOutcome {
    /// Cross-validated errors indexed by size - 1
    pub fn errors(&self) -> Vec<f64> {
        self.curve.iter().map(|s| s.cv_error).collect()
    }
}

/// Scores a best subset selection path, one subset per size.
///
/// The path is ranked by the information criteria it carries while the
/// environment scores it by cross-validation; the two are reported side by
/// side. A failing size always aborts, since the curve has to be complete.
#[derive(Debug, Clone, Default)]
pub struct NestedSearch {
    params: SearchParams,
}

impl NestedSearch {
    /// Create a new nested search
    pub fn new(params: SearchParams) -> Self {
        Self { params }
    }

    /// Cross-validate every entry of `path`
    pub fn run<E>(&self, env: Arc<E>, path: &[SelectedSubset]) -> Result<NestedOutcome, SearchError>
    where
        E: SubsetEnvironment + Send + Sync + 'static,
    {
        let p = env.universe();
        check_path(path, p)?;

        let t0 = Instant::now();
        let candidates: Vec<FeatureSet> = path.iter().map(|s| s.features).collect();
        let e = env.clone();
        let results = par_map(
            candidates.clone(),
            self.params.num_threads,
            Arc::new(move |c: FeatureSet| e.evaluate(&c)),
        );
        let (evaluated, _) = settle(&candidates, results, FailurePolicy::FailFast)?;

        let curve: Vec<SizeResult> = path
            .iter()
            .zip(evaluated)
            .map(|(selected, scored)| SizeResult {
                size: selected.features.len(),
                features: selected.features,
                cv_error: scored.error,
                aic: selected.aic,
                bic: selected.bic,
            })
            .collect();
        for s in curve.iter() {
            debug!("size {} {}: cv error {:.5}", s.size, s.features, s.cv_error);
        }

        let best_by_aic = argmin(&curve, |s| s.aic);
        let best_by_bic = argmin(&curve, |s| s.bic);
        let best_by_cv = argmin(&curve, |s| s.cv_error);
        info!(
            "nested search done in {}ms: aic picks size {}, bic picks size {}, cv picks size {}",
            t0.elapsed().as_millis(),
            best_by_aic.size,
            best_by_bic.size,
            best_by_cv.size
        );

        Ok(NestedOutcome {
            curve,
            best_by_aic,
            best_by_bic,
            best_by_cv,
        })
    }
}

fn check_path(path: &[SelectedSubset], p: usize) -> Result<(), SearchError> {
    if p == 0 {
        return Err(SearchError::Data(DataError::EmptyFeatureSet));
    }
    if path.len() != p {
        return Err(SearchError::MalformedPath {
            position: path.len().min(p),
            expected: p,
            found: path.len(),
        });
    }
    for (position, selected) in path.iter().enumerate() {
        if selected.features.len() != position + 1 || selected.features.universe() != p {
            return Err(SearchError::MalformedPath {
                position,
                expected: p,
                found: selected.features.len(),
            });
        }
    }
    Ok(())
}

/// First entry with the smallest key, so ties go to the smaller size
fn argmin<K>(curve: &[SizeResult], key: K) -> SizeResult
where
    K: Fn(&SizeResult) -> f64,
{
    let mut best = curve[0];
    for s in curve.iter().skip(1) {
        if key(s) < key(&best) {
            best = *s;
        }
    }
    best
}
