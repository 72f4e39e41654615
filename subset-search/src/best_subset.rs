use common::{FeatureSet, Observations};
use lin_reg::{LinReg, LinearModel};
use nalgebra::DVector;

use crate::{SearchError, MAX_EXHAUSTIVE_UNIVERSE};

/// The chosen subset of one size on a best subset selection path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedSubset {
    pub features: FeatureSet,
    /// In-sample residual sum of squares
    pub rss: f64,
    /// Akaike information criterion
    pub aic: f64,
    /// Bayesian information criterion
    pub bic: f64,
}

/// Produces one candidate subset per size `1..=p`
pub trait SubsetSelector {
    /// The selection path, entry `k - 1` holding the subset of size `k`
    fn select(&self, table: &Observations) -> Result<Vec<SelectedSubset>, SearchError>;
}

/// Best subset selection by residual sum of squares.
///
/// Every subset of every size is fitted on the full table; per size the
/// subset with the smallest RSS is kept (earlier combination on ties) and
/// scored with the Gaussian criteria
/// `AIC = n ln(RSS / n) + 2 (k + 1)` and `BIC = n ln(RSS / n) + ln(n) (k + 1)`.
#[derive(Debug, Clone)]
pub struct RssBestSubset<R> {
    regressor: R,
}

impl<R: LinReg> RssBestSubset<R> {
    pub fn new(regressor: R) -> Self {
        Self { regressor }
    }

    fn rss(&self, table: &Observations, features: &FeatureSet) -> Result<f64, SearchError> {
        let x = table.restrict_columns(features);
        let model = LinearModel::fit(&self.regressor, &x, table.labels()).map_err(|e| {
            SearchError::Selection {
                features: *features,
                source: e.into(),
            }
        })?;
        let residuals: DVector<f64> = table.labels() - model.predict(&x);

        Ok(residuals.norm_squared())
    }
}

impl<R: LinReg> SubsetSelector for RssBestSubset<R> {
    fn select(&self, table: &Observations) -> Result<Vec<SelectedSubset>, SearchError> {
        let p = table.num_predictors();
        if p > MAX_EXHAUSTIVE_UNIVERSE {
            return Err(SearchError::UniverseTooLarge {
                universe: p,
                max: MAX_EXHAUSTIVE_UNIVERSE,
            });
        }
        let n = table.num_rows() as f64;

        // sorted by size, so one pass sees each size as a contiguous run
        let mut best: Vec<Option<(FeatureSet, f64)>> = vec![None; p];
        for features in FeatureSet::non_empty_subsets(p)? {
            let rss = self.rss(table, &features)?;
            let slot = &mut best[features.len() - 1];
            if slot.map_or(true, |(_, b)| rss < b) {
                *slot = Some((features, rss));
            }
        }

        let path: Vec<SelectedSubset> = best
            .into_iter()
            .flatten()
            .map(|(features, rss)| {
                let k = (features.len() + 1) as f64;
                let fit_term = n * (rss / n).ln();
                SelectedSubset {
                    features,
                    rss,
                    aic: fit_term + 2.0 * k,
                    bic: fit_term + n.ln() * k,
                }
            })
            .collect();
        for s in path.iter() {
            debug!("size {}: {} rss {:.4} aic {:.3} bic {:.3}", s.features.len(), s.features, s.rss, s.aic, s.bic);
        }

        Ok(path)
    }
}
