//! This crate provides the data model shared by the cross-validation
//! and subset search crates, together with the traits through which
//! model fitting is plugged in.

#![deny(unused_imports, unused_crate_dependencies)]
#![warn(missing_docs)]

#[macro_use]
extern crate log;

mod confusion;
mod errors;
mod feature_set;
mod fitter;
mod observations;

pub use confusion::ConfusionMatrix;
pub use errors::{DataError, FitError};
pub use feature_set::{FeatureSet, MAX_UNIVERSE};
pub use fitter::{
    ClassifierReport, InternalCvClassifier, LinearProbabilityFitter, ModelFitter, PredictiveModel,
};
pub use observations::{Diagnosis, Observations};
