use std::{fmt, ops::AddAssign};

use nalgebra::DVector;

use crate::Diagnosis;

/// Counts of actual against predicted diagnoses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    // [actual][predicted], benign first
    counts: [[usize; 2]; 2],
}

#[inline(always)]
fn slot(d: Diagnosis) -> usize {
    match d {
        Diagnosis::Benign => 0,
        Diagnosis::Malignant => 1,
    }
}

impl ConfusionMatrix {
    /// Tally 0/1 labels against fitted values thresholded at one half
    ///
    /// # Panics
    /// If the two vectors differ in length
    pub fn from_fitted(labels: &DVector<f64>, fitted: &DVector<f64>) -> Self {
        assert_eq!(labels.len(), fitted.len());
        let mut out = Self::default();
        for (label, value) in labels.iter().zip(fitted.iter()) {
            // labels are exactly 0 or 1
            out.record(Diagnosis::from_fitted(*label), Diagnosis::from_fitted(*value));
        }
        out
    }

    /// Count one classified observation
    #[inline(always)]
    pub fn record(&mut self, actual: Diagnosis, predicted: Diagnosis) {
        self.counts[slot(actual)][slot(predicted)] += 1;
    }

    /// Number of observations with this actual and predicted class
    #[inline(always)]
    pub fn count(&self, actual: Diagnosis, predicted: Diagnosis) -> usize {
        self.counts[slot(actual)][slot(predicted)]
    }

    /// Total number of classified observations
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Observations on the diagonal
    pub fn correct(&self) -> usize {
        self.counts[0][0] + self.counts[1][1]
    }

    /// Fraction classified correctly, 0 for an empty matrix
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.correct() as f64 / total as f64,
        }
    }

    /// Fraction classified wrongly, 0 for an empty matrix
    pub fn misclassification_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => (total - self.correct()) as f64 / total as f64,
        }
    }
}

impl AddAssign for ConfusionMatrix {
    fn add_assign(&mut self, other: Self) {
        for i in 0..2 {
            for j in 0..2 {
                self.counts[i][j] += other.counts[i][j];
            }
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>8} {:>10}", "actual\\pred", "benign", "malignant")?;
        writeln!(f, "{:>12} {:>8} {:>10}", "benign", self.counts[0][0], self.counts[0][1])?;
        write!(f, "{:>12} {:>8} {:>10}", "malignant", self.counts[1][0], self.counts[1][1])
    }
}
