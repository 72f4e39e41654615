use std::collections::BTreeSet;

use nanorand::{Rng, WyRand};

use crate::CvError;

/// Maps every row of a table to a fold id in `1..=num_folds`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldAssignment {
    ids: Vec<usize>,
    num_folds: usize,
}

impl FoldAssignment {
    /// Wrap an externally produced fold vector without checking it.
    /// `validate` tells whether it is usable.
    pub fn from_ids(ids: Vec<usize>, num_folds: usize) -> Self {
        Self { ids, num_folds }
    }

    /// Check that every id in `1..=num_folds` is used and no other id occurs
    pub fn validate(&self) -> Result<(), CvError> {
        if self.num_folds < 2 {
            return Err(CvError::InvalidFoldCount {
                num_folds: self.num_folds,
                num_rows: self.ids.len(),
            });
        }

        let unique: BTreeSet<usize> = self.ids.iter().copied().collect();
        let missing: Vec<usize> = (1..=self.num_folds).filter(|k| !unique.contains(k)).collect();
        let out_of_range: Vec<usize> = unique
            .iter()
            .copied()
            .filter(|k| *k == 0 || *k > self.num_folds)
            .collect();

        if !missing.is_empty() || !out_of_range.is_empty() {
            return Err(CvError::InvalidFoldPartition {
                missing,
                out_of_range,
            });
        }
        Ok(())
    }

    /// Number of folds `K`
    #[inline(always)]
    pub fn num_folds(&self) -> usize {
        self.num_folds
    }

    /// Number of rows covered
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Fold id of every row
    #[inline(always)]
    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    /// Fold id of row `row`
    ///
    /// # Panics
    /// If `row` is not below `len()`
    #[inline(always)]
    pub fn fold_of(&self, row: usize) -> usize {
        self.ids[row]
    }

    /// Rows per fold, entry `k - 1` belongs to fold `k`. Out of range ids are not counted.
    pub fn fold_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.num_folds];
        for id in self.ids.iter() {
            if (1..=self.num_folds).contains(id) {
                sizes[id - 1] += 1;
            }
        }
        sizes
    }

    /// Row indices held out in fold `fold`
    pub fn rows_in(&self, fold: usize) -> Vec<usize> {
        (0..self.ids.len()).filter(|i| self.ids[*i] == fold).collect()
    }

    /// Row indices used for training when `fold` is held out
    pub fn rows_outside(&self, fold: usize) -> Vec<usize> {
        (0..self.ids.len()).filter(|i| self.ids[*i] != fold).collect()
    }
}

/// Draws fold ids uniformly and independently per row.
/// The split is not stratified by class.
#[derive(Debug, Clone)]
pub struct FoldPartitioner {
    num_folds: usize,
    rng: WyRand,
}

impl FoldPartitioner {
    /// Create a new partitioner
    ///
    /// # Arguments:
    /// num_folds: K, the number of folds
    /// seed: Optional seed for Rng, runs with the same seed reproduce their folds
    pub fn new(num_folds: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => WyRand::new_seed(seed),
            None => WyRand::new(),
        };

        Self { num_folds, rng }
    }

    #[inline(always)]
    pub fn num_folds(&self) -> usize {
        self.num_folds
    }

    /// Assign `num_rows` rows to folds.
    /// Fails instead of returning a partition in which some fold is empty.
    pub fn partition(&mut self, num_rows: usize) -> Result<FoldAssignment, CvError> {
        if self.num_folds < 2 || num_rows < self.num_folds {
            return Err(CvError::InvalidFoldCount {
                num_folds: self.num_folds,
                num_rows,
            });
        }

        let ids: Vec<usize> =
            (0..num_rows).map(|_| self.rng.generate_range(1..=self.num_folds)).collect();
        let assignment = FoldAssignment::from_ids(ids, self.num_folds);

        match assignment.validate() {
            Ok(()) => {
                debug!("fold sizes: {:?}", assignment.fold_sizes());
                Ok(assignment)
            }
            Err(CvError::InvalidFoldPartition { missing, .. }) => {
                warn!("folds {:?} were never drawn for {} rows", missing, num_rows);
                Err(CvError::DegenerateFoldPartition { missing })
            }
            Err(e) => Err(e),
        }
    }
}
