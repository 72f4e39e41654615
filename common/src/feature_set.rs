use std::fmt;

use crate::DataError;

/// Largest predictor universe a `FeatureSet` mask can address
pub const MAX_UNIVERSE: usize = 32;

/// A non-empty subset of the predictor columns, stored as a bit mask.
/// Bit `i` set means predictor column `i` is part of the subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureSet {
    mask: u32,
    universe: usize,
}

impl FeatureSet {
    /// Create a feature set from its bit mask
    pub fn from_mask(mask: u32, universe: usize) -> Result<Self, DataError> {
        check_universe(universe)?;
        if universe < MAX_UNIVERSE && mask >> universe != 0 {
            return Err(DataError::FeatureOutOfRange {
                index: (u32::BITS - 1 - mask.leading_zeros()) as usize,
                universe,
            });
        }
        if mask == 0 {
            return Err(DataError::EmptyFeatureSet);
        }

        Ok(Self { mask, universe })
    }

    /// Create a feature set from column indices; duplicates are ignored
    pub fn from_indices(indices: &[usize], universe: usize) -> Result<Self, DataError> {
        check_universe(universe)?;
        let mut mask = 0_u32;
        for &index in indices {
            if index >= universe {
                return Err(DataError::FeatureOutOfRange { index, universe });
            }
            mask |= 1 << index;
        }

        Self::from_mask(mask, universe)
    }

    /// Every predictor of the universe
    pub fn full(universe: usize) -> Result<Self, DataError> {
        check_universe(universe)?;
        let mask = if universe == MAX_UNIVERSE {
            u32::MAX
        } else {
            (1_u32 << universe) - 1
        };

        Self::from_mask(mask, universe)
    }

    /// All `2^p - 1` non-empty subsets of a universe of `p` predictors.
    ///
    /// The masks are counted from `1` to `2^p - 1` and then ordered by subset
    /// size, and within one size by the lexicographic order of their column
    /// indices, which is the order combinations are usually listed in.
    pub fn non_empty_subsets(universe: usize) -> Result<Vec<FeatureSet>, DataError> {
        check_universe(universe)?;
        let mut subsets: Vec<FeatureSet> = (1_u64..(1_u64 << universe))
            .map(|mask| FeatureSet {
                mask: mask as u32,
                universe,
            })
            .collect();
        subsets.sort_by_cached_key(|s| (s.len(), s.indices()));

        Ok(subsets)
    }

    /// All subsets holding exactly `size` predictors, in combination order.
    /// Walks the `C(p, size)` index combinations directly.
    pub fn of_size(universe: usize, size: usize) -> Result<Vec<FeatureSet>, DataError> {
        check_universe(universe)?;
        if size == 0 || size > universe {
            return Ok(vec![]);
        }

        let mut subsets = Vec::new();
        let mut combination: Vec<usize> = (0..size).collect();
        loop {
            let mask = combination.iter().fold(0_u32, |m, i| m | 1 << i);
            subsets.push(FeatureSet { mask, universe });

            // rightmost index that can still move up
            let Some(i) = (0..size).rev().find(|i| combination[*i] < universe - size + i) else {
                break;
            };
            combination[i] += 1;
            for j in i + 1..size {
                combination[j] = combination[j - 1] + 1;
            }
        }

        Ok(subsets)
    }

    /// The raw bit mask
    #[inline(always)]
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Number of predictors the mask is drawn from
    #[inline(always)]
    pub fn universe(&self) -> usize {
        self.universe
    }

    /// Number of selected predictors
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.mask.count_ones() as usize
    }

    /// Always false for a constructed feature set
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }

    /// Whether column `index` is selected
    #[inline(always)]
    pub fn contains(&self, index: usize) -> bool {
        index < self.universe && self.mask & (1 << index) != 0
    }

    /// Selected column indices in ascending order
    pub fn indices(&self) -> Vec<usize> {
        (0..self.universe).filter(|i| self.contains(*i)).collect()
    }

    /// Human readable list of the selected predictor names
    pub fn describe(&self, names: &[String]) -> String {
        let names: Vec<&str> = self
            .indices()
            .into_iter()
            .map(|i| names.get(i).map(String::as_str).unwrap_or("?"))
            .collect();

        format!("{{{}}}", names.join(", "))
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.indices())
    }
}

fn check_universe(universe: usize) -> Result<(), DataError> {
    if universe == 0 || universe > MAX_UNIVERSE {
        return Err(DataError::TooManyPredictors {
            universe,
            max: MAX_UNIVERSE,
        });
    }
    Ok(())
}
