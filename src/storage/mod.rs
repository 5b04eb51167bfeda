//! Cell storage behind a histogram.

use crate::Result;

mod adaptive;
mod vec;

pub use adaptive::{AdaptiveStorage, Count, Repr};
pub use vec::{ArrayStorage, VecStorage};

/// One cell per flattened bin, mutated only through the fill operations.
///
/// Indices are flat storage offsets; passing one `>= len()` is a bug in
/// the caller and panics like slice indexing does.
pub trait Storage {
    /// What reading a cell yields.
    type Value;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resize to `n` zeroed cells, dropping the previous contents.
    fn reset(&mut self, n: usize) -> Result<()>;

    fn get(&self, index: usize) -> Self::Value;

    fn increment(&mut self, index: usize) -> Result<()>;

    fn add_weight(&mut self, index: usize, weight: f64) -> Result<()>;

    fn add_sample(&mut self, index: usize, sample: &[f64]) -> Result<()>;

    fn add_weighted_sample(&mut self, index: usize, weight: f64, sample: &[f64]) -> Result<()>;

    /// Cell-wise `+=`. Both storages must have the same length.
    fn merge(&mut self, other: &Self) -> Result<()>;

    /// Cell-wise `*=`.
    fn scale(&mut self, factor: f64);
}
