//! Per-bin running statistics used as storage cells when a bare count is
//! not enough.

use std::fmt::Debug;

use crate::{HistError, Result};

mod mean;
mod sum;

pub use mean::{Mean, WeightedMean};
pub use sum::{Sum, WeightedSum};

/// A storage cell. Each update either applies completely or fails before
/// touching the cell; roles a cell has no update for are rejected with
/// [`HistError::UnsupportedRole`].
pub trait Accumulator: Clone + Default + PartialEq + Debug {
    /// Name used in error messages.
    const NAME: &'static str;

    /// A fill with neither weight nor sample.
    fn increment(&mut self) -> Result<()> {
        Err(unsupported(Self::NAME, "plain"))
    }

    fn add_weight(&mut self, _weight: f64) -> Result<()> {
        Err(unsupported(Self::NAME, "weight"))
    }

    fn add_sample(&mut self, _sample: &[f64]) -> Result<()> {
        Err(unsupported(Self::NAME, "sample"))
    }

    fn add_weighted_sample(&mut self, _weight: f64, _sample: &[f64]) -> Result<()> {
        Err(unsupported(Self::NAME, "weighted sample"))
    }

    /// Combine with another cell as if every fill of `other` had gone here.
    fn merge(&mut self, other: &Self);

    /// Scale every fill's contribution by `factor`.
    fn scale(&mut self, factor: f64);
}

fn unsupported(cell: &'static str, role: &'static str) -> HistError {
    HistError::UnsupportedRole { cell, role }
}

// Single-valued samples only.
fn scalar(sample: &[f64]) -> Result<f64> {
    match sample {
        [x] => Ok(*x),
        _ => Err(HistError::SampleArity {
            expected: 1,
            got: sample.len(),
        }),
    }
}

impl Accumulator for f64 {
    const NAME: &'static str = "f64";

    fn increment(&mut self) -> Result<()> {
        *self += 1.0;
        Ok(())
    }

    fn add_weight(&mut self, weight: f64) -> Result<()> {
        *self += weight;
        Ok(())
    }

    fn merge(&mut self, other: &f64) {
        *self += *other;
    }

    fn scale(&mut self, factor: f64) {
        *self *= factor;
    }
}

#[test]
fn plain_cells_reject_samples() {
    let mut x = 0.0_f64;
    x.increment().unwrap();
    x.add_weight(2.5).unwrap();
    assert_eq!(x, 3.5);
    assert_eq!(
        x.add_sample(&[1.0]),
        Err(HistError::UnsupportedRole {
            cell: "f64",
            role: "sample"
        })
    );
    assert_eq!(x, 3.5);
}
