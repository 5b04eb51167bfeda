//! Multi-dimensional histograms.
//!
//! Each observation is mapped by every axis to a bin, the bins are folded
//! into one flat storage offset, and the cell there is updated. Cells are
//! bare counts in an [`AdaptiveStorage`] that widens its integer width on
//! demand, or any [`Accumulator`] held in a [`VecStorage`] or
//! [`ArrayStorage`].

pub use accumulators::{Accumulator, Mean, Sum, WeightedMean, WeightedSum};
pub use axis::{AnyAxis, Axes, Axis, Category, Integer, Options, Regular, Value};
pub use error::{HistError, Result};
pub use fill::{sample, weight, Arg, Coords, Fill, Sample, Weight};
pub use histo::Histogram;
pub use linearize::{index_of_bins, index_of_coords, OptionalIndex};
pub use storage::{AdaptiveStorage, ArrayStorage, Count, Repr, Storage, VecStorage};

/// Build a [`Coords`] list from values convertible to [`Value`]. Up to four
/// components stay off the heap.
#[macro_export]
macro_rules! coords {
    ($($e:expr),* $(,)?) => {
        {
            let mut c = $crate::Coords::new();
            $(
                c.push($crate::Value::from($e));
            )*
            c
        }
    };
}

pub mod accumulators;
pub mod axis;
mod error;
mod fill;
mod histo;
mod linearize;
pub mod storage;
