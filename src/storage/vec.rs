use std::ops::{Index, IndexMut};
use std::slice;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::Storage;
use crate::accumulators::Accumulator;
use crate::{HistError, Result};

fn merge_cells<T: Accumulator>(dst: &mut [T], src: &[T]) -> Result<()> {
    if dst.len() != src.len() {
        return Err(HistError::StorageSize {
            cells: src.len(),
            expected: dst.len(),
        });
    }
    for (a, b) in dst.iter_mut().zip(src) {
        a.merge(b);
    }
    Ok(())
}

/// A growable vector of accumulator cells.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VecStorage<T> {
    cells: Vec<T>,
}

impl<T: Accumulator> VecStorage<T> {
    pub fn new(n: usize) -> VecStorage<T> {
        VecStorage {
            cells: vec![T::default(); n],
        }
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.cells.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }
}

impl<T> Index<usize> for VecStorage<T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.cells[i]
    }
}

impl<T> IndexMut<usize> for VecStorage<T> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.cells[i]
    }
}

impl<T: Accumulator> Storage for VecStorage<T> {
    type Value = T;

    fn len(&self) -> usize {
        self.cells.len()
    }

    fn reset(&mut self, n: usize) -> Result<()> {
        log::debug!("resetting {} storage to {} cells", T::NAME, n);
        self.cells.clear();
        self.cells.resize(n, T::default());
        Ok(())
    }

    fn get(&self, index: usize) -> T {
        self.cells[index].clone()
    }

    fn increment(&mut self, index: usize) -> Result<()> {
        self.cells[index].increment()
    }

    fn add_weight(&mut self, index: usize, weight: f64) -> Result<()> {
        self.cells[index].add_weight(weight)
    }

    fn add_sample(&mut self, index: usize, sample: &[f64]) -> Result<()> {
        self.cells[index].add_sample(sample)
    }

    fn add_weighted_sample(&mut self, index: usize, weight: f64, sample: &[f64]) -> Result<()> {
        self.cells[index].add_weighted_sample(weight, sample)
    }

    fn merge(&mut self, other: &VecStorage<T>) -> Result<()> {
        merge_cells(&mut self.cells, &other.cells)
    }

    fn scale(&mut self, factor: f64) {
        self.cells.iter_mut().for_each(|c| c.scale(factor));
    }
}

/// Accumulator cells in a fixed-size array. Asking for more than `N`
/// cells fails with [`HistError::Capacity`].
#[derive(Debug, Clone)]
pub struct ArrayStorage<T, const N: usize> {
    cells: [T; N],
    len: usize,
}

impl<T: Accumulator, const N: usize> Default for ArrayStorage<T, N> {
    fn default() -> ArrayStorage<T, N> {
        ArrayStorage {
            cells: std::array::from_fn(|_| T::default()),
            len: 0,
        }
    }
}

impl<T: Accumulator, const N: usize> PartialEq for ArrayStorage<T, N> {
    fn eq(&self, other: &ArrayStorage<T, N>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, const N: usize> ArrayStorage<T, N> {
    pub const CAPACITY: usize = N;

    pub fn as_slice(&self) -> &[T] {
        &self.cells[..self.len]
    }
}

impl<T, const N: usize> Index<usize> for ArrayStorage<T, N> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.cells[..self.len][i]
    }
}

impl<T, const N: usize> IndexMut<usize> for ArrayStorage<T, N> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.cells[..self.len][i]
    }
}

impl<T: Accumulator, const N: usize> Storage for ArrayStorage<T, N> {
    type Value = T;

    fn len(&self) -> usize {
        self.len
    }

    fn reset(&mut self, n: usize) -> Result<()> {
        if n > N {
            return Err(HistError::Capacity {
                requested: n,
                capacity: N,
            });
        }
        self.cells.iter_mut().for_each(|c| *c = T::default());
        self.len = n;
        Ok(())
    }

    fn get(&self, index: usize) -> T {
        self[index].clone()
    }

    fn increment(&mut self, index: usize) -> Result<()> {
        self[index].increment()
    }

    fn add_weight(&mut self, index: usize, weight: f64) -> Result<()> {
        self[index].add_weight(weight)
    }

    fn add_sample(&mut self, index: usize, sample: &[f64]) -> Result<()> {
        self[index].add_sample(sample)
    }

    fn add_weighted_sample(&mut self, index: usize, weight: f64, sample: &[f64]) -> Result<()> {
        self[index].add_weighted_sample(weight, sample)
    }

    fn merge(&mut self, other: &ArrayStorage<T, N>) -> Result<()> {
        let len = self.len;
        merge_cells(&mut self.cells[..len], other.as_slice())
    }

    fn scale(&mut self, factor: f64) {
        let len = self.len;
        self.cells[..len].iter_mut().for_each(|c| c.scale(factor));
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::accumulators::{WeightedMean, WeightedSum};

    fn exercise<S: Storage<Value = f64> + Default>() {
        let mut a = S::default();
        a.reset(1).unwrap();
        a.increment(0).unwrap();
        a.increment(0).unwrap();
        assert_eq!(a.get(0), 2.0);

        a.reset(2).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a.get(0), 0.0);
        a.increment(0).unwrap();
        a.add_weight(0, 2.0).unwrap();
        a.add_weight(1, 5.0).unwrap();
        assert_eq!(a.get(0), 3.0);
        assert_eq!(a.get(1), 5.0);

        a.scale(3.0);
        assert_eq!(a.get(0), 9.0);
        assert_eq!(a.get(1), 15.0);

        let mut b = S::default();
        b.reset(2).unwrap();
        b.increment(1).unwrap();
        b.merge(&a).unwrap();
        assert_eq!(b.get(0), 9.0);
        assert_eq!(b.get(1), 16.0);

        let mut c = S::default();
        c.reset(3).unwrap();
        assert!(c.merge(&a).is_err());
        assert!(c.add_sample(0, &[1.0]).is_err());

        a.reset(0).unwrap();
        assert!(a.is_empty());
    }

    #[test]
    fn vec_storage() {
        exercise::<VecStorage<f64>>();
        let mut v = VecStorage::<f64>::new(2);
        v[1] = 9.0;
        assert_eq!(v[1], 9.0);
        assert_eq!(v.iter().sum::<f64>(), 9.0);
    }

    #[test]
    fn array_storage() {
        exercise::<ArrayStorage<f64, 10>>();
        let mut a = ArrayStorage::<f64, 10>::default();
        assert!(a.reset(10).is_ok());
        assert_eq!(
            a.reset(11),
            Err(HistError::Capacity {
                requested: 11,
                capacity: 10
            })
        );
        assert_eq!(a.len(), 10);
        assert_eq!(ArrayStorage::<f64, 10>::CAPACITY, 10);
    }

    #[test]
    fn equality_compares_cells() {
        let mut a = VecStorage::<f64>::new(1);
        a.increment(0).unwrap();
        let b = VecStorage::<f64>::new(2);
        assert_ne!(a, b);
        let c = a.clone();
        assert_eq!(a, c);
    }

    #[test]
    fn weighted_sum_cells() {
        let mut a = VecStorage::<WeightedSum>::new(1);
        a.increment(0).unwrap();
        a.add_weight(0, 1.0).unwrap();
        a.merge(&VecStorage {
            cells: vec![WeightedSum::new(1.0, 0.0)],
        })
        .unwrap();
        assert_eq!(a[0].value(), 3.0);
        assert_eq!(a[0].variance(), 2.0);
        a.add_weight(0, 2.0).unwrap();
        assert_eq!(a[0].value(), 5.0);
        assert_eq!(a[0].variance(), 6.0);
    }

    #[test]
    fn weighted_mean_cells() {
        let mut a = VecStorage::<WeightedMean>::new(1);
        a.add_sample(0, &[1.0]).unwrap();
        a.add_weighted_sample(0, 2.0, &[2.0]).unwrap();
        assert_eq!(a[0].sum(), 3.0);
        assert_relative_eq!(a[0].value(), 5.0 / 3.0, max_relative = 1e-12);
        assert!(a.increment(0).is_err());
        assert_eq!(a[0].sum(), 3.0);
    }
}
