//! Folding per-axis bin ids into one flat storage offset.

use std::slice;

use super::*;

/// A storage offset that may have been invalidated by one of the axes.
///
/// A zero stride means some axis produced a bin with no storage slot; it
/// stays zero for every axis folded in afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionalIndex {
    offset: usize,
    stride: usize,
}

impl Default for OptionalIndex {
    fn default() -> OptionalIndex {
        OptionalIndex { offset: 0, stride: 1 }
    }
}

impl OptionalIndex {
    pub fn is_valid(&self) -> bool {
        self.stride > 0
    }

    pub fn get(&self) -> Option<usize> {
        if self.is_valid() {
            Some(self.offset)
        } else {
            None
        }
    }

    /// Fold the bin id `j` of `axis` into the index.
    pub fn fold(&mut self, axis: &dyn Axis, j: i32) {
        match slot(axis, j) {
            Some(s) => {
                self.offset += s * self.stride;
                // axis sets too large to address leave nothing valid
                self.stride = self.stride.checked_mul(axis.extent()).unwrap_or(0);
            }
            None => self.stride = 0,
        }
    }
}

// Storage slot of bin id `j`: ordinary bins keep their id, overflow sits at
// `size` and underflow right after it. Ids naming a slot the axis does not
// have map to None.
fn slot(axis: &dyn Axis, j: i32) -> Option<usize> {
    let size = axis.size();
    let options = axis.options();
    if j < 0 {
        if j == -1 && options.underflow() {
            Some(size + options.overflow() as usize)
        } else {
            None
        }
    } else if (j as usize) < size {
        Some(j as usize)
    } else if j as usize == size && options.overflow() {
        Some(size)
    } else {
        None
    }
}

/// Map coordinates through every axis to a storage offset.
///
/// A rank-1 axis set given more than one component passes all of them to
/// its single axis. Otherwise the number of components must equal the rank.
/// Every axis is queried even after the index turned invalid, so argument
/// errors surface regardless of which coordinate fell out of range.
pub fn index_of_coords<A>(axes: &A, coords: &[Value<'_>]) -> Result<OptionalIndex>
where
    A: Axes + ?Sized,
{
    let rank = axes.rank();
    let mut idx = OptionalIndex::default();

    if rank == 1 && coords.len() > 1 {
        if let Some(axis) = axes.axis(0) {
            let j = axis.index(coords)?;
            idx.fold(axis, j);
            return Ok(idx);
        }
    }

    if coords.len() != rank {
        return Err(HistError::ArgumentCount {
            got: coords.len(),
            rank,
        });
    }

    for (i, coord) in coords.iter().enumerate() {
        let axis = axes.axis(i).ok_or(HistError::ArgumentCount {
            got: coords.len(),
            rank,
        })?;
        let j = axis.index(slice::from_ref(coord))?;
        idx.fold(axis, j);
    }

    Ok(idx)
}

/// Map integer bin ids straight to a storage offset. Unlike filling, a bin
/// id without a storage slot is an error.
pub fn index_of_bins<A>(axes: &A, bins: &[i32]) -> Result<usize>
where
    A: Axes + ?Sized,
{
    let rank = axes.rank();
    if bins.len() != rank {
        return Err(HistError::ArgumentCount {
            got: bins.len(),
            rank,
        });
    }

    let mut idx = OptionalIndex::default();
    for (i, &j) in bins.iter().enumerate() {
        let axis = axes.axis(i).ok_or(HistError::ArgumentCount {
            got: bins.len(),
            rank,
        })?;
        if slot(axis, j).is_none() {
            return Err(HistError::IndexOutOfRange {
                axis: i,
                index: j,
                size: axis.size(),
            });
        }
        idx.fold(axis, j);
    }

    Ok(idx.offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_axes() -> Vec<Integer> {
        vec![Integer::new(0, 3).unwrap(), Integer::new(0, 4).unwrap()]
    }

    #[test]
    fn first_axis_varies_fastest() {
        let axes = two_axes();
        let at = |a: i64, b: i64| {
            index_of_coords(&axes, &[Value::Int(a), Value::Int(b)])
                .unwrap()
                .get()
        };
        assert_eq!(at(0, 0), Some(0));
        assert_eq!(at(1, 0), Some(1));
        assert_eq!(at(0, 1), Some(5));
        assert_eq!(at(2, 3), Some(2 + 3 * 5));
        // overflow is slot 3, underflow slot 4 on the first axis
        assert_eq!(at(3, 0), Some(3));
        assert_eq!(at(-1, 0), Some(4));
        assert_eq!(at(-1, -1), Some(4 + 5 * 5));
    }

    #[test]
    fn missing_slot_poisons_index() {
        let axes = vec![
            Integer::with_options(0, 3, Options::empty()).unwrap(),
            Integer::new(0, 4).unwrap(),
            Integer::new(0, 2).unwrap(),
        ];
        let idx = index_of_coords(&axes, &[Value::Int(7), Value::Int(1), Value::Int(1)]).unwrap();
        assert!(!idx.is_valid());
        assert_eq!(idx.get(), None);

        let ok = index_of_coords(&axes, &[Value::Int(2), Value::Int(1), Value::Int(1)]).unwrap();
        assert_eq!(ok.get(), Some(2 + 3 + 3 * 6));
    }

    #[test]
    fn underflow_without_overflow() {
        let axes = vec![Integer::with_options(0, 2, Options::UNDERFLOW).unwrap()];
        let at = |i: i64| index_of_coords(&axes, &[Value::Int(i)]).unwrap().get();
        assert_eq!(at(-5), Some(2));
        assert_eq!(at(1), Some(1));
        assert_eq!(at(2), None);
    }

    #[test]
    fn arity_is_checked() {
        let axes = two_axes();
        assert_eq!(
            index_of_coords(&axes, &[Value::Int(1)]),
            Err(HistError::ArgumentCount { got: 1, rank: 2 })
        );
        assert_eq!(
            index_of_coords(&axes, &[Value::Int(1), Value::Int(1), Value::Int(1)]),
            Err(HistError::ArgumentCount { got: 3, rank: 2 })
        );
    }

    #[test]
    fn type_errors_surface_after_invalid_axis() {
        let axes = vec![
            AnyAxis::from(Integer::with_options(0, 3, Options::empty()).unwrap()),
            AnyAxis::from(Regular::new(2, 0.0, 1.0).unwrap()),
        ];
        let err = index_of_coords(&axes, &[Value::Int(9), Value::Str("x")]);
        assert!(matches!(err, Err(HistError::ArgumentType { .. })));
    }

    #[test]
    fn rank_one_forwards_tuples() {
        let axes = vec![Integer::new(0, 3).unwrap()];
        // a single-component axis refuses the tuple it is forwarded
        let err = index_of_coords(&axes, &[Value::Int(1), Value::Int(2)]);
        assert!(matches!(err, Err(HistError::ArgumentType { .. })));
        assert_eq!(
            index_of_coords(&axes, &[]),
            Err(HistError::ArgumentCount { got: 0, rank: 1 })
        );
    }

    #[test]
    fn unaddressable_axes_do_not_wrap() {
        let wide = || Integer::with_options(0, 1 << 16, Options::empty()).unwrap();
        let axes = vec![wide(), wide(), wide(), wide()];
        let one = Value::Int(1);
        let idx = index_of_coords(&axes, &[one, one, one, one]).unwrap();
        assert!(!idx.is_valid());
    }

    #[test]
    fn bins_must_exist() {
        let axes = vec![
            Integer::new(0, 3).unwrap(),
            Integer::with_options(0, 4, Options::empty()).unwrap(),
        ];
        assert_eq!(index_of_bins(&axes, &[0, 0]), Ok(0));
        assert_eq!(index_of_bins(&axes, &[2, 3]), Ok(2 + 3 * 5));
        assert_eq!(index_of_bins(&axes, &[-1, 0]), Ok(4));
        assert_eq!(index_of_bins(&axes, &[3, 0]), Ok(3));
        assert_eq!(
            index_of_bins(&axes, &[0, 4]),
            Err(HistError::IndexOutOfRange {
                axis: 1,
                index: 4,
                size: 4
            })
        );
        assert_eq!(
            index_of_bins(&axes, &[0, -1]),
            Err(HistError::IndexOutOfRange {
                axis: 1,
                index: -1,
                size: 4
            })
        );
        assert_eq!(
            index_of_bins(&axes, &[0]),
            Err(HistError::ArgumentCount { got: 1, rank: 2 })
        );
    }
}
